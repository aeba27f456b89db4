//! # Liquidity Pool Adapter
//!
//! Seeds launch pools on the external AMM and harvests their trading fees.
//! Amounts enter and leave in the caller's (unordered) token terms; the
//! adapter handles pool token ordering.

use crate::constants::{MAX_ALLOWED_DEVIATION, MAX_TICK_INDEX, OBSERVATION_WINDOW_SECS, PRICE_SCALE};
use crate::errors::{CoreResult, MemeCoreError};
use crate::host::{ConcentratedAmm, MintPositionParams, TokenLedger};
use crate::math::safe_math::safe_sub_u64;
use crate::math::sqrt_price::{self, sqrt_price_at_tick};
use anchor_lang::prelude::Pubkey;
use ethnum::U256;

/// Result of seeding a pool, in the caller's token order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeededPosition {
    pub pool: Pubkey,
    pub position_id: u64,
    pub liquidity: u128,
    /// Whether `token_a` is token 0 of the pool
    pub a_is_token0: bool,
    pub used_a: u64,
    pub used_b: u64,
    pub leftover_a: u64,
    pub leftover_b: u64,
}

/// Harvested trading fees of one position
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HarvestedFees {
    pub pool_asset_amount: u64,
    pub meme_burned: u64,
}

/// Full-range tick bounds aligned to `tick_spacing`
pub fn full_range_ticks(tick_spacing: u16) -> CoreResult<(i32, i32)> {
    if tick_spacing == 0 {
        return Err(MemeCoreError::InvalidParameter("tick spacing must be positive"));
    }
    let spacing = tick_spacing as i32;
    let upper = MAX_TICK_INDEX / spacing * spacing;
    Ok((-upper, upper))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiquidityPoolAdapter {
    fee_bps: u16,
}

impl LiquidityPoolAdapter {
    pub fn new(fee_bps: u16) -> Self {
        Self { fee_bps }
    }

    pub fn fee_bps(&self) -> u16 {
        self.fee_bps
    }

    /// Q64.64 sqrt price pricing `amount_a` of token 0 against `amount_b` of token 1
    pub fn compute_initial_price(amount_a: u64, amount_b: u64) -> CoreResult<u128> {
        sqrt_price::compute_initial_price(amount_a, amount_b)
    }

    /// Create (or reuse) the pool of a pair and mint a full-range position
    /// owned by `owner`
    pub fn create_pool_and_mint<H: TokenLedger + ConcentratedAmm>(
        &self,
        host: &mut H,
        owner: &Pubkey,
        token_a: &Pubkey,
        token_b: &Pubkey,
        amount_a: u64,
        amount_b: u64,
    ) -> CoreResult<SeededPosition> {
        if token_a == token_b {
            return Err(MemeCoreError::InvalidParameter("pool tokens must differ"));
        }
        let a_is_token0 = token_a < token_b;
        let (token0, token1, amount0, amount1) = if a_is_token0 {
            (token_a, token_b, amount_a, amount_b)
        } else {
            (token_b, token_a, amount_b, amount_a)
        };

        let sqrt_price = Self::compute_initial_price(amount0, amount1)?;
        let pool =
            host.create_and_initialize_pool_if_necessary(token0, token1, self.fee_bps, sqrt_price)?;
        let (tick_lower, tick_upper) = full_range_ticks(host.tick_spacing(self.fee_bps)?)?;

        let amm = host.address();
        host.approve(token0, owner, &amm, amount0)?;
        host.approve(token1, owner, &amm, amount1)?;
        let minted = host.mint_position(MintPositionParams {
            pool,
            owner: *owner,
            tick_lower,
            tick_upper,
            amount0_desired: amount0,
            amount1_desired: amount1,
            amount0_min: 0,
            amount1_min: 0,
        })?;
        host.approve(token0, owner, &amm, 0)?;
        host.approve(token1, owner, &amm, 0)?;

        let leftover0 = safe_sub_u64(amount0, minted.amount0)?;
        let leftover1 = safe_sub_u64(amount1, minted.amount1)?;
        log::debug!(
            "seeded pool {} position {} liquidity={} leftovers=({}, {})",
            pool,
            minted.position_id,
            minted.liquidity,
            leftover0,
            leftover1
        );

        let (used_a, used_b, leftover_a, leftover_b) = if a_is_token0 {
            (minted.amount0, minted.amount1, leftover0, leftover1)
        } else {
            (minted.amount1, minted.amount0, leftover1, leftover0)
        };
        Ok(SeededPosition {
            pool,
            position_id: minted.position_id,
            liquidity: minted.liquidity,
            a_is_token0,
            used_a,
            used_b,
            leftover_a,
            leftover_b,
        })
    }

    /// Reject when the spot price strays from the observation-window average
    pub fn check_pool_price<H: ConcentratedAmm>(&self, host: &H, pool: &Pubkey) -> CoreResult<()> {
        let cumulatives = host.observe(pool, &[OBSERVATION_WINDOW_SECS, 0])?;
        let [then, now] = cumulatives[..] else {
            return Err(MemeCoreError::InsufficientObservationHistory);
        };
        let average_tick = (now - then).div_euclid(OBSERVATION_WINDOW_SECS as i64);
        let average_tick = i32::try_from(average_tick).map_err(|_| MemeCoreError::TickOutOfRange)?;

        let twap_sqrt = U256::from(sqrt_price_at_tick(average_tick)?);
        let spot_sqrt = U256::from(host.slot0(pool)?.sqrt_price);
        let twap_price = twap_sqrt * twap_sqrt;
        let spot_price = spot_sqrt * spot_sqrt;

        let difference = if spot_price > twap_price {
            spot_price - twap_price
        } else {
            twap_price - spot_price
        };
        let deviation = difference * U256::from(PRICE_SCALE) / twap_price;
        if deviation > U256::from(MAX_ALLOWED_DEVIATION) {
            log::warn!(
                "pool {} spot deviates {} from its {}s average",
                pool,
                deviation,
                OBSERVATION_WINDOW_SECS
            );
            return Err(MemeCoreError::PriceDeviationTooHigh);
        }
        Ok(())
    }

    /// Collect a position's fees, burn the meme-token side and return the
    /// pool-asset side
    pub fn harvest_fees<H: TokenLedger + ConcentratedAmm>(
        &self,
        host: &mut H,
        owner: &Pubkey,
        pool: &Pubkey,
        position_id: u64,
        meme_token: &Pubkey,
        pool_asset: &Pubkey,
    ) -> CoreResult<HarvestedFees> {
        self.check_pool_price(host, pool)?;

        let slot = host.slot0(pool)?;
        let (fees0, fees1) = host.collect(pool, position_id, owner)?;
        let (meme_fees, pool_asset_fees) = if slot.token0 == *meme_token {
            (fees0, fees1)
        } else if slot.token1 == *meme_token {
            (fees1, fees0)
        } else {
            return Err(MemeCoreError::InvalidParameter("pool does not hold the launch token"));
        };
        if slot.token0 != *pool_asset && slot.token1 != *pool_asset {
            return Err(MemeCoreError::InvalidParameter("pool does not hold the pool asset"));
        }

        if meme_fees > 0 {
            host.burn(meme_token, owner, meme_fees)?;
        }
        Ok(HarvestedFees {
            pool_asset_amount: pool_asset_fees,
            meme_burned: meme_fees,
        })
    }
}
