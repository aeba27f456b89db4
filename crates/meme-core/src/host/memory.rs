//! In-memory reference host
//!
//! A deterministic ledger, full-range concentrated-liquidity AMM, recording
//! bridge and settable clock. Cloning the host checkpoints all of it.

use super::{
    Clock, ConcentratedAmm, CrossDomainBridge, MintPositionParams, MintedPosition, PoolSlot,
    SwapParams, TokenLedger,
};
use crate::constants::{
    BPS_DENOMINATOR, MAX_SQRT_PRICE_X64, MEME_TOKEN_DECIMALS, MIN_SQRT_PRICE_X64,
};
use crate::errors::{CoreResult, MemeCoreError};
use crate::math::liquidity_math::{
    amount0_delta, amount1_delta, amounts_for_liquidity, liquidity_for_amounts,
};
use crate::math::safe_math::{safe_add_u64, safe_cast_u128_to_u64, safe_mul_div_u128, safe_sub_u64};
use crate::math::sqrt_price::{sqrt_price_at_tick, tick_at_sqrt_price};
use crate::pool_adapter::full_range_ticks;
use anchor_lang::prelude::Pubkey;
use orca_whirlpools_core::{try_get_next_sqrt_price_from_a, try_get_next_sqrt_price_from_b, U128};
use std::collections::{BTreeMap, BTreeSet};

/// Clock value of a freshly created host
pub const DEFAULT_START_TIME: i64 = 1_700_000_000;

/// Supported fee tiers and their tick spacing
const FEE_TIERS: [(u16, u16); 5] = [(1, 1), (5, 8), (30, 64), (100, 128), (200, 256)];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub supply: u64,
}

/// Tick accumulator checkpoint, valid from `timestamp` until the next one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Observation {
    pub timestamp: i64,
    pub tick_cumulative: i64,
    pub tick: i32,
}

/// Bridge transfer recorded by the host
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteTransfer {
    pub sender: Pubkey,
    pub token: Pubkey,
    pub amount: u64,
    pub recipient: Pubkey,
    pub gas_limit: u32,
    pub payload: Vec<u8>,
    pub fee: u64,
}

#[derive(Clone, Debug)]
struct PoolState {
    token0: Pubkey,
    token1: Pubkey,
    fee_bps: u16,
    tick_spacing: u16,
    sqrt_price: u128,
    tick: i32,
    liquidity: u128,
    observations: Vec<Observation>,
}

impl PoolState {
    fn full_range(&self) -> CoreResult<(i32, i32)> {
        full_range_ticks(self.tick_spacing)
    }

    /// Close the current observation at `now` and open one at `tick`
    fn write_observation(&mut self, now: i64, tick: i32) {
        let Some(last) = self.observations.last_mut() else {
            self.observations.push(Observation { timestamp: now, tick_cumulative: 0, tick });
            return;
        };
        if last.timestamp == now {
            last.tick = tick;
            return;
        }
        let elapsed = now - last.timestamp;
        let tick_cumulative = last.tick_cumulative + last.tick as i64 * elapsed;
        self.observations.push(Observation { timestamp: now, tick_cumulative, tick });
    }

    fn tick_cumulative_at(&self, target: i64) -> CoreResult<i64> {
        let first = self
            .observations
            .first()
            .ok_or(MemeCoreError::InsufficientObservationHistory)?;
        if target < first.timestamp {
            return Err(MemeCoreError::InsufficientObservationHistory);
        }
        let index = self.observations.partition_point(|o| o.timestamp <= target) - 1;
        let o = self.observations[index];
        Ok(o.tick_cumulative + o.tick as i64 * (target - o.timestamp))
    }
}

#[derive(Clone, Debug)]
struct Position {
    pool: Pubkey,
    owner: Pubkey,
    liquidity: u128,
    owed0: u64,
    owed1: u64,
}

/// Deterministic bit mixer used to scatter generated addresses
fn scramble(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// In-memory implementation of every host interface
#[derive(Clone, Debug)]
pub struct MemoryHost {
    now: i64,
    next_key: u64,
    native_mint: Pubkey,
    wrapped_native_mint: Pubkey,
    amm: Pubkey,
    bridge: Pubkey,
    tokens: BTreeMap<Pubkey, TokenInfo>,
    balances: BTreeMap<(Pubkey, Pubkey), u64>,
    allowances: BTreeMap<(Pubkey, Pubkey, Pubkey), u64>,
    pools: BTreeMap<Pubkey, PoolState>,
    pool_index: BTreeMap<(Pubkey, Pubkey, u16), Pubkey>,
    positions: BTreeMap<u64, Position>,
    next_position_id: u64,
    bridge_fee: u64,
    bridge_paused: bool,
    remote_transfers: Vec<RemoteTransfer>,
    refusing_recipients: BTreeSet<Pubkey>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        let mut host = Self {
            now: DEFAULT_START_TIME,
            next_key: 1,
            native_mint: Pubkey::default(),
            wrapped_native_mint: Pubkey::default(),
            amm: Pubkey::default(),
            bridge: Pubkey::default(),
            tokens: BTreeMap::new(),
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            pools: BTreeMap::new(),
            pool_index: BTreeMap::new(),
            positions: BTreeMap::new(),
            next_position_id: 1,
            bridge_fee: 0,
            bridge_paused: false,
            remote_transfers: Vec::new(),
            refusing_recipients: BTreeSet::new(),
        };
        host.amm = host.new_address("amm");
        host.bridge = host.new_address("bridge");
        host.native_mint = host.register_token("Native", "NATIVE", MEME_TOKEN_DECIMALS);
        host.wrapped_native_mint =
            host.register_token("Wrapped Native", "WNATIVE", MEME_TOKEN_DECIMALS);
        host
    }

    /// Fresh deterministic address. The tag is embedded for readability in logs.
    pub fn new_address(&mut self, tag: &str) -> Pubkey {
        let n = self.next_key;
        self.next_key += 1;

        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&scramble(n).to_be_bytes());
        bytes[8..16].copy_from_slice(&n.to_be_bytes());
        let tag = tag.as_bytes();
        let len = tag.len().min(16);
        bytes[16..16 + len].copy_from_slice(&tag[..len]);
        Pubkey::new_from_array(bytes)
    }

    fn register_token(&mut self, name: &str, symbol: &str, decimals: u8) -> Pubkey {
        let address = self.new_address("token");
        self.tokens.insert(
            address,
            TokenInfo {
                name: name.to_string(),
                symbol: symbol.to_string(),
                decimals,
                supply: 0,
            },
        );
        address
    }

    pub fn native_mint(&self) -> Pubkey {
        self.native_mint
    }

    pub fn wrapped_native_mint(&self) -> Pubkey {
        self.wrapped_native_mint
    }

    pub fn bridge_address(&self) -> Pubkey {
        self.bridge
    }

    pub fn token_info(&self, token: &Pubkey) -> Option<&TokenInfo> {
        self.tokens.get(token)
    }

    pub fn total_supply(&self, token: &Pubkey) -> u64 {
        self.tokens.get(token).map(|t| t.supply).unwrap_or(0)
    }

    /// Faucet for test and simulation accounts
    pub fn mint_to(&mut self, token: &Pubkey, owner: &Pubkey, amount: u64) -> CoreResult<()> {
        let info = self.tokens.get(token).ok_or(MemeCoreError::TokenNotFound)?;
        let supply = safe_add_u64(info.supply, amount)?;
        let balance = safe_add_u64(self.balance_of(token, owner), amount)?;
        if let Some(info) = self.tokens.get_mut(token) {
            info.supply = supply;
        }
        self.balances.insert((*token, *owner), balance);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Clock controls
    // ------------------------------------------------------------------------

    pub fn set_time(&mut self, now: i64) {
        self.now = now;
    }

    pub fn advance(&mut self, seconds: i64) {
        self.now += seconds;
    }

    // ------------------------------------------------------------------------
    // Failure switches
    // ------------------------------------------------------------------------

    pub fn set_bridge_fee(&mut self, fee: u64) {
        self.bridge_fee = fee;
    }

    pub fn set_bridge_paused(&mut self, paused: bool) {
        self.bridge_paused = paused;
    }

    /// Make every transfer to `recipient` fail
    pub fn refuse_transfers_to(&mut self, recipient: Pubkey) {
        self.refusing_recipients.insert(recipient);
    }

    pub fn remote_transfers(&self) -> &[RemoteTransfer] {
        &self.remote_transfers
    }

    // ------------------------------------------------------------------------
    // AMM inspection
    // ------------------------------------------------------------------------

    pub fn observations(&self, pool: &Pubkey) -> Option<&[Observation]> {
        self.pools.get(pool).map(|p| p.observations.as_slice())
    }

    pub fn pool_liquidity(&self, pool: &Pubkey) -> Option<u128> {
        self.pools.get(pool).map(|p| p.liquidity)
    }

    pub fn position_liquidity(&self, position_id: u64) -> Option<u128> {
        self.positions.get(&position_id).map(|p| p.liquidity)
    }

    /// Fees owed to a position as (token0, token1)
    pub fn owed_fees(&self, position_id: u64) -> Option<(u64, u64)> {
        self.positions.get(&position_id).map(|p| (p.owed0, p.owed1))
    }

    // ------------------------------------------------------------------------
    // Ledger internals
    // ------------------------------------------------------------------------

    fn ensure_token(&self, token: &Pubkey) -> CoreResult<()> {
        if !self.tokens.contains_key(token) {
            return Err(MemeCoreError::TokenNotFound);
        }
        Ok(())
    }

    fn move_balance(
        &mut self,
        token: &Pubkey,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> CoreResult<()> {
        self.ensure_token(token)?;
        if self.refusing_recipients.contains(to) {
            return Err(MemeCoreError::TransferRejected);
        }
        if amount == 0 || from == to {
            return Ok(());
        }
        let from_balance = self
            .balance_of(token, from)
            .checked_sub(amount)
            .ok_or(MemeCoreError::InsufficientBalance)?;
        let to_balance = safe_add_u64(self.balance_of(token, to), amount)?;
        self.balances.insert((*token, *from), from_balance);
        self.balances.insert((*token, *to), to_balance);
        Ok(())
    }

    fn check_pull(
        &self,
        token: &Pubkey,
        spender: &Pubkey,
        from: &Pubkey,
        amount: u64,
    ) -> CoreResult<()> {
        self.ensure_token(token)?;
        if self.allowance(token, from, spender) < amount {
            return Err(MemeCoreError::InsufficientAllowance);
        }
        if self.balance_of(token, from) < amount {
            return Err(MemeCoreError::InsufficientBalance);
        }
        Ok(())
    }

    fn pool_for_pair(
        &self,
        token_in: &Pubkey,
        token_out: &Pubkey,
        fee_bps: u16,
    ) -> CoreResult<Pubkey> {
        self.get_pool(token_in, token_out, fee_bps)
            .ok_or(MemeCoreError::PoolNotFound)
    }
}

// ============================================================================
// Token Ledger
// ============================================================================

impl TokenLedger for MemoryHost {
    fn balance_of(&self, token: &Pubkey, owner: &Pubkey) -> u64 {
        self.balances.get(&(*token, *owner)).copied().unwrap_or(0)
    }

    fn allowance(&self, token: &Pubkey, owner: &Pubkey, spender: &Pubkey) -> u64 {
        self.allowances
            .get(&(*token, *owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn approve(
        &mut self,
        token: &Pubkey,
        owner: &Pubkey,
        spender: &Pubkey,
        amount: u64,
    ) -> CoreResult<()> {
        self.ensure_token(token)?;
        self.allowances.insert((*token, *owner, *spender), amount);
        Ok(())
    }

    fn transfer(
        &mut self,
        token: &Pubkey,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> CoreResult<()> {
        self.move_balance(token, from, to, amount)
    }

    fn transfer_from(
        &mut self,
        token: &Pubkey,
        spender: &Pubkey,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> CoreResult<()> {
        let allowance = self.allowance(token, from, spender);
        if allowance < amount {
            return Err(MemeCoreError::InsufficientAllowance);
        }
        self.move_balance(token, from, to, amount)?;
        if allowance != u64::MAX {
            self.allowances
                .insert((*token, *from, *spender), allowance - amount);
        }
        Ok(())
    }

    fn burn(&mut self, token: &Pubkey, owner: &Pubkey, amount: u64) -> CoreResult<()> {
        self.ensure_token(token)?;
        let balance = self
            .balance_of(token, owner)
            .checked_sub(amount)
            .ok_or(MemeCoreError::InsufficientBalance)?;
        self.balances.insert((*token, *owner), balance);
        if let Some(info) = self.tokens.get_mut(token) {
            info.supply = info.supply.saturating_sub(amount);
        }
        Ok(())
    }

    fn create_token(
        &mut self,
        name: &str,
        symbol: &str,
        decimals: u8,
        supply: u64,
        owner: &Pubkey,
    ) -> CoreResult<Pubkey> {
        let token = self.register_token(name, symbol, decimals);
        self.mint_to(&token, owner, supply)?;
        log::debug!("created token {} ({}) supply={}", token, symbol, supply);
        Ok(token)
    }

    fn wrap_native(&mut self, owner: &Pubkey, amount: u64) -> CoreResult<u64> {
        let native = self.native_mint;
        let wrapped = self.wrapped_native_mint;
        self.burn(&native, owner, amount)?;
        self.mint_to(&wrapped, owner, amount)?;
        Ok(amount)
    }
}

// ============================================================================
// Concentrated Liquidity AMM
// ============================================================================

impl ConcentratedAmm for MemoryHost {
    fn address(&self) -> Pubkey {
        self.amm
    }

    fn get_pool(&self, token_a: &Pubkey, token_b: &Pubkey, fee_bps: u16) -> Option<Pubkey> {
        let (token0, token1) = if token_a < token_b {
            (*token_a, *token_b)
        } else {
            (*token_b, *token_a)
        };
        self.pool_index.get(&(token0, token1, fee_bps)).copied()
    }

    fn create_and_initialize_pool_if_necessary(
        &mut self,
        token0: &Pubkey,
        token1: &Pubkey,
        fee_bps: u16,
        sqrt_price: u128,
    ) -> CoreResult<Pubkey> {
        if token0 >= token1 {
            return Err(MemeCoreError::InvalidParameter("pool tokens must be ordered"));
        }
        if let Some(pool) = self.get_pool(token0, token1, fee_bps) {
            return Ok(pool);
        }
        self.ensure_token(token0)?;
        self.ensure_token(token1)?;
        if !(MIN_SQRT_PRICE_X64..=MAX_SQRT_PRICE_X64).contains(&sqrt_price) {
            return Err(MemeCoreError::InvalidPrice);
        }
        let tick_spacing = self.tick_spacing(fee_bps)?;
        let tick = tick_at_sqrt_price(sqrt_price)?;

        let address = self.new_address("pool");
        self.pools.insert(
            address,
            PoolState {
                token0: *token0,
                token1: *token1,
                fee_bps,
                tick_spacing,
                sqrt_price,
                tick,
                liquidity: 0,
                observations: vec![Observation {
                    timestamp: self.now,
                    tick_cumulative: 0,
                    tick,
                }],
            },
        );
        self.pool_index.insert((*token0, *token1, fee_bps), address);
        log::debug!("initialized pool {} at sqrt_price={} tick={}", address, sqrt_price, tick);
        Ok(address)
    }

    fn tick_spacing(&self, fee_bps: u16) -> CoreResult<u16> {
        FEE_TIERS
            .iter()
            .find(|(fee, _)| *fee == fee_bps)
            .map(|(_, spacing)| *spacing)
            .ok_or(MemeCoreError::InvalidParameter("unsupported fee tier"))
    }

    fn mint_position(&mut self, params: MintPositionParams) -> CoreResult<MintedPosition> {
        let pool = self.pools.get(&params.pool).ok_or(MemeCoreError::PoolNotFound)?;
        let (full_lower, full_upper) = pool.full_range()?;
        if params.tick_lower != full_lower || params.tick_upper != full_upper {
            return Err(MemeCoreError::InvalidParameter("only full-range positions are supported"));
        }
        let (token0, token1, sqrt_price) = (pool.token0, pool.token1, pool.sqrt_price);
        let sqrt_lower = sqrt_price_at_tick(full_lower)?;
        let sqrt_upper = sqrt_price_at_tick(full_upper)?;

        let liquidity = liquidity_for_amounts(
            sqrt_price,
            sqrt_lower,
            sqrt_upper,
            params.amount0_desired,
            params.amount1_desired,
        )?;
        if liquidity == 0 {
            return Err(MemeCoreError::InsufficientLiquidity);
        }
        let (amount0, amount1) =
            amounts_for_liquidity(sqrt_price, sqrt_lower, sqrt_upper, liquidity, true)?;
        if amount0 < params.amount0_min {
            return Err(MemeCoreError::SlippageExceeded {
                amount_out: amount0,
                minimum_out: params.amount0_min,
            });
        }
        if amount1 < params.amount1_min {
            return Err(MemeCoreError::SlippageExceeded {
                amount_out: amount1,
                minimum_out: params.amount1_min,
            });
        }

        let amm = self.amm;
        self.check_pull(&token0, &amm, &params.owner, amount0)?;
        self.check_pull(&token1, &amm, &params.owner, amount1)?;
        self.transfer_from(&token0, &amm, &params.owner, &params.pool, amount0)?;
        self.transfer_from(&token1, &amm, &params.owner, &params.pool, amount1)?;

        if let Some(pool) = self.pools.get_mut(&params.pool) {
            pool.liquidity = pool
                .liquidity
                .checked_add(liquidity)
                .ok_or(MemeCoreError::MathOverflow)?;
        }
        let position_id = self.next_position_id;
        self.next_position_id += 1;
        self.positions.insert(
            position_id,
            Position {
                pool: params.pool,
                owner: params.owner,
                liquidity,
                owed0: 0,
                owed1: 0,
            },
        );

        Ok(MintedPosition { position_id, liquidity, amount0, amount1 })
    }

    fn collect(
        &mut self,
        pool: &Pubkey,
        position_id: u64,
        owner: &Pubkey,
    ) -> CoreResult<(u64, u64)> {
        let position = self
            .positions
            .get(&position_id)
            .filter(|p| p.pool == *pool)
            .ok_or(MemeCoreError::PositionNotFound)?;
        if position.owner != *owner {
            return Err(MemeCoreError::InvalidParameter("caller does not own the position"));
        }
        let (owed0, owed1) = (position.owed0, position.owed1);
        let state = self.pools.get(pool).ok_or(MemeCoreError::PoolNotFound)?;
        let (token0, token1) = (state.token0, state.token1);

        self.move_balance(&token0, pool, owner, owed0)?;
        self.move_balance(&token1, pool, owner, owed1)?;
        if let Some(position) = self.positions.get_mut(&position_id) {
            position.owed0 = 0;
            position.owed1 = 0;
        }
        Ok((owed0, owed1))
    }

    fn slot0(&self, pool: &Pubkey) -> CoreResult<PoolSlot> {
        let state = self.pools.get(pool).ok_or(MemeCoreError::PoolNotFound)?;
        Ok(PoolSlot {
            token0: state.token0,
            token1: state.token1,
            sqrt_price: state.sqrt_price,
            tick: state.tick,
        })
    }

    fn observe(&self, pool: &Pubkey, seconds_agos: &[u32]) -> CoreResult<Vec<i64>> {
        let state = self.pools.get(pool).ok_or(MemeCoreError::PoolNotFound)?;
        seconds_agos
            .iter()
            .map(|ago| state.tick_cumulative_at(self.now - *ago as i64))
            .collect()
    }

    fn swap_exact_input(&mut self, params: SwapParams) -> CoreResult<u64> {
        if params.amount_in == 0 {
            return Err(MemeCoreError::ZeroAmount);
        }
        let address = self.pool_for_pair(&params.token_in, &params.token_out, params.fee_bps)?;
        let pool = self.pools.get(&address).ok_or(MemeCoreError::PoolNotFound)?;
        if pool.liquidity == 0 {
            return Err(MemeCoreError::InsufficientLiquidity);
        }
        let zero_for_one = params.token_in == pool.token0;
        let (full_lower, full_upper) = pool.full_range()?;
        let (sqrt_price, liquidity) = (pool.sqrt_price, pool.liquidity);

        let fee = safe_cast_u128_to_u64(
            (params.amount_in as u128 * pool.fee_bps as u128).div_ceil(BPS_DENOMINATOR as u128),
        )?;
        let net_in = safe_sub_u64(params.amount_in, fee)?;

        let next_sqrt_price: u128 = if zero_for_one {
            try_get_next_sqrt_price_from_a(
                U128::from(sqrt_price),
                U128::from(liquidity),
                net_in,
                true,
            )
        } else {
            try_get_next_sqrt_price_from_b(
                U128::from(sqrt_price),
                U128::from(liquidity),
                net_in,
                true,
            )
        }
        .map_err(|_| MemeCoreError::InsufficientLiquidity)?
        .into();

        if next_sqrt_price < sqrt_price_at_tick(full_lower)?
            || next_sqrt_price > sqrt_price_at_tick(full_upper)?
        {
            return Err(MemeCoreError::InsufficientLiquidity);
        }

        let amount_out = if zero_for_one {
            amount1_delta(liquidity, next_sqrt_price, sqrt_price, false)?
        } else {
            amount0_delta(liquidity, sqrt_price, next_sqrt_price, false)?
        };
        if amount_out < params.amount_out_minimum {
            return Err(MemeCoreError::SlippageExceeded {
                amount_out,
                minimum_out: params.amount_out_minimum,
            });
        }
        if self.balance_of(&params.token_out, &address) < amount_out {
            return Err(MemeCoreError::InsufficientLiquidity);
        }

        let amm = self.amm;
        self.check_pull(&params.token_in, &amm, &params.payer, params.amount_in)?;
        if self.refusing_recipients.contains(&params.recipient) {
            return Err(MemeCoreError::TransferRejected);
        }
        self.transfer_from(&params.token_in, &amm, &params.payer, &address, params.amount_in)?;
        self.move_balance(&params.token_out, &address, &params.recipient, amount_out)?;

        // Fees accrue to positions pro rata by liquidity, dust stays in the pool
        for position in self.positions.values_mut().filter(|p| p.pool == address) {
            let share = safe_mul_div_u128(fee as u128, position.liquidity, liquidity)?;
            let share = safe_cast_u128_to_u64(share)?;
            if zero_for_one {
                position.owed0 = safe_add_u64(position.owed0, share)?;
            } else {
                position.owed1 = safe_add_u64(position.owed1, share)?;
            }
        }

        let tick = tick_at_sqrt_price(next_sqrt_price)?;
        let now = self.now;
        if let Some(pool) = self.pools.get_mut(&address) {
            pool.write_observation(now, tick);
            pool.sqrt_price = next_sqrt_price;
            pool.tick = tick;
        }

        log::debug!(
            "swap {} -> {}: in={} out={} fee={}",
            params.token_in,
            params.token_out,
            params.amount_in,
            amount_out,
            fee
        );
        Ok(amount_out)
    }
}

// ============================================================================
// Bridge and Clock
// ============================================================================

impl CrossDomainBridge for MemoryHost {
    fn quote_fee(&self, _gas_limit: u32, _payload: &[u8]) -> u64 {
        self.bridge_fee
    }

    fn transfer_to_remote(
        &mut self,
        sender: &Pubkey,
        token: &Pubkey,
        amount: u64,
        remote_recipient: &Pubkey,
        gas_limit: u32,
        payload: &[u8],
        fee: u64,
    ) -> CoreResult<()> {
        if self.bridge_paused {
            return Err(MemeCoreError::BridgeRejected("bridge is paused"));
        }
        if amount == 0 {
            return Err(MemeCoreError::ZeroAmount);
        }
        let required = self.quote_fee(gas_limit, payload);
        if fee < required {
            return Err(MemeCoreError::InsufficientBridgeFee { attached: fee, required });
        }
        let native = self.native_mint;
        if self.balance_of(token, sender) < amount || self.balance_of(&native, sender) < fee {
            return Err(MemeCoreError::InsufficientBalance);
        }

        let bridge = self.bridge;
        self.move_balance(token, sender, &bridge, amount)?;
        self.move_balance(&native, sender, &bridge, fee)?;
        self.remote_transfers.push(RemoteTransfer {
            sender: *sender,
            token: *token,
            amount,
            recipient: *remote_recipient,
            gas_limit,
            payload: payload.to_vec(),
            fee,
        });
        Ok(())
    }
}

impl Clock for MemoryHost {
    fn unix_timestamp(&self) -> i64 {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Q64;

    fn funded_pool(
        host: &mut MemoryHost,
        lp: &Pubkey,
        amount: u64,
    ) -> (Pubkey, Pubkey, Pubkey, u64) {
        let a = host.create_token("Alpha", "A", 9, amount, lp).unwrap();
        let b = host.create_token("Beta", "B", 9, amount, lp).unwrap();
        let (token0, token1) = if a < b { (a, b) } else { (b, a) };
        let pool = host
            .create_and_initialize_pool_if_necessary(&token0, &token1, 30, Q64)
            .unwrap();
        let amm = host.address();
        host.approve(&token0, lp, &amm, amount).unwrap();
        host.approve(&token1, lp, &amm, amount).unwrap();
        let (lower, upper) = full_range_ticks(64).unwrap();
        let minted = host
            .mint_position(MintPositionParams {
                pool,
                owner: *lp,
                tick_lower: lower,
                tick_upper: upper,
                amount0_desired: amount,
                amount1_desired: amount,
                amount0_min: 0,
                amount1_min: 0,
            })
            .unwrap();
        (pool, token0, token1, minted.position_id)
    }

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let mut host = MemoryHost::new();
        let owner = host.new_address("owner");
        let spender = host.new_address("spender");
        let native = host.native_mint();
        host.mint_to(&native, &owner, 100).unwrap();

        assert_eq!(
            host.transfer_from(&native, &spender, &owner, &spender, 10),
            Err(MemeCoreError::InsufficientAllowance)
        );
        host.approve(&native, &owner, &spender, 30).unwrap();
        host.transfer_from(&native, &spender, &owner, &spender, 10).unwrap();
        assert_eq!(host.allowance(&native, &owner, &spender), 20);
        assert_eq!(host.balance_of(&native, &spender), 10);
        assert_eq!(host.balance_of(&native, &owner), 90);
    }

    #[test]
    fn test_wrap_native_moves_supply() {
        let mut host = MemoryHost::new();
        let owner = host.new_address("owner");
        let (native, wrapped) = (host.native_mint(), host.wrapped_native_mint());
        host.mint_to(&native, &owner, 50).unwrap();
        assert_eq!(host.wrap_native(&owner, 20).unwrap(), 20);
        assert_eq!(host.balance_of(&native, &owner), 30);
        assert_eq!(host.balance_of(&wrapped, &owner), 20);
        assert_eq!(host.total_supply(&native), 30);
        assert!(host.wrap_native(&owner, 31).is_err());
    }

    #[test]
    fn test_swap_moves_price_and_accrues_fees() {
        let mut host = MemoryHost::new();
        let lp = host.new_address("lp");
        let trader = host.new_address("trader");
        let (pool, token0, token1, position_id) = funded_pool(&mut host, &lp, 1_000_000_000);

        host.mint_to(&token0, &trader, 1_000_000).unwrap();
        let amm = host.address();
        host.approve(&token0, &trader, &amm, 1_000_000).unwrap();
        let out = host
            .swap_exact_input(SwapParams {
                token_in: token0,
                token_out: token1,
                fee_bps: 30,
                payer: trader,
                recipient: trader,
                amount_in: 1_000_000,
                amount_out_minimum: 990_000,
            })
            .unwrap();
        assert!(out < 1_000_000 && out >= 990_000);
        assert_eq!(host.balance_of(&token1, &trader), out);
        assert!(host.slot0(&pool).unwrap().sqrt_price < Q64);

        // Sole position earns the whole 0.3% fee
        assert_eq!(host.owed_fees(position_id), Some((3_000, 0)));
        assert_eq!(host.collect(&pool, position_id, &lp).unwrap(), (3_000, 0));
        assert_eq!(host.owed_fees(position_id), Some((0, 0)));
    }

    #[test]
    fn test_swap_minimum_is_enforced() {
        let mut host = MemoryHost::new();
        let lp = host.new_address("lp");
        let (_, token0, token1, _) = funded_pool(&mut host, &lp, 1_000_000);
        let amm = host.address();
        host.approve(&token0, &lp, &amm, 1_000).unwrap();
        let result = host.swap_exact_input(SwapParams {
            token_in: token0,
            token_out: token1,
            fee_bps: 30,
            payer: lp,
            recipient: lp,
            amount_in: 1_000,
            amount_out_minimum: 1_000,
        });
        assert!(matches!(result, Err(MemeCoreError::SlippageExceeded { .. })));
    }

    #[test]
    fn test_observe_requires_history() {
        let mut host = MemoryHost::new();
        let lp = host.new_address("lp");
        let (pool, ..) = funded_pool(&mut host, &lp, 1_000_000);

        assert_eq!(
            host.observe(&pool, &[1800, 0]),
            Err(MemeCoreError::InsufficientObservationHistory)
        );
        host.advance(1800);
        // Price at tick 0 accumulates nothing
        assert_eq!(host.observe(&pool, &[1800, 0]).unwrap(), vec![0, 0]);
    }

    #[test]
    fn test_bridge_switches() {
        let mut host = MemoryHost::new();
        let sender = host.new_address("sender");
        let token = host.create_token("Target", "TGT", 9, 500, &sender).unwrap();
        let native = host.native_mint();
        host.mint_to(&native, &sender, 10).unwrap();
        host.set_bridge_fee(4);
        let remote = Pubkey::new_unique();

        assert!(matches!(
            host.transfer_to_remote(&sender, &token, 100, &remote, 1, &[], 3),
            Err(MemeCoreError::InsufficientBridgeFee { attached: 3, required: 4 })
        ));
        host.set_bridge_paused(true);
        assert!(host.transfer_to_remote(&sender, &token, 100, &remote, 1, &[], 4).is_err());
        host.set_bridge_paused(false);
        host.transfer_to_remote(&sender, &token, 100, &remote, 1, b"hi", 4).unwrap();

        assert_eq!(host.remote_transfers().len(), 1);
        assert_eq!(host.remote_transfers()[0].payload, b"hi".to_vec());
        assert_eq!(host.balance_of(&token, &sender), 400);
        assert_eq!(host.balance_of(&native, &sender), 6);
    }

    #[test]
    fn test_refused_recipient() {
        let mut host = MemoryHost::new();
        let (a, b) = (host.new_address("a"), host.new_address("b"));
        let native = host.native_mint();
        host.mint_to(&native, &a, 5).unwrap();
        host.refuse_transfers_to(b);
        assert_eq!(host.transfer(&native, &a, &b, 1), Err(MemeCoreError::TransferRejected));
        assert_eq!(host.balance_of(&native, &a), 5);
    }
}
