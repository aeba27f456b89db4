//! # Price Oracle
//!
//! Tracks a time-weighted average of the target asset priced in the pool
//! asset. `refresh` folds the current spot price into the average only when
//! enough time has passed and the spot is within tolerance. `validate`
//! compares spot against the time-weighted average without mutating.

use crate::config::OracleConfig;
use crate::constants::{MAX_SLIPPAGE_PERCENT, PERCENT_DENOMINATOR};
use crate::errors::{CoreResult, MemeCoreError};
use crate::events::{EventLog, ProtocolEvent};
use crate::host::{Clock, ConcentratedAmm};
use crate::math::safe_math::{safe_add_u128, safe_cast_u256_to_u128, safe_mul_u128};
use crate::math::sqrt_price::{inverse_price_from_sqrt_price, price_from_sqrt_price};
use crate::types::PriceSnapshot;
use ethnum::U256;

/// Whether `price` lies within `slippage` percent of `reference`
pub fn within_tolerance(price: u128, reference: u128, slippage: u8) -> bool {
    let deviation = U256::from(price.abs_diff(reference)) * U256::from(PERCENT_DENOMINATOR);
    deviation <= U256::from(reference) * U256::from(slippage)
}

#[derive(Clone, Debug)]
pub struct PriceOracle {
    config: OracleConfig,
    snapshot: PriceSnapshot,
}

impl PriceOracle {
    pub fn new(config: OracleConfig) -> CoreResult<Self> {
        if config.max_slippage > MAX_SLIPPAGE_PERCENT {
            return Err(MemeCoreError::InvalidParameter("oracle max_slippage above 100"));
        }
        Ok(Self {
            config,
            snapshot: PriceSnapshot::default(),
        })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &PriceSnapshot {
        &self.snapshot
    }

    /// Target tokens per pool asset at the pool's current price, scaled by 1e18
    pub fn spot_price<H: ConcentratedAmm>(&self, host: &H) -> CoreResult<u128> {
        let pool = host
            .get_pool(&self.config.pool_asset, &self.config.target_asset, self.config.fee_bps)
            .ok_or(MemeCoreError::PoolNotFound)?;
        let slot = host.slot0(&pool)?;
        if slot.token0 == self.config.pool_asset {
            price_from_sqrt_price(slot.sqrt_price)
        } else {
            inverse_price_from_sqrt_price(slot.sqrt_price)
        }
    }

    /// Fold the spot price into the average. Returns whether it was accepted.
    pub fn refresh<H: ConcentratedAmm + Clock>(
        &mut self,
        host: &H,
        events: &mut EventLog,
    ) -> CoreResult<bool> {
        let now = host.unix_timestamp();
        let spot = self.spot_price(host)?;

        if !self.snapshot.is_initialized() {
            self.snapshot = PriceSnapshot {
                cumulative_price: 0,
                last_updated: now,
                average_price: spot,
                tracking_since: now,
                initialized: true,
            };
            self.emit_refreshed(events);
            return Ok(true);
        }

        let elapsed = self.snapshot.elapsed(now);
        if elapsed < self.config.min_update_interval {
            log::debug!(
                "oracle refresh skipped: {}s since last update, {}s required",
                elapsed,
                self.config.min_update_interval
            );
            return Ok(false);
        }
        if !within_tolerance(spot, self.snapshot.average_price, self.config.max_slippage) {
            log::warn!(
                "oracle refresh rejected: spot {} outside {}% of average {}",
                spot,
                self.config.max_slippage,
                self.snapshot.average_price
            );
            return Ok(false);
        }

        // Accumulate the outgoing average before it is replaced
        let accrued = safe_mul_u128(self.snapshot.average_price, elapsed as u128)?;
        self.snapshot.cumulative_price = safe_add_u128(self.snapshot.cumulative_price, accrued)?;
        self.snapshot.average_price = spot;
        self.snapshot.last_updated = now;
        self.emit_refreshed(events);
        Ok(true)
    }

    /// Time-weighted average from the first refresh until `now`
    pub fn time_weighted_average(&self, now: i64) -> CoreResult<Option<u128>> {
        if !self.snapshot.is_initialized() {
            return Ok(None);
        }
        let elapsed = self.snapshot.elapsed(now);
        if elapsed <= 0 {
            return Ok(None);
        }
        let window = now.saturating_sub(self.snapshot.tracking_since) as u128;
        let cumulative = U256::from(self.snapshot.cumulative_price)
            + U256::from(self.snapshot.average_price) * U256::from(elapsed as u128);
        safe_cast_u256_to_u128(cumulative / U256::from(window)).map(Some)
    }

    /// Check the spot price against the time-weighted average
    pub fn validate<H: ConcentratedAmm + Clock>(&self, host: &H, slippage: u8) -> CoreResult<bool> {
        if slippage > self.config.max_slippage {
            return Err(MemeCoreError::InvalidParameter("slippage above the oracle maximum"));
        }
        let Some(twap) = self.time_weighted_average(host.unix_timestamp())? else {
            return Ok(false);
        };
        let spot = self.spot_price(host)?;
        Ok(within_tolerance(spot, twap, slippage))
    }

    fn emit_refreshed(&self, events: &mut EventLog) {
        events.emit(ProtocolEvent::OracleRefreshed {
            average_price: self.snapshot.average_price,
            cumulative_price: self.snapshot.cumulative_price,
            timestamp: self.snapshot.last_updated,
        });
    }
}
