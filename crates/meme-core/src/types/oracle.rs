//! Oracle price snapshot

use anchor_lang::prelude::*;

/// Time-integrated price state of the oracle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct PriceSnapshot {
    /// Sum of `average_price * elapsed` over every accepted refresh
    pub cumulative_price: u128,
    /// Timestamp of the last accepted refresh
    pub last_updated: i64,
    /// Target tokens per pool asset, scaled by 1e18
    pub average_price: u128,
    /// Timestamp of the first accepted refresh, start of the cumulative window
    pub tracking_since: i64,
    /// Set by the first accepted refresh
    pub initialized: bool,
}

impl PriceSnapshot {
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Seconds since the last accepted refresh
    pub fn elapsed(&self, now: i64) -> i64 {
        now.saturating_sub(self.last_updated)
    }
}
