//! Launch records and their lifecycle phase

use crate::constants::{COLLECT_DELAY, UNLEASH_DELAY};
use anchor_lang::prelude::*;

/// Lifecycle phase of a launch at a given instant
#[derive(Clone, Copy, Debug, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub enum LaunchPhase {
    /// Accepting hearts, unleash delay not yet elapsed
    Funding,
    /// Accepting hearts, unleash is open to anyone
    Unleashable,
    /// Unleashed, funders may collect
    Collecting,
    /// Collect window closed, leftover allocation can be purged
    Expired,
}

/// One summoned token, keyed by its launch nonce
#[derive(Clone, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct LaunchRecord {
    pub name: String,
    pub symbol: String,
    /// Supply minted at unleash
    pub total_supply: u64,
    pub summoner: Pubkey,
    /// Native amount committed by all funders, frozen at unleash
    pub total_contributed: u64,
    pub summoned_at: i64,
    /// Zero until unleashed
    pub unleashed_at: i64,
    /// Token units reserved for funders
    pub final_holders_share: u64,
    pub token: Pubkey,
    pub pool: Pubkey,
    pub position_id: u64,
    /// Whether the launched token is token 0 of its pool
    pub meme_is_token0: bool,
}

impl LaunchRecord {
    pub fn is_unleashed(&self) -> bool {
        self.unleashed_at != 0
    }

    /// First instant at which `unleash` is accepted
    pub fn unleash_available_at(&self) -> i64 {
        self.summoned_at.saturating_add(UNLEASH_DELAY)
    }

    /// Last instant at which `collect` is accepted
    pub fn collect_deadline(&self) -> i64 {
        self.unleashed_at.saturating_add(COLLECT_DELAY)
    }

    pub fn phase(&self, now: i64) -> LaunchPhase {
        if !self.is_unleashed() {
            if now < self.unleash_available_at() {
                LaunchPhase::Funding
            } else {
                LaunchPhase::Unleashable
            }
        } else if now <= self.collect_deadline() {
            LaunchPhase::Collecting
        } else {
            LaunchPhase::Expired
        }
    }
}
