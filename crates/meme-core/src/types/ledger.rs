//! Settlement counters shared by the factory and the burner

use crate::errors::CoreResult;
use crate::math::safe_math::safe_add_u64;
use anchor_lang::prelude::*;

/// Amounts waiting for the two settlement legs.
///
/// Both counters only grow until drained, and a drain always resets to zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct SettlementLedger {
    /// Pool-asset amount waiting to be handed to the burner
    pub scheduled_for_retirement: u64,
    /// Target-asset amount waiting to be bridged out
    pub pending_bridged_amount: u64,
}

impl SettlementLedger {
    pub fn schedule(&mut self, amount: u64) -> CoreResult<()> {
        self.scheduled_for_retirement = safe_add_u64(self.scheduled_for_retirement, amount)?;
        Ok(())
    }

    /// Take the whole scheduled amount
    pub fn drain_scheduled(&mut self) -> u64 {
        std::mem::take(&mut self.scheduled_for_retirement)
    }

    pub fn add_pending(&mut self, amount: u64) -> CoreResult<()> {
        self.pending_bridged_amount = safe_add_u64(self.pending_bridged_amount, amount)?;
        Ok(())
    }

    /// Take the whole pending amount
    pub fn drain_pending(&mut self) -> u64 {
        std::mem::take(&mut self.pending_bridged_amount)
    }
}
