//! Event definitions

use anchor_lang::prelude::*;

#[cfg(feature = "client")]
use crate::config::pubkey_serde;
#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// Events emitted by the factory, the oracle and the burner, in emission order
#[derive(Clone, Debug, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub enum ProtocolEvent {
    /// A new launch was created
    Summoned {
        launch_id: u64,
        #[cfg_attr(feature = "client", serde(with = "pubkey_serde"))]
        summoner: Pubkey,
        name: String,
        symbol: String,
        total_supply: u64,
    },
    /// A funder committed native asset to a launch
    Hearted {
        launch_id: u64,
        #[cfg_attr(feature = "client", serde(with = "pubkey_serde"))]
        funder: Pubkey,
        amount: u64,
    },
    /// Token created and pool seeded
    Unleashed {
        launch_id: u64,
        #[cfg_attr(feature = "client", serde(with = "pubkey_serde"))]
        token: Pubkey,
        #[cfg_attr(feature = "client", serde(with = "pubkey_serde"))]
        pool: Pubkey,
        position_id: u64,
        liquidity: u128,
        /// Native amount set aside for retirement, pool leftovers included
        retirement_amount: u64,
        final_holders_share: u64,
        timestamp: i64,
    },
    /// A funder received their allocation
    Collected {
        launch_id: u64,
        #[cfg_attr(feature = "client", serde(with = "pubkey_serde"))]
        funder: Pubkey,
        allocation: u64,
    },
    /// Unclaimed allocation was burned
    Purged { launch_id: u64, amount: u64 },
    /// Trading fees were harvested from a launch position
    FeesCollected {
        launch_id: u64,
        pool_asset_amount: u64,
        meme_burned: u64,
    },
    /// Scheduled pool asset was handed to the burner
    RetirementScheduled { amount: u64 },
    /// An oracle refresh was accepted
    OracleRefreshed {
        average_price: u128,
        cumulative_price: u128,
        timestamp: i64,
    },
    /// Pool asset was swapped into the target asset
    Converted { amount_in: u64, amount_out: u64 },
    /// Target asset left the local domain for retirement
    Retired {
        amount: u64,
        fee_spent: u64,
        fee_refunded: u64,
    },
}

/// Append-only event sink
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<ProtocolEvent>,
}

impl EventLog {
    pub fn emit(&mut self, event: ProtocolEvent) {
        log::debug!("event: {:?}", event);
        self.events.push(event);
    }

    pub fn events(&self) -> &[ProtocolEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove and return every event recorded so far
    pub fn drain(&mut self) -> Vec<ProtocolEvent> {
        std::mem::take(&mut self.events)
    }
}
