//! Scenario files: an ordered list of protocol actions and clock moves

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::fs;

/// Side of a market trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    /// Pool asset in, launch (or target) token out
    Buy,
    /// Launch (or target) token in, pool asset out
    Sell,
}

/// One scenario step
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Summon {
        account: String,
        name: String,
        symbol: String,
        total_supply: u64,
        deposit: u64,
    },
    Heart {
        account: String,
        launch: u64,
        amount: u64,
    },
    Unleash {
        account: String,
        launch: u64,
    },
    Collect {
        account: String,
        launch: u64,
    },
    Purge {
        launch: u64,
    },
    CollectFees {
        launches: Vec<u64>,
    },
    ScheduleRetirement,
    RefreshOracle,
    /// Convert held pool asset, all of it when `amount` is omitted
    Convert {
        #[serde(default)]
        amount: Option<u64>,
    },
    Retire {
        account: String,
        #[serde(default = "default_gas_limit")]
        gas_limit: u32,
        fee: u64,
    },
    /// External trade by the market maker. Without `launch` it trades the
    /// oracle pool.
    Trade {
        #[serde(default)]
        launch: Option<u64>,
        side: TradeSide,
        amount: u64,
    },
    Advance {
        seconds: i64,
    },
}

fn default_gas_limit() -> u32 {
    meme_core::DEFAULT_BRIDGE_GAS_LIMIT
}

impl Step {
    pub fn action(&self) -> &'static str {
        match self {
            Step::Summon { .. } => "summon",
            Step::Heart { .. } => "heart",
            Step::Unleash { .. } => "unleash",
            Step::Collect { .. } => "collect",
            Step::Purge { .. } => "purge",
            Step::CollectFees { .. } => "collect_fees",
            Step::ScheduleRetirement => "schedule_retirement",
            Step::RefreshOracle => "refresh_oracle",
            Step::Convert { .. } => "convert",
            Step::Retire { .. } => "retire",
            Step::Trade { .. } => "trade",
            Step::Advance { .. } => "advance",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Scenario {
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load(path: &str) -> SimResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| SimError::Parse {
            path: path.to_string(),
            source,
        })
    }
}
