use crate::error::{SimError, SimResult};
use meme_core::host::memory::DEFAULT_START_TIME;
use meme_core::ProtocolConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;

/// Accounts the runner creates itself
const RESERVED_ACCOUNTS: [&str; 3] = ["market-maker", "factory", "burner"];

/// Simulation configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SimConfig {
    /// Protocol tunables. Oracle assets are bound by the runner.
    #[serde(default)]
    pub protocol: ProtocolConfig,

    /// Environment the protocol runs in
    #[serde(default)]
    pub environment: EnvironmentConfig,
}

/// Which domain capabilities the protocol is assembled with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainKind {
    /// Native deposits are wrapped, retirement crosses the bridge
    #[default]
    Wrapped,
    /// Native asset is the pool asset, retirement burns locally
    Local,
}

/// In-memory host setup
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnvironmentConfig {
    pub domain: DomainKind,

    /// Initial clock value (unix seconds)
    pub start_time: i64,

    /// Named funder accounts
    pub accounts: Vec<String>,

    /// Native balance credited to every named account
    pub account_balance: u64,

    /// Per-side depth of the pool-asset/target pool read by the oracle
    pub oracle_depth: u64,

    /// Fee quoted by the bridge for every transfer
    pub bridge_fee: u64,

    /// Abort the scenario at the first failing step
    pub stop_on_error: bool,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            domain: DomainKind::Wrapped,
            start_time: DEFAULT_START_TIME,
            accounts: vec!["alice".to_string(), "bob".to_string(), "carol".to_string()],
            account_balance: 1_000_000_000_000, // 1000 native
            oracle_depth: 1_000_000_000_000_000,
            bridge_fee: 1_000_000,
            stop_on_error: false,
        }
    }
}

impl SimConfig {
    /// Load configuration from TOML file
    pub fn load(path: &str) -> SimResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_string(),
            source,
        })?;
        let config: SimConfig = toml::from_str(&content).map_err(|source| SimError::Parse {
            path: path.to_string(),
            source,
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &str) -> SimResult<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| SimError::Io {
            path: path.to_string(),
            source,
        })?;
        Ok(())
    }

    /// Validate the environment. Protocol tunables are validated once the
    /// oracle assets exist.
    pub fn validate(&self) -> SimResult<()> {
        let env = &self.environment;
        if env.accounts.is_empty() {
            return Err(SimError::InvalidConfig("at least one account is required".to_string()));
        }

        let mut seen = BTreeSet::new();
        for name in &env.accounts {
            if name.is_empty() {
                return Err(SimError::InvalidConfig("account names must be non-empty".to_string()));
            }
            if RESERVED_ACCOUNTS.contains(&name.as_str()) {
                return Err(SimError::InvalidConfig(format!("account name {} is reserved", name)));
            }
            if !seen.insert(name) {
                return Err(SimError::InvalidConfig(format!("duplicate account {}", name)));
            }
        }

        if env.start_time <= 0 {
            return Err(SimError::InvalidConfig(format!(
                "start_time must be positive, got {}",
                env.start_time
            )));
        }
        if env.oracle_depth == 0 {
            return Err(SimError::InvalidConfig("oracle_depth must be positive".to_string()));
        }

        Ok(())
    }
}
