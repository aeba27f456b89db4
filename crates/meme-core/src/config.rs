//! Protocol configuration
//!
//! Tunables of the factory, the oracle and the burner. Asset identities of
//! the oracle are bound at construction time by the embedding host.

use crate::constants::{
    LAUNCH_POOL_FEE_BPS, MAX_SLIPPAGE_PERCENT, MEME_TOKEN_DECIMALS,
};
use crate::errors::{CoreResult, MemeCoreError};
use anchor_lang::prelude::Pubkey;

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// Complete protocol configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "client", serde(default))]
pub struct ProtocolConfig {
    pub factory: FactoryConfig,
    pub oracle: OracleConfig,
    pub burner: BurnerConfig,
}

/// Launch factory settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "client", serde(default))]
pub struct FactoryConfig {
    /// Minimum native deposit accepted by `summon`
    pub min_summon_deposit: u64,
    /// Fee tier of launch pools in basis points
    pub pool_fee_bps: u16,
}

/// Price oracle settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "client", serde(default))]
pub struct OracleConfig {
    /// Pool (reference) asset
    #[cfg_attr(feature = "client", serde(with = "pubkey_serde", default))]
    pub pool_asset: Pubkey,
    /// Settlement (target) asset
    #[cfg_attr(feature = "client", serde(with = "pubkey_serde", default))]
    pub target_asset: Pubkey,
    /// Fee tier of the pool the oracle reads
    pub fee_bps: u16,
    /// Maximum accepted deviation from the average, in percent
    pub max_slippage: u8,
    /// Minimum seconds between two accepted refreshes
    pub min_update_interval: i64,
}

/// Buy-back-and-burn settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "client", serde(default))]
pub struct BurnerConfig {
    /// Slippage applied to swap minimums and oracle validation, in percent
    pub max_slippage: u8,
    /// Minimum pending amount before a retirement can be bridged
    pub min_bridge_amount: u64,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            // 0.01 of a 9-decimal native asset
            min_summon_deposit: 10u64.pow(MEME_TOKEN_DECIMALS as u32) / 100,
            pool_fee_bps: LAUNCH_POOL_FEE_BPS,
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            pool_asset: Pubkey::default(),
            target_asset: Pubkey::default(),
            fee_bps: LAUNCH_POOL_FEE_BPS,
            max_slippage: 5,
            min_update_interval: 15 * 60,
        }
    }
}

impl Default for BurnerConfig {
    fn default() -> Self {
        Self {
            max_slippage: 5,
            min_bridge_amount: 1,
        }
    }
}

impl ProtocolConfig {
    /// Bind the oracle to its two assets
    pub fn with_assets(mut self, pool_asset: Pubkey, target_asset: Pubkey) -> Self {
        self.oracle.pool_asset = pool_asset;
        self.oracle.target_asset = target_asset;
        self
    }

    /// Validate every section
    pub fn validate(&self) -> CoreResult<()> {
        if self.factory.min_summon_deposit == 0 {
            return Err(MemeCoreError::InvalidParameter("min_summon_deposit must be positive"));
        }
        if self.factory.pool_fee_bps == 0 {
            return Err(MemeCoreError::InvalidParameter("pool_fee_bps must be positive"));
        }

        if self.oracle.pool_asset == Pubkey::default()
            || self.oracle.target_asset == Pubkey::default()
        {
            return Err(MemeCoreError::InvalidParameter("oracle assets are not bound"));
        }
        if self.oracle.pool_asset == self.oracle.target_asset {
            return Err(MemeCoreError::InvalidParameter("oracle assets must differ"));
        }
        if self.oracle.max_slippage > MAX_SLIPPAGE_PERCENT {
            return Err(MemeCoreError::InvalidParameter("oracle max_slippage above 100"));
        }
        if self.oracle.min_update_interval < 0 {
            return Err(MemeCoreError::InvalidParameter("min_update_interval is negative"));
        }

        if self.burner.max_slippage > self.oracle.max_slippage {
            return Err(MemeCoreError::InvalidParameter(
                "burner max_slippage exceeds the oracle maximum",
            ));
        }
        if self.burner.min_bridge_amount == 0 {
            return Err(MemeCoreError::InvalidParameter("min_bridge_amount must be positive"));
        }

        Ok(())
    }
}

/// Base58 string encoding for Pubkey fields
#[cfg(feature = "client")]
pub mod pubkey_serde {
    use anchor_lang::prelude::Pubkey;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S>(pubkey: &Pubkey, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&pubkey.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Pubkey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Pubkey::from_str(&s).map_err(serde::de::Error::custom)
    }
}
