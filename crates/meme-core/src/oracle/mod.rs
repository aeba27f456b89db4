//! # Oracle Module
//!
//! Time-weighted price oracle between the pool asset and the target asset,
//! consulted by the burner around every swap.

pub mod price_oracle;

pub use price_oracle::*;
