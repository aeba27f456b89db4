//! # Meme Core - Launch and Settlement Engine
//!
//! Permissionless token launches funded in a native asset, plus the
//! buy-back-and-burn engine fed by their pools. It provides:
//!
//! - The launch factory state machine (summon, heart, unleash, collect, purge)
//! - Pool seeding math and price-sanity checks against the external AMM
//! - A time-weighted price oracle guarding every settlement swap
//! - Host interfaces for the ledger, AMM, bridge and clock, with an
//!   in-memory reference host
//! - A transactional [`Protocol`] facade with all-or-nothing entry points
//!
//! ## Feature Flags
//!
//! - `client`: Enables serde serialization of configuration and events

pub mod burner;
pub mod config;
pub mod constants;
pub mod context;
pub mod domain;
pub mod errors;
pub mod events;
pub mod factory;
pub mod host;
pub mod math;
pub mod oracle;
pub mod pool_adapter;
pub mod protocol;
pub mod reentrancy;
pub mod types;

// Re-export commonly used items
pub use config::{BurnerConfig, FactoryConfig, OracleConfig, ProtocolConfig};
pub use constants::*;
pub use domain::{DomainCapabilities, LocalDomain, WrappedNativeDomain};
pub use errors::{CoreResult, ErrorCategory, MemeCoreError};
pub use events::ProtocolEvent;
pub use host::{Host, MemoryHost};
pub use protocol::Protocol;
pub use types::*;
