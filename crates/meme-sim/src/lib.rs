//! Scenario simulation for the meme launch protocol
//!
//! Loads a TOML configuration and scenario, runs the scenario against the
//! in-memory host and reports every emitted event.

pub mod config;
pub mod error;
pub mod runner;
pub mod scenario;

pub use config::{DomainKind, EnvironmentConfig, SimConfig};
pub use error::{SimError, SimResult};
pub use runner::{run, SimReport, Simulation};
pub use scenario::{Scenario, Step, TradeSide};
