//! # Core Type Definitions
//!
//! Persistent records of the factory, the oracle and the settlement ledger.

pub mod launch;
pub mod ledger;
pub mod oracle;

pub use launch::*;
pub use ledger::*;
pub use oracle::*;
