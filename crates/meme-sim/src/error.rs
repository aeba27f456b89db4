//! Error types for the simulation runner

use meme_core::MemeCoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Unknown launch: {0}")]
    UnknownLaunch(u64),

    #[error("Protocol error: {0}")]
    Protocol(#[from] MemeCoreError),

    #[error("Step {index} ({action}) failed: {source}")]
    StepFailed {
        index: usize,
        action: &'static str,
        #[source]
        source: Box<SimError>,
    },
}

pub type SimResult<T> = std::result::Result<T, SimError>;
