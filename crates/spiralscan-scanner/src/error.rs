use spiralscan_core::SpiralscanError;
use std::time::Duration;
use thiserror::Error;

/// Errors that abort scan construction.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("invalid partition count {0}: at least one worker is required")]
    InvalidPartitionCount(usize),

    #[error("invalid retry budget {0}: at least one attempt is required")]
    InvalidRetryAttempts(u32),

    #[error("no authenticated workers available")]
    NoWorkersAvailable,

    #[error("Configuration error: {0}")]
    Config(#[from] SpiralscanError),
}

/// Failures reported by a remote map-objects client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, ScanError>;
