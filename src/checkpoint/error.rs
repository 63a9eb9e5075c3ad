//! Checkpoint error types.

use crate::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Failed to encode checkpoint: {0}")]
    Encode(String),

    #[error("Failed to decode checkpoint: {0}")]
    Decode(String),

    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The stored configuration no longer validates.
    #[error("Checkpoint configuration is invalid: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// History and machine disagree, or history overflows its capacity.
    #[error("Checkpoint history is inconsistent: {0}")]
    InconsistentHistory(String),
}
