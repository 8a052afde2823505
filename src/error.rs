//! Error types for the optimistic log.

use crate::types::Digest;
use thiserror::Error;

/// Main error type for log operations.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Literal patch rejected while {pending} transaction(s) pending; use a computed patch")]
    InvalidPatchForm { pending: usize },

    #[error("Replay diverged from committed state: expected {expected}, got {got}")]
    ReplayDivergence { expected: Digest, got: Digest },

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for LogError {
    fn from(e: serde_json::Error) -> Self {
        LogError::Serialization(e.to_string())
    }
}

/// Result type for log operations.
pub type Result<T> = std::result::Result<T, LogError>;
