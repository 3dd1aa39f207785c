//! Error types for course-core

use std::path::PathBuf;

use crate::source::SourceError;
use crate::store::StoreError;

/// Result type for course-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in course-core operations
///
/// Sync runs never surface these to callers: the orchestrator folds every
/// failure into the run's `SyncResult`. They are returned by configuration
/// loading and by adapter constructors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parsed but failed validation
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Content source error
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Persistent store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Payload error from course-blocks
    #[error(transparent)]
    Blocks(#[from] course_blocks::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
