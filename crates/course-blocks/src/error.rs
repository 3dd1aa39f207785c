//! Error types for course-blocks

/// Result type for course-blocks operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while ingesting source payloads
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid node payload: {message}")]
    InvalidShape { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_shape(message: impl Into<String>) -> Self {
        Self::InvalidShape {
            message: message.into(),
        }
    }
}
