//! Error types for LIWANAG

use thiserror::Error;

/// Errors that can occur while loading or presenting sensor data.
///
/// Aggregation, classification and interpolation are total and never
/// produce one of these.
#[derive(Debug, Error)]
pub enum LiwanagError {
    #[error("Failed to parse sensor payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to fetch sensor data (HTTP {status})")]
    FetchFailed { status: u16 },

    #[error("Failed to fetch sensor data (unreadable response: {0})")]
    BadResponse(String),

    #[error("HTTP transport error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown area: {0}")]
    UnknownArea(String),
}

impl LiwanagError {
    /// Whether this is the data-fetch failure surfaced to the user with a
    /// retry action.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            LiwanagError::FetchFailed { .. }
                | LiwanagError::BadResponse(_)
                | LiwanagError::Http(_)
        )
    }
}
