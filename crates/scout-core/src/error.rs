use thiserror::Error;

/// Application-wide error types for Scout.
///
/// Field-level absence is never an error (see [`crate::outcome`]); these
/// variants describe target, page and configuration failures.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed (non-success status, unreadable body).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Navigation or rendering timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The document rendered, but its ready marker never appeared.
    #[error("Marker '{marker}' did not appear within {secs} seconds")]
    MarkerTimeout { marker: String, secs: u64 },

    /// The render session failed (browser crashed, tab closed, CDP error).
    #[error("Render error: {0}")]
    RenderError(String),

    /// A CSS selector in a locator could not be parsed.
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// A regular expression in a post-processor could not be compiled.
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Extraction schema could not be read or is malformed.
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Invalid configuration or invocation.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AppError {
    /// Returns true if the failure was a wait that ran out of time, either
    /// during navigation or while waiting for a ready marker.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AppError::Timeout(_) | AppError::MarkerTimeout { .. })
    }
}
