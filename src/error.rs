//! Error types for the helper service.

use thiserror::Error;

/// Errors produced by grid generation, the display client and the
/// supporting stores.
#[derive(Debug, Error)]
pub enum Error {
    /// Requested Boggle board size is not 4 or 5
    #[error("Unsupported Boggle size: {0}")]
    UnsupportedSize(i64),

    /// Template placeholders and rolled letters (or rows) disagree
    #[error("Boggle template mismatch: {0}")]
    TemplateMismatch(String),

    /// Vestaboard rejected the credentials or the subscription lookup
    #[error("Vestaboard authentication failed: {0}")]
    Auth(String),

    /// Text contains characters the board cannot display
    #[error("Message contains invalid characters")]
    InvalidCharacters,

    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// Remote API returned an error status code
    #[error("API returned error status {status}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Sayings database failure (connection or query)
    #[error("Database error: {0}")]
    Database(String),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Optional collaborator was not configured
    #[error("{0} not configured")]
    NotConfigured(&'static str),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether this error came from the display-sending side
    /// (authentication, content validation or transport).
    pub fn is_display_failure(&self) -> bool {
        matches!(
            self,
            Error::Auth(_) | Error::InvalidCharacters | Error::Request(_) | Error::Api { .. }
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Request(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Database(err.to_string())
    }
}
