//! Error types for the obspec library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for obspec operations.
#[derive(Debug, Error)]
pub enum ObspecError {
    /// Entities were given both as DCIDs and as an expression, or not at all.
    #[error("Entity selection error: {0}")]
    EntitySelection(String),

    /// A stat var or entity identifier is outside the DCID domain.
    #[error("Invalid DCID '{0}'")]
    InvalidDcid(String),

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Transport-level failure talking to the API.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error ({status}) for {url}: {body}")]
    Api {
        status: u16,
        url: String,
        body: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error from the CSV writer.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Message catalog could not be loaded.
    #[error("Locale error: {0}")]
    Locale(String),
}

/// Result type alias for obspec operations.
pub type Result<T> = std::result::Result<T, ObspecError>;
