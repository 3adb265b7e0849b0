//! Error types for cloudaudit
use crate::credentials::CredentialError;
use std::path::PathBuf;
use std::time::Duration;

/// Custom error type for export operations
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    /// Conflicting or missing flags
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed duration or date string
    #[error("Parse error: {0}")]
    Parse(String),

    /// A chunk did not finish downloading before its deadline
    #[error(
        "Timed out after {timeout:?} downloading chunk {index}/{total} ({start} to {end}); \
         try a larger --chunk-download-timeout or a finer split"
    )]
    ChunkTimeout {
        index: usize,
        total: usize,
        start: String,
        end: String,
        timeout: Duration,
    },

    /// Audit API error
    #[error("Audit API error: {0}")]
    Api(#[from] cloudaudit_api::CloudAuditError),

    /// Credential error
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Failed to write an artifact
    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File I/O error
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The user interrupted the export
    #[error("Export interrupted")]
    Interrupted,

    /// Invalid export configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, ExportError>;
