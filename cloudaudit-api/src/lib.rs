//! # Cloud Audit API Client Library
//!
//! A small Rust client for the paginated audit-log list endpoint of a cloud
//! organisation. It handles bearer-token authentication, query construction
//! for the supported filters, and typed deserialization of result pages.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cloudaudit_api::{AuditLogListRequest, AuditLogSource, CloudAuditClient, CloudAuditConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CloudAuditConfig::new("org-1234", "secret-token");
//!     let client = CloudAuditClient::new(config)?;
//!
//!     let api = client.audit_log_api();
//!     let page = api
//!         .list_audit_logs(&AuditLogListRequest::new(1, 100).with_search_text("login"))
//!         .await?;
//!     println!("{} of {} pages", page.items.len(), page.total_pages);
//!     Ok(())
//! }
//! ```
pub mod audit;
pub mod client;

use secrecy::SecretString;

// Re-export common types for convenience
pub use audit::{AuditLogApi, AuditLogListRequest, AuditLogPage, AuditLogRecord, AuditLogSource};
pub use client::CloudAuditClient;

/// Default API endpoint
pub const DEFAULT_API_URL: &str = "https://api.cloudaudit.io";

/// Error type for audit API operations.
#[derive(Debug, thiserror::Error)]
#[must_use = "Need to handle all error enum types."]
pub enum CloudAuditError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// JSON serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The API rejected the credentials
    #[error("Authentication error: {0}")]
    Authentication(String),
    /// API returned an error response
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// Configuration is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Configuration for the audit API client.
///
/// The token is kept in a [`SecretString`] so it never shows up in `Debug`
/// output or logs.
#[derive(Debug)]
pub struct CloudAuditConfig {
    /// Base URL of the API (no trailing slash required)
    pub api_url: String,
    /// Bearer token used for every request
    pub api_token: SecretString,
    /// Organisation whose audit trail is queried
    pub organisation_id: String,
    /// Connection timeout in seconds (default: 30)
    pub connect_timeout: u64,
    /// Per-request timeout in seconds (default: 300)
    pub request_timeout: u64,
    /// Whether to validate TLS certificates (default: true)
    pub validate_certificates: bool,
}

impl CloudAuditConfig {
    /// Create a new configuration against the default endpoint.
    pub fn new(organisation_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: SecretString::from(api_token.into()),
            organisation_id: organisation_id.into(),
            connect_timeout: 30,
            request_timeout: 300,
            validate_certificates: true,
        }
    }

    /// Point the client at a different API endpoint.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Set the HTTP connect and request timeouts in seconds.
    #[must_use]
    pub fn with_timeouts(mut self, connect_timeout: u64, request_timeout: u64) -> Self {
        self.connect_timeout = connect_timeout;
        self.request_timeout = request_timeout;
        self
    }

    /// Disable TLS certificate validation (development only).
    #[must_use]
    pub fn with_certificate_validation_disabled(mut self) -> Self {
        self.validate_certificates = false;
        self
    }
}
