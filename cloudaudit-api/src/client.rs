//! Core audit API client implementation.
//!
//! This module contains the HTTP client used for authenticated requests to
//! the audit API: URL construction, bearer authentication and response
//! status handling. Retries are left to the caller.

use log::debug;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::audit::AuditLogApi;
use crate::{CloudAuditConfig, CloudAuditError};

/// Core audit API client.
#[derive(Clone)]
pub struct CloudAuditClient {
    config: Arc<CloudAuditConfig>,
    client: Client,
}

impl CloudAuditClient {
    /// Create a new audit API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not a valid absolute URL, the token
    /// is empty, or the HTTP client cannot be built.
    pub fn new(config: CloudAuditConfig) -> Result<Self, CloudAuditError> {
        Url::parse(&config.api_url).map_err(|e| {
            CloudAuditError::InvalidConfig(format!("Invalid API URL '{}': {e}", config.api_url))
        })?;

        if config.api_token.expose_secret().trim().is_empty() {
            return Err(CloudAuditError::InvalidConfig(
                "API token cannot be empty".to_string(),
            ));
        }

        if config.organisation_id.trim().is_empty() {
            return Err(CloudAuditError::InvalidConfig(
                "Organisation ID cannot be empty".to_string(),
            ));
        }

        let mut client_builder = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .timeout(Duration::from_secs(config.request_timeout));

        if !config.validate_certificates {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder.build()?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    /// Get access to the configuration
    #[must_use]
    pub fn config(&self) -> &CloudAuditConfig {
        &self.config
    }

    /// Get an audit log API instance.
    #[must_use]
    pub fn audit_log_api(&self) -> AuditLogApi {
        AuditLogApi::new(self.clone())
    }

    /// Build the full URL for an endpoint, appending query parameters.
    fn build_url(
        &self,
        endpoint: &str,
        query_params: &[(String, String)],
    ) -> Result<Url, CloudAuditError> {
        let base = self.config.api_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}{endpoint}")).map_err(|e| {
            CloudAuditError::InvalidConfig(format!("Invalid request URL for {endpoint}: {e}"))
        })?;

        if !query_params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query_params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        Ok(url)
    }

    /// Make an authenticated GET request and check the response status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent, authentication is
    /// rejected, or the API responds with a non-success status.
    pub async fn get_with_query(
        &self,
        endpoint: &str,
        query_params: &[(String, String)],
    ) -> Result<reqwest::Response, CloudAuditError> {
        let url = self.build_url(endpoint, query_params)?;
        debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .bearer_auth(self.config.api_token.expose_secret())
            .header("Accept", "application/json")
            .send()
            .await?;

        Self::handle_response(response, &format!("GET {endpoint}")).await
    }

    /// Convert non-success responses into errors with context.
    ///
    /// # Errors
    ///
    /// Returns `Authentication` for 401/403 and `InvalidResponse` for any
    /// other non-success status.
    pub async fn handle_response(
        response: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, CloudAuditError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().clone();
        let error_text = response.text().await.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CloudAuditError::Authentication(format!(
                "{context} was rejected (HTTP {status}): {error_text}"
            )));
        }

        Err(CloudAuditError::InvalidResponse(format!(
            "Failed to {context}\n  URL: {url}\n  HTTP {status}: {error_text}"
        )))
    }
}
