//! Audit Log API
//!
//! This module provides access to the paginated audit-log list endpoint.
//! The endpoint is not time-scoped: callers page through results and select
//! records by their `createdAt` timestamp themselves.
use crate::{CloudAuditClient, CloudAuditError};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize, Serializer};

/// Request parameters for one page of audit logs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuditLogListRequest {
    /// Page number (1-indexed)
    pub page: u32,
    /// Maximum number of items per page
    pub limit: u32,
    /// Free-text search across log attributes
    pub search_text: Option<String>,
    /// Service account that performed the action
    pub service_account: Option<String>,
    /// User that performed the action
    pub user_identity: Option<String>,
    /// User impersonating another identity
    pub impersonator_identity: Option<String>,
    /// Actions to include (e.g. "create", "delete")
    pub actions: Vec<String>,
    /// Resource types to include
    pub resource_types: Vec<String>,
    /// Identity of the affected resource
    pub resource_identity: Option<String>,
    /// Organisation identity the event belongs to
    pub organisation_identity: Option<String>,
    /// Include events emitted by platform system services
    pub include_system_services: bool,
    /// HTTP response status of the audited call
    pub response_status: Option<u16>,
}

impl AuditLogListRequest {
    /// Create a request for a page with no filters
    #[must_use]
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            ..Self::default()
        }
    }

    /// Return the same request pointed at another page
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Add a free-text search filter
    #[must_use]
    pub fn with_search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    /// Add a service account filter
    #[must_use]
    pub fn with_service_account(mut self, account: impl Into<String>) -> Self {
        self.service_account = Some(account.into());
        self
    }

    /// Add a user identity filter
    #[must_use]
    pub fn with_user_identity(mut self, identity: impl Into<String>) -> Self {
        self.user_identity = Some(identity.into());
        self
    }

    /// Add an impersonator identity filter
    #[must_use]
    pub fn with_impersonator_identity(mut self, identity: impl Into<String>) -> Self {
        self.impersonator_identity = Some(identity.into());
        self
    }

    /// Add action filters
    #[must_use]
    pub fn with_actions(mut self, actions: Vec<String>) -> Self {
        self.actions = actions;
        self
    }

    /// Add resource type filters
    #[must_use]
    pub fn with_resource_types(mut self, types: Vec<String>) -> Self {
        self.resource_types = types;
        self
    }

    /// Add a resource identity filter
    #[must_use]
    pub fn with_resource_identity(mut self, identity: impl Into<String>) -> Self {
        self.resource_identity = Some(identity.into());
        self
    }

    /// Add an organisation identity filter
    #[must_use]
    pub fn with_organisation_identity(mut self, identity: impl Into<String>) -> Self {
        self.organisation_identity = Some(identity.into());
        self
    }

    /// Include system service events
    #[must_use]
    pub fn with_system_services(mut self, include: bool) -> Self {
        self.include_system_services = include;
        self
    }

    /// Add a response status filter
    #[must_use]
    pub fn with_response_status(mut self, status: u16) -> Self {
        self.response_status = Some(status);
        self
    }

    /// Query parameters for this request; unset filters are omitted
    #[must_use]
    pub fn query_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];

        let optional = [
            ("search_text", &self.search_text),
            ("service_account", &self.service_account),
            ("user_identity", &self.user_identity),
            ("impersonator_identity", &self.impersonator_identity),
            ("resource_identity", &self.resource_identity),
            ("organisation_identity", &self.organisation_identity),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                params.push((key.to_string(), value.clone()));
            }
        }

        for action in &self.actions {
            params.push(("action".to_string(), action.clone()));
        }
        for resource_type in &self.resource_types {
            params.push(("resource_type".to_string(), resource_type.clone()));
        }

        if self.include_system_services {
            params.push(("include_system_services".to_string(), "true".to_string()));
        }
        if let Some(status) = self.response_status {
            params.push(("response_status".to_string(), status.to_string()));
        }

        params
    }
}

/// One page of audit logs as returned by the API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogPage {
    /// Records on this page
    #[serde(default)]
    pub items: Vec<AuditLogRecord>,
    /// Total number of pages for the request
    #[serde(default)]
    pub total_pages: u32,
    /// Total number of items matching the request
    #[serde(default)]
    pub total_items: u64,
    /// Total number of records in the organisation's audit trail
    #[serde(default)]
    pub total_count: u64,
}

/// A single audit log record
///
/// Only `createdAt` is interpreted; the rest of the payload is kept as raw
/// JSON and serialized back unchanged.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "serde_json::Value")]
pub struct AuditLogRecord {
    /// Parsed `createdAt` timestamp (None if missing or not RFC3339)
    pub created_at: Option<DateTime<FixedOffset>>,
    /// Record exactly as received
    pub raw: serde_json::Value,
}

impl From<serde_json::Value> for AuditLogRecord {
    fn from(raw: serde_json::Value) -> Self {
        let created_at = raw
            .get("createdAt")
            .and_then(serde_json::Value::as_str)
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok());
        Self { created_at, raw }
    }
}

impl Serialize for AuditLogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

/// Anything that can serve pages of audit logs
#[async_trait]
pub trait AuditLogSource: Send + Sync {
    /// Fetch one page of audit logs
    async fn list_audit_logs(
        &self,
        request: &AuditLogListRequest,
    ) -> Result<AuditLogPage, CloudAuditError>;
}

/// The Audit Log API interface
#[derive(Clone)]
pub struct AuditLogApi {
    client: CloudAuditClient,
}

impl AuditLogApi {
    /// Create a new Audit Log API instance
    #[must_use]
    pub fn new(client: CloudAuditClient) -> Self {
        Self { client }
    }

    fn endpoint(&self) -> String {
        // URL-encode the organisation ID to keep it inside its path segment
        let organisation = urlencoding::encode(&self.client.config().organisation_id);
        format!("/audit-trail/v1/organisations/{organisation}/audit-logs")
    }
}

#[async_trait]
impl AuditLogSource for AuditLogApi {
    async fn list_audit_logs(
        &self,
        request: &AuditLogListRequest,
    ) -> Result<AuditLogPage, CloudAuditError> {
        let response = self
            .client
            .get_with_query(&self.endpoint(), &request.query_params())
            .await?;

        let response_text = response.text().await?;
        log::debug!(
            "Audit log page {} response: {} bytes",
            request.page,
            response_text.len()
        );

        let page: AuditLogPage = serde_json::from_str(&response_text)?;
        Ok(page)
    }
}
