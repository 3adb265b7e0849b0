//! Attribute filters applied by the audit log API
use cloudaudit_api::AuditLogListRequest;
use serde::Serialize;

/// Attribute filters for an export
///
/// Serializes only the active fields, which is exactly the `filters` object
/// embedded in artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_identity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impersonator_identity: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_identity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organisation_identity: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub include_system_services: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_status: Option<u16>,
}

impl FilterCriteria {
    /// Whether any criterion differs from its default
    #[must_use]
    pub fn is_active(&self) -> bool {
        self != &Self::default()
    }

    /// Build the list request for `page`, carrying every active criterion
    #[must_use]
    pub fn to_request(&self, page: u32, limit: u32) -> AuditLogListRequest {
        AuditLogListRequest {
            page,
            limit,
            search_text: self.search_text.clone(),
            service_account: self.service_account.clone(),
            user_identity: self.user_identity.clone(),
            impersonator_identity: self.impersonator_identity.clone(),
            actions: self.actions.clone(),
            resource_types: self.resource_types.clone(),
            resource_identity: self.resource_identity.clone(),
            organisation_identity: self.organisation_identity.clone(),
            include_system_services: self.include_system_services,
            response_status: self.response_status,
        }
    }
}
