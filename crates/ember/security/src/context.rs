//! Per-access security contexts

use chrono::{DateTime, Utc};
use ember_types::{FunctionId, ProjectRef};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Isolation policy attached to a context. Only strict isolation is
/// implemented: cross-tenant access is always denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    Strict,
}

/// Per-tenant credential bundle carried by a security context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantCredentials {
    /// Service-role key; expected shape is `sk_<ref>_...`.
    pub service_role_key: String,
    /// Tenant API base URL; expected shape is `https://<ref>.<domain>`.
    pub api_url: String,
}

impl TenantCredentials {
    pub fn new(service_role_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            service_role_key: service_role_key.into(),
            api_url: api_url.into(),
        }
    }

    /// Whether the bundle matches the expected per-tenant shape.
    pub fn matches(&self, project: &ProjectRef, platform_domain: &str) -> bool {
        let key_prefix = format!("sk_{}_", project);
        let expected_url = format!("https://{}.{}", project, platform_domain);
        self.service_role_key.len() > key_prefix.len()
            && self.service_role_key.starts_with(&key_prefix)
            && self.api_url == expected_url
    }
}

/// Authorization state for one `(function, project)` pair.
///
/// Only creatable through the security manager after project-access
/// validation has passed; cached by the manager and explicitly invalidated
/// on namespace teardown. No automatic expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityContext {
    /// Tenant this context authorizes.
    pub project: ProjectRef,

    /// Function the context was created for.
    pub function: FunctionId,

    /// Namespace identifier derived from the tenant.
    pub namespace: String,

    /// Credential bundle scoped to the tenant.
    pub credentials: TenantCredentials,

    /// Copy of the tenant's permission set at creation time.
    pub permissions: HashSet<String>,

    /// Isolation policy in force.
    pub isolation: IsolationLevel,

    /// When the context was created.
    pub created_at: DateTime<Utc>,
}

impl SecurityContext {
    pub fn has_permission(&self, key: &str) -> bool {
        self.permissions.contains(key)
    }
}
