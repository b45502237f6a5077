//! Permission keys and the default per-tenant grant

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Baseline permission every tenant needs before any function check passes.
pub const FUNCTION_ACCESS: &str = "function_access";

/// Resource classes a tenant can hold permissions on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Database,
    Storage,
    Auth,
    Api,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Storage => "storage",
            Self::Auth => "auth",
            Self::Api => "api",
        }
    }

    const ALL: [ResourceType; 4] = [Self::Database, Self::Storage, Self::Auth, Self::Api];
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operations checked against a tenant's permission set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Read,
    Write,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Permission key for one resource/operation pair, e.g. `database_read`.
pub fn permission_key(resource: ResourceType, operation: Operation) -> String {
    format!("{}_{}", resource, operation)
}

/// The fixed default grant seeded at tenant provisioning: function access
/// plus read/write on every resource class. Copied (not shared) into each
/// tenant's permission set; callers may override per tenant afterwards.
pub fn default_permissions() -> HashSet<String> {
    let mut set = HashSet::from([FUNCTION_ACCESS.to_string()]);
    for resource in ResourceType::ALL {
        set.insert(permission_key(resource, Operation::Read));
        set.insert(permission_key(resource, Operation::Write));
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_keys_compose() {
        assert_eq!(permission_key(ResourceType::Database, Operation::Read), "database_read");
        assert_eq!(permission_key(ResourceType::Api, Operation::Write), "api_write");
    }

    #[test]
    fn default_grant_covers_all_resources() {
        let set = default_permissions();
        assert!(set.contains(FUNCTION_ACCESS));
        assert_eq!(set.len(), 9);
        assert!(set.contains("storage_write"));
        assert!(set.contains("auth_read"));
    }
}
