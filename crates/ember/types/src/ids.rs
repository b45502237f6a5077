//! Strongly-typed identifiers for tenants, functions and resources
//!
//! All tenant-scoped identity is structured: a `FunctionId` is a
//! `(ProjectRef, name)` pair, not a prefix-encoded string. The legacy
//! `ef_<ref>_<name>` rendering only exists for interop at the edges.

use crate::error::IdentityError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum accepted length for a project ref.
const MAX_PROJECT_REF_LEN: usize = 63;

/// Prefix used by the legacy namespaced function key.
const FUNCTION_KEY_PREFIX: &str = "ef_";

/// Validated tenant reference.
///
/// Accepted format: 1-63 ASCII alphanumeric, `-` or `_` characters,
/// starting with an alphanumeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectRef(String);

impl ProjectRef {
    /// Parse and validate a project ref.
    pub fn parse(raw: impl Into<String>) -> Result<Self, IdentityError> {
        let raw = raw.into();
        if Self::is_valid(&raw) {
            Ok(Self(raw))
        } else {
            Err(IdentityError::InvalidProjectRef(raw))
        }
    }

    /// Check the ref format without constructing one.
    pub fn is_valid(raw: &str) -> bool {
        if raw.is_empty() || raw.len() > MAX_PROJECT_REF_LEN {
            return false;
        }
        let mut chars = raw.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        if !first.is_ascii_alphanumeric() {
            return false;
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ProjectRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Structured per-tenant function identity.
///
/// Two tenants may both own a function named `foo`; their `FunctionId`s are
/// distinct because the tenant is part of the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionId {
    project: ProjectRef,
    name: String,
}

impl FunctionId {
    pub fn new(project: ProjectRef, name: impl Into<String>) -> Result<Self, IdentityError> {
        let name = name.into();
        if name.is_empty() {
            return Err(IdentityError::EmptyFunctionName);
        }
        Ok(Self { project, name })
    }

    /// Parse a legacy `ef_<ref>_<name>` key.
    ///
    /// The separator is ambiguous when the ref itself contains `_`; callers
    /// holding a structured id should pass it along instead of the key. This
    /// splits at the first `_` after the prefix, which round-trips for refs
    /// without underscores.
    pub fn parse_key(raw: &str) -> Option<Self> {
        let rest = raw.strip_prefix(FUNCTION_KEY_PREFIX)?;
        let (project, name) = rest.split_once('_')?;
        let project = ProjectRef::parse(project).ok()?;
        Self::new(project, name).ok()
    }

    /// The owning tenant.
    pub fn project(&self) -> &ProjectRef {
        &self.project
    }

    /// The bare function name within the tenant's scope.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this id belongs to the given tenant.
    pub fn belongs_to(&self, project: &ProjectRef) -> bool {
        &self.project == project
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}_{}", FUNCTION_KEY_PREFIX, self.project, self.name)
    }
}

/// Structured per-tenant resource identity (database, bucket, ...).
///
/// Rendered as `<ref>/<name>`; like `FunctionId`, the tenant is part of the
/// identity so cross-tenant checks never re-parse strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    project: ProjectRef,
    name: String,
}

impl ResourceId {
    pub fn new(project: ProjectRef, name: impl Into<String>) -> Result<Self, IdentityError> {
        let name = name.into();
        if name.is_empty() {
            return Err(IdentityError::EmptyResourceName);
        }
        Ok(Self { project, name })
    }

    /// Parse a `<ref>/<name>` resource key.
    pub fn parse_key(raw: &str) -> Option<Self> {
        let (project, name) = raw.split_once('/')?;
        let project = ProjectRef::parse(project).ok()?;
        Self::new(project, name).ok()
    }

    pub fn project(&self) -> &ProjectRef {
        &self.project
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_ref_accepts_valid_formats() {
        for raw in ["abc", "proj-1", "a1_b2", "X9"] {
            assert!(ProjectRef::parse(raw).is_ok(), "{raw} should parse");
        }
    }

    #[test]
    fn project_ref_rejects_invalid_formats() {
        for raw in ["", "-lead", "_lead", "has space", "dot.ted", &"x".repeat(64)] {
            assert!(ProjectRef::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn function_id_renders_legacy_key() {
        let project = ProjectRef::parse("t1").unwrap();
        let id = FunctionId::new(project, "hello").unwrap();
        assert_eq!(id.to_string(), "ef_t1_hello");
    }

    #[test]
    fn function_id_key_roundtrip() {
        let project = ProjectRef::parse("proj-a").unwrap();
        let id = FunctionId::new(project.clone(), "send-email").unwrap();
        let parsed = FunctionId::parse_key(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
        assert!(parsed.belongs_to(&project));
    }

    #[test]
    fn function_id_rejects_malformed_keys() {
        for raw in ["", "ef_", "ef_only", "wrong_t1_name", "ef__name"] {
            assert!(FunctionId::parse_key(raw).is_none(), "{raw} should not parse");
        }
    }

    #[test]
    fn same_name_different_tenants_are_distinct() {
        let a = FunctionId::new(ProjectRef::parse("t1").unwrap(), "foo").unwrap();
        let b = FunctionId::new(ProjectRef::parse("t2").unwrap(), "foo").unwrap();
        assert_ne!(a, b);
        assert_ne!(a.to_string(), b.to_string());
    }

    #[test]
    fn resource_id_key_roundtrip() {
        let id = ResourceId::new(ProjectRef::parse("t1").unwrap(), "orders").unwrap();
        assert_eq!(id.to_string(), "t1/orders");
        assert_eq!(ResourceId::parse_key("t1/orders").unwrap(), id);
        assert!(ResourceId::parse_key("no-slash").is_none());
    }
}
