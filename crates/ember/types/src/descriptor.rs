//! Function descriptors and registered instances

use crate::ids::FunctionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable snapshot of one discovered function.
///
/// Produced by the external discovery scanner once per run; the orchestrator
/// never mutates descriptors, it rebuilds its view from a fresh scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    /// Stable identity assigned at scan time.
    pub id: Uuid,

    /// Bare function name (unique within one scan set).
    pub name: String,

    /// Canonical path of the function entrypoint within the scan root.
    pub path: String,

    /// Path relative to the functions root; used in public URLs.
    pub relative_path: String,

    /// Declared dependency targets: paths of other functions this one calls.
    /// May contain relative segments and references to functions outside the
    /// scan set; the resolver normalizes and filters them.
    pub dependencies: Vec<String>,
}

impl FunctionDescriptor {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        relative_path: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            path: path.into(),
            relative_path: relative_path.into(),
            dependencies: Vec::new(),
        }
    }

    /// Attach declared dependency targets.
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Directory containing the entrypoint, used to resolve relative
    /// dependency targets and locate auxiliary files.
    pub fn directory(&self) -> &str {
        match self.path.rfind('/') {
            Some(idx) => &self.path[..idx],
            None => "",
        }
    }
}

/// A function registered inside one tenant's namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionInstance {
    /// Tenant-scoped identity.
    pub id: FunctionId,

    /// The descriptor this instance was registered from.
    pub descriptor: FunctionDescriptor,

    /// When the instance was registered.
    pub registered_at: DateTime<Utc>,
}

impl FunctionInstance {
    pub fn new(id: FunctionId, descriptor: FunctionDescriptor) -> Self {
        Self {
            id,
            descriptor,
            registered_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ProjectRef;

    #[test]
    fn descriptor_directory() {
        let d = FunctionDescriptor::new("hello", "functions/hello/index.ts", "hello");
        assert_eq!(d.directory(), "functions/hello");

        let flat = FunctionDescriptor::new("top", "index.ts", "top");
        assert_eq!(flat.directory(), "");
    }

    #[test]
    fn instance_carries_tenant_identity() {
        let project = ProjectRef::parse("t1").unwrap();
        let id = FunctionId::new(project.clone(), "hello").unwrap();
        let descriptor = FunctionDescriptor::new("hello", "functions/hello/index.ts", "hello");
        let instance = FunctionInstance::new(id, descriptor);
        assert!(instance.id.belongs_to(&project));
    }
}
