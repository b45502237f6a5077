//! Namespace manager

use crate::error::{NamespaceError, Result};
use crate::namespace::ProjectNamespace;
use dashmap::DashMap;
use ember_types::{EnvMap, FunctionId, FunctionInstance, ProjectRef};
use tracing::{debug, info};

/// In-memory registry of per-tenant namespaces.
///
/// Constructed explicitly and injected where needed; lifecycle (create,
/// teardown, reset) belongs to the caller, typically the orchestrator entry
/// point or a test harness.
#[derive(Debug, Default)]
pub struct NamespaceManager {
    namespaces: DashMap<ProjectRef, ProjectNamespace>,
}

impl NamespaceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or return the id of) the namespace for a tenant. Idempotent.
    pub fn create_project_namespace(&self, project: &ProjectRef) -> String {
        let entry = self
            .namespaces
            .entry(project.clone())
            .or_insert_with(|| {
                info!(project = %project, "creating project namespace");
                ProjectNamespace::new(project.clone())
            });
        entry.namespace.clone()
    }

    /// Register a function instance under its owning tenant.
    ///
    /// The namespace is created on demand; registering the same id twice is
    /// a caller error. Identical bare names under different tenants are
    /// distinct registrations.
    pub fn register_function(&self, instance: FunctionInstance) -> Result<FunctionId> {
        let id = instance.id.clone();
        let project = id.project().clone();
        self.create_project_namespace(&project);

        let mut namespace = self
            .namespaces
            .get_mut(&project)
            .ok_or_else(|| NamespaceError::UnknownNamespace(project.clone()))?;
        if namespace.contains_function(&id) {
            return Err(NamespaceError::AlreadyRegistered(id));
        }
        namespace.insert_function(instance);
        debug!(function = %id, "registered function");
        Ok(id)
    }

    /// Remove a registered function instance.
    pub fn unregister_function(&self, id: &FunctionId) -> Option<FunctionInstance> {
        self.namespaces
            .get_mut(id.project())
            .and_then(|mut ns| ns.remove_function(id))
    }

    /// True only when the id's embedded tenant matches `project` exactly.
    pub fn validate_project_access(&self, id: &FunctionId, project: &ProjectRef) -> bool {
        id.belongs_to(project)
    }

    /// Whether the function is registered in its tenant's namespace.
    pub fn is_registered(&self, id: &FunctionId) -> bool {
        self.namespaces
            .get(id.project())
            .map(|ns| ns.contains_function(id))
            .unwrap_or(false)
    }

    /// Look up a registered instance.
    pub fn get_function(&self, id: &FunctionId) -> Option<FunctionInstance> {
        self.namespaces
            .get(id.project())
            .and_then(|ns| ns.function(id).cloned())
    }

    /// Only the given tenant's registered functions.
    pub fn list_project_functions(&self, project: &ProjectRef) -> Vec<FunctionInstance> {
        self.namespaces
            .get(project)
            .map(|ns| ns.functions().cloned().collect())
            .unwrap_or_default()
    }

    /// Merge environment variables into a tenant's private map.
    ///
    /// Each tenant's mapping is independent; colliding key names across
    /// tenants never interact.
    pub fn set_project_env(&self, project: &ProjectRef, vars: EnvMap) {
        self.create_project_namespace(project);
        if let Some(mut ns) = self.namespaces.get_mut(project) {
            ns.merge_env(vars);
        }
    }

    /// Snapshot of a tenant's environment map.
    pub fn project_env(&self, project: &ProjectRef) -> EnvMap {
        self.namespaces
            .get(project)
            .map(|ns| ns.env().clone())
            .unwrap_or_default()
    }

    /// Single environment variable lookup within one tenant's scope.
    pub fn env_var(&self, project: &ProjectRef, key: &str) -> Option<String> {
        self.namespaces
            .get(project)
            .and_then(|ns| ns.env().get(key).cloned())
    }

    /// Tear down a tenant's namespace entirely.
    ///
    /// Callers holding derived state (e.g. cached security contexts) must
    /// invalidate it when this returns true.
    pub fn remove_project_namespace(&self, project: &ProjectRef) -> bool {
        let removed = self.namespaces.remove(project).is_some();
        if removed {
            info!(project = %project, "removed project namespace");
        }
        removed
    }

    /// All tenants with a namespace.
    pub fn projects(&self) -> Vec<ProjectRef> {
        self.namespaces.iter().map(|ns| ns.key().clone()).collect()
    }

    pub fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }

    /// Internal-consistency health check: every stored instance must carry
    /// the id of the namespace holding it. Returns findings, empty when
    /// healthy.
    pub fn validate(&self) -> Vec<String> {
        let mut findings = Vec::new();
        for ns in self.namespaces.iter() {
            for id in ns.foreign_ids() {
                findings.push(format!(
                    "namespace {} holds function {} belonging to {}",
                    ns.namespace,
                    id,
                    id.project()
                ));
            }
        }
        findings
    }

    /// Drop all namespaces (test-harness reset).
    pub fn reset(&self) {
        self.namespaces.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_types::FunctionDescriptor;

    fn project(raw: &str) -> ProjectRef {
        ProjectRef::parse(raw).unwrap()
    }

    fn instance(project_ref: &str, name: &str) -> FunctionInstance {
        let id = FunctionId::new(project(project_ref), name).unwrap();
        let descriptor =
            FunctionDescriptor::new(name, format!("functions/{name}/index.ts"), name);
        FunctionInstance::new(id, descriptor)
    }

    #[test]
    fn namespace_creation_is_idempotent() {
        let manager = NamespaceManager::new();
        let first = manager.create_project_namespace(&project("t1"));
        let second = manager.create_project_namespace(&project("t1"));
        assert_eq!(first, second);
        assert_eq!(manager.namespace_count(), 1);
    }

    #[test]
    fn same_name_registers_under_both_tenants() {
        let manager = NamespaceManager::new();
        let id1 = manager.register_function(instance("t1", "foo")).unwrap();
        let id2 = manager.register_function(instance("t2", "foo")).unwrap();

        assert_ne!(id1, id2);
        assert!(manager.validate_project_access(&id1, &project("t1")));
        assert!(!manager.validate_project_access(&id1, &project("t2")));
        assert_eq!(manager.list_project_functions(&project("t1")).len(), 1);
        assert_eq!(manager.list_project_functions(&project("t2")).len(), 1);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let manager = NamespaceManager::new();
        manager.register_function(instance("t1", "foo")).unwrap();
        let err = manager.register_function(instance("t1", "foo")).unwrap_err();
        assert!(matches!(err, NamespaceError::AlreadyRegistered(_)));
    }

    #[test]
    fn env_maps_are_isolated_per_tenant() {
        let manager = NamespaceManager::new();
        manager.set_project_env(
            &project("t1"),
            EnvMap::from([("API_KEY".into(), "one".into())]),
        );
        manager.set_project_env(
            &project("t2"),
            EnvMap::from([("API_KEY".into(), "two".into())]),
        );

        assert_eq!(manager.env_var(&project("t1"), "API_KEY").as_deref(), Some("one"));
        assert_eq!(manager.env_var(&project("t2"), "API_KEY").as_deref(), Some("two"));
        assert!(manager.env_var(&project("t3"), "API_KEY").is_none());
    }

    #[test]
    fn set_env_merges_rather_than_replaces() {
        let manager = NamespaceManager::new();
        let p = project("t1");
        manager.set_project_env(&p, EnvMap::from([("A".into(), "1".into())]));
        manager.set_project_env(&p, EnvMap::from([("B".into(), "2".into())]));

        let env = manager.project_env(&p);
        assert_eq!(env.len(), 2);
        assert_eq!(env.get("A").map(String::as_str), Some("1"));
    }

    #[test]
    fn teardown_removes_functions_and_env() {
        let manager = NamespaceManager::new();
        let p = project("t1");
        manager.register_function(instance("t1", "foo")).unwrap();
        manager.set_project_env(&p, EnvMap::from([("A".into(), "1".into())]));

        assert!(manager.remove_project_namespace(&p));
        assert!(!manager.remove_project_namespace(&p));
        assert!(manager.list_project_functions(&p).is_empty());
        assert!(manager.project_env(&p).is_empty());
    }

    #[test]
    fn validate_reports_healthy_manager() {
        let manager = NamespaceManager::new();
        manager.register_function(instance("t1", "foo")).unwrap();
        manager.register_function(instance("t2", "bar")).unwrap();
        assert!(manager.validate().is_empty());
    }
}
