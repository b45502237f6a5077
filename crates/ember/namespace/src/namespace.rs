//! Per-tenant namespace record

use ember_types::{EnvMap, FunctionId, FunctionInstance, ProjectRef};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One tenant's isolated slice of the platform.
///
/// Holds the tenant's registered function instances and its private
/// environment map. Nothing in here is shared across tenants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectNamespace {
    /// Owning tenant.
    pub project: ProjectRef,

    /// Namespace identifier derived from the tenant ref.
    pub namespace: String,

    functions: HashMap<FunctionId, FunctionInstance>,
    env: EnvMap,
}

impl ProjectNamespace {
    pub fn new(project: ProjectRef) -> Self {
        let namespace = format!("ns_{}", project);
        Self {
            project,
            namespace,
            functions: HashMap::new(),
            env: EnvMap::new(),
        }
    }

    pub fn contains_function(&self, id: &FunctionId) -> bool {
        self.functions.contains_key(id)
    }

    pub fn function(&self, id: &FunctionId) -> Option<&FunctionInstance> {
        self.functions.get(id)
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionInstance> {
        self.functions.values()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub(crate) fn insert_function(&mut self, instance: FunctionInstance) {
        self.functions.insert(instance.id.clone(), instance);
    }

    pub(crate) fn remove_function(&mut self, id: &FunctionId) -> Option<FunctionInstance> {
        self.functions.remove(id)
    }

    pub fn env(&self) -> &EnvMap {
        &self.env
    }

    pub(crate) fn merge_env(&mut self, vars: EnvMap) {
        self.env.extend(vars);
    }

    /// Ids whose embedded tenant does not match this namespace; always empty
    /// unless the manager's invariants were violated.
    pub fn foreign_ids(&self) -> Vec<FunctionId> {
        self.functions
            .keys()
            .filter(|id| !id.belongs_to(&self.project))
            .cloned()
            .collect()
    }
}
