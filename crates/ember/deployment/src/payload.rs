//! Deployment payload preparation
//!
//! Reads the function's source and optional auxiliary files, then builds the
//! environment map the deployed code sees: tenant-scoped `KEY_<TENANT>`
//! entries layered over global `KEY` fallbacks.

use crate::error::{DeploymentError, Result};
use ember_types::{EnvMap, FunctionDescriptor, ProjectRef};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Auxiliary files picked up from the function directory when present.
const AUX_FILES: [&str; 3] = ["deno.json", ".env", "import_map.json"];

/// Everything handed to the transport for one function deploy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployPayload {
    /// Entrypoint source text.
    pub entrypoint_source: String,

    /// Auxiliary files by name (manifest, env file, import map).
    pub files: HashMap<String, String>,

    /// Environment visible to the deployed function: `KEY_<TENANT>` entries
    /// from the tenant's private map plus global `KEY` fallbacks.
    pub env: EnvMap,
}

impl DeployPayload {
    /// Read the entrypoint and any auxiliary files under `root`.
    ///
    /// A missing entrypoint is an error; missing auxiliary files are
    /// skipped.
    pub async fn load(descriptor: &FunctionDescriptor, root: &Path) -> Result<Self> {
        let entry_path = root.join(&descriptor.path);
        let entrypoint_source =
            tokio::fs::read_to_string(&entry_path)
                .await
                .map_err(|source| DeploymentError::SourceRead {
                    path: descriptor.path.clone(),
                    source,
                })?;

        let mut files = HashMap::new();
        let dir = root.join(descriptor.directory());
        for name in AUX_FILES {
            match tokio::fs::read_to_string(dir.join(name)).await {
                Ok(content) => {
                    files.insert(name.to_string(), content);
                }
                Err(_) => {
                    debug!(function = %descriptor.name, file = name, "auxiliary file absent, skipping");
                }
            }
        }

        Ok(Self {
            entrypoint_source,
            files,
            env: EnvMap::new(),
        })
    }

    /// Layer tenant-scoped entries over global fallbacks.
    pub fn with_env(mut self, project: &ProjectRef, tenant_env: &EnvMap, global_env: &EnvMap) -> Self {
        self.env = inject_env(project, tenant_env, global_env);
        self
    }
}

/// The `<TENANT>` suffix used for tenant-scoped environment keys.
pub fn env_suffix(project: &ProjectRef) -> String {
    project
        .as_str()
        .chars()
        .map(|c| if c == '-' { '_' } else { c.to_ascii_uppercase() })
        .collect()
}

/// Build the environment a deployed function resolves against: the global
/// map under bare keys, the tenant's private map under `KEY_<TENANT>`.
/// Lookup order in the deployed runtime is tenant-scoped first, then global.
pub fn inject_env(project: &ProjectRef, tenant_env: &EnvMap, global_env: &EnvMap) -> EnvMap {
    let suffix = env_suffix(project);
    let mut env = global_env.clone();
    for (key, value) in tenant_env {
        env.insert(format!("{key}_{suffix}"), value.clone());
    }
    env
}
