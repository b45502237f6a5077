//! Deployment Manager - Per-function deployment execution
//!
//! The DeploymentManager validates the target tenant, prepares the payload
//! with tenant-scoped environment, and drives the transport with bounded
//! retries. Failures are folded into `DeploymentResult`s; nothing in here
//! aborts a batch run.

use crate::payload::{env_suffix, DeployPayload};
use crate::transport::{DeployState, FunctionTransport};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use ember_namespace::NamespaceManager;
use ember_security::SecurityManager;
use ember_types::{DeploymentResult, EnvMap, FunctionDescriptor, FunctionId, ProjectRef};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{info, instrument, warn};

/// Deployment manager configuration
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Additional transport attempts after the first failure.
    pub max_retries: u32,
    /// Delay between attempts.
    pub retry_delay: Duration,
    /// Timeout applied to each individual transport attempt; exceeding it is
    /// a transient failure eligible for retry.
    pub attempt_timeout: Duration,
    /// Domain used for computed public URLs.
    pub platform_domain: String,
    /// Root the scanner's function paths are relative to.
    pub functions_root: PathBuf,
    /// Secrets that must be present (tenant-scoped or global) before any
    /// transport attempt.
    pub required_secrets: Vec<String>,
    /// Platform-level environment fallbacks shared by all tenants.
    pub global_env: EnvMap,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            attempt_timeout: Duration::from_secs(30),
            platform_domain: "functions.ember.dev".to_string(),
            functions_root: PathBuf::from("."),
            required_secrets: vec!["SERVICE_ROLE_KEY".to_string()],
            global_env: EnvMap::new(),
        }
    }
}

/// Outcome of validating a deployment target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Status snapshot of one remote function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionStatus {
    pub status: DeployState,
    pub last_deployed: Option<DateTime<Utc>>,
}

/// Best-effort per-tenant configuration patch.
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    /// New API endpoint; must embed the tenant ref.
    pub api_endpoint: Option<String>,
    /// Environment entries to merge into the tenant's private map.
    pub env: Option<EnvMap>,
}

/// Executes deployments for one platform against an injected transport.
pub struct DeploymentManager {
    transport: Arc<dyn FunctionTransport>,
    namespaces: Arc<NamespaceManager>,
    security: Arc<SecurityManager>,
    config: DeployConfig,
    api_endpoints: DashMap<ProjectRef, String>,
}

impl DeploymentManager {
    pub fn new(
        transport: Arc<dyn FunctionTransport>,
        namespaces: Arc<NamespaceManager>,
        security: Arc<SecurityManager>,
        config: DeployConfig,
    ) -> Self {
        Self {
            transport,
            namespaces,
            security,
            config,
            api_endpoints: DashMap::new(),
        }
    }

    /// Deploy one function for one tenant.
    ///
    /// Validation failures short-circuit before any transport attempt; the
    /// transport is then tried up to `1 + max_retries` times with the
    /// configured delay, each attempt under the configured timeout. The
    /// returned result is the only record of the outcome.
    #[instrument(skip(self, descriptor), fields(function = %descriptor.name, project = %project))]
    pub async fn deploy_function(
        &self,
        descriptor: &FunctionDescriptor,
        project: &ProjectRef,
    ) -> DeploymentResult {
        let validation = self.validate_deployment_target(project).await;
        if !validation.is_valid {
            return DeploymentResult::failed(
                &descriptor.name,
                project.clone(),
                format!("target validation failed: {}", validation.errors.join("; ")),
            )
            .with_warnings(validation.warnings);
        }

        let function = match FunctionId::new(project.clone(), &descriptor.name) {
            Ok(id) => id,
            Err(e) => {
                return DeploymentResult::failed(&descriptor.name, project.clone(), e.to_string())
                    .with_warnings(validation.warnings);
            }
        };
        if !self.security.validate_project_access(&function, project) {
            return DeploymentResult::failed(
                &descriptor.name,
                project.clone(),
                format!("access denied for {function}"),
            )
            .with_warnings(validation.warnings);
        }

        let payload = match DeployPayload::load(descriptor, &self.config.functions_root).await {
            Ok(payload) => payload.with_env(
                project,
                &self.namespaces.project_env(project),
                &self.config.global_env,
            ),
            Err(e) => {
                return DeploymentResult::failed(&descriptor.name, project.clone(), e.to_string())
                    .with_warnings(validation.warnings);
            }
        };

        let attempts = self.config.max_retries + 1;
        let mut last_error = String::new();
        for attempt in 1..=attempts {
            let call = self
                .transport
                .deploy(project, &descriptor.name, &payload);
            match timeout(self.config.attempt_timeout, call).await {
                Ok(Ok(remote)) => {
                    let url = self.public_url(project, &descriptor.relative_path);
                    info!(
                        deployment_id = %remote.deployment_id,
                        attempt,
                        "function deployed"
                    );
                    return DeploymentResult::succeeded(
                        &descriptor.name,
                        project.clone(),
                        remote.deployment_id,
                        url,
                    )
                    .with_warnings(validation.warnings);
                }
                Ok(Err(e)) => {
                    warn!(attempt, error = %e, "deploy attempt failed");
                    last_error = e.to_string();
                }
                Err(_) => {
                    warn!(attempt, "deploy attempt timed out");
                    last_error = format!(
                        "attempt timed out after {}ms",
                        self.config.attempt_timeout.as_millis()
                    );
                }
            }
            if attempt < attempts {
                sleep(self.config.retry_delay).await;
            }
        }

        DeploymentResult::failed(
            &descriptor.name,
            project.clone(),
            format!("deployment failed after {attempts} attempts: {last_error}"),
        )
        .with_warnings(validation.warnings)
    }

    /// Validate a tenant as a deployment target: reachability (best-effort)
    /// and required secrets. Missing secrets are errors; a failed
    /// reachability check only warns.
    pub async fn validate_deployment_target(&self, project: &ProjectRef) -> TargetValidation {
        let mut validation = TargetValidation {
            is_valid: true,
            ..Default::default()
        };

        match self.transport.project_exists(project).await {
            Ok(true) => {}
            Ok(false) => {
                validation
                    .errors
                    .push(format!("project {project} not found on control plane"));
            }
            Err(e) => {
                validation
                    .warnings
                    .push(format!("reachability check failed: {e}"));
            }
        }

        let suffix = env_suffix(project);
        for secret in &self.config.required_secrets {
            let tenant_scoped = self.namespaces.env_var(project, secret).is_some()
                || self.config.global_env.contains_key(&format!("{secret}_{suffix}"));
            let global = self.config.global_env.contains_key(secret);
            if !tenant_scoped && !global {
                validation
                    .errors
                    .push(format!("required secret {secret} missing for {project}"));
            }
        }

        validation.is_valid = validation.errors.is_empty();
        validation
    }

    /// Validate a raw tenant ref before it ever becomes a `ProjectRef`.
    /// Format failures fail fast with no reachability or secret checks.
    pub async fn validate_raw_target(&self, raw: &str) -> TargetValidation {
        match ProjectRef::parse(raw) {
            Ok(project) => self.validate_deployment_target(&project).await,
            Err(e) => TargetValidation {
                is_valid: false,
                errors: vec![e.to_string()],
                warnings: Vec::new(),
            },
        }
    }

    /// Remote status of one function; query failures degrade to `NotFound`.
    pub async fn get_deployment_status(
        &self,
        project: &ProjectRef,
        function_name: &str,
    ) -> FunctionStatus {
        match self.transport.get_status(project, function_name).await {
            Ok((status, last_deployed)) => FunctionStatus {
                status,
                last_deployed,
            },
            Err(e) => {
                warn!(project = %project, function = function_name, error = %e, "status query failed");
                FunctionStatus {
                    status: DeployState::NotFound,
                    last_deployed: None,
                }
            }
        }
    }

    /// Best-effort configuration patch. Rejects an API endpoint that does
    /// not embed the tenant ref; returns whether the patch was applied.
    pub fn update_deployment_config(&self, project: &ProjectRef, updates: ConfigUpdate) -> bool {
        if let Some(endpoint) = &updates.api_endpoint {
            if !endpoint.contains(project.as_str()) {
                warn!(project = %project, endpoint = %endpoint, "rejecting endpoint without tenant ref");
                return false;
            }
        }

        if let Some(endpoint) = updates.api_endpoint {
            self.api_endpoints.insert(project.clone(), endpoint);
        }
        if let Some(env) = updates.env {
            self.namespaces.set_project_env(project, env);
        }
        true
    }

    /// The configured API endpoint override for a tenant, if any.
    pub fn api_endpoint(&self, project: &ProjectRef) -> Option<String> {
        self.api_endpoints.get(project).map(|e| e.clone())
    }

    /// Public invocation URL for a deployed function.
    pub fn public_url(&self, project: &ProjectRef, relative_path: &str) -> String {
        format!(
            "https://{}.{}/functions/v1/{}",
            project, self.config.platform_domain, relative_path
        )
    }
}
