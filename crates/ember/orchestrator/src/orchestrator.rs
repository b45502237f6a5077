//! Orchestrator facade
//!
//! Sequences a deployment run: provision the tenant, plan batches from the
//! dependency resolver, then deploy batch by batch. Batches run strictly in
//! sequence; functions inside one batch run with bounded parallelism. One
//! failed function never aborts the batch or cancels its siblings.

use crate::report::DeploymentReport;
use ember_deployment::{DeployConfig, DeploymentManager, FunctionTransport};
use ember_graph::{DependencyResolver, DeploymentOrder, GraphValidation};
use ember_namespace::{NamespaceError, NamespaceManager};
use ember_security::{SecurityManager, SecurityViolation};
use ember_types::{DeploymentResult, FunctionDescriptor, FunctionId, FunctionInstance, ProjectRef};
use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum functions deployed concurrently within one batch.
    pub batch_parallelism: usize,
    /// Configuration handed to the deployment manager.
    pub deploy: DeployConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            batch_parallelism: 4,
            deploy: DeployConfig::default(),
        }
    }
}

/// Entry point over the core managers.
///
/// Owns the component wiring; every collaborator is constructor-injected
/// and shared by `Arc`, so a test harness can reach the same instances the
/// orchestrator uses.
pub struct Orchestrator {
    namespaces: Arc<NamespaceManager>,
    security: Arc<SecurityManager>,
    deployments: Arc<DeploymentManager>,
    resolver: RwLock<DependencyResolver>,
    batch_parallelism: usize,
}

impl Orchestrator {
    /// Wire the full stack over the given transport.
    pub fn new(transport: Arc<dyn FunctionTransport>, config: OrchestratorConfig) -> Self {
        let namespaces = Arc::new(NamespaceManager::new());
        let security = Arc::new(SecurityManager::new(namespaces.clone()));
        let deployments = Arc::new(DeploymentManager::new(
            transport,
            namespaces.clone(),
            security.clone(),
            config.deploy,
        ));
        Self {
            namespaces,
            security,
            deployments,
            resolver: RwLock::new(DependencyResolver::new()),
            batch_parallelism: config.batch_parallelism.max(1),
        }
    }

    pub fn namespaces(&self) -> &Arc<NamespaceManager> {
        &self.namespaces
    }

    pub fn security(&self) -> &Arc<SecurityManager> {
        &self.security
    }

    pub fn deployments(&self) -> &Arc<DeploymentManager> {
        &self.deployments
    }

    // --- Planning ---

    /// Rebuild the dependency graph from a fresh descriptor snapshot.
    pub fn build_graph(&self, descriptors: &[FunctionDescriptor]) {
        self.resolver.write().build_graph(descriptors);
    }

    /// Deployment plan for the current graph.
    pub fn calculate_deployment_order(&self) -> DeploymentOrder {
        self.resolver.read().calculate_deployment_order()
    }

    /// Consistency findings for the current graph.
    pub fn validate_dependency_graph(&self) -> GraphValidation {
        self.resolver.read().validate()
    }

    // --- Provisioning ---

    /// Register a descriptor snapshot under a tenant and seed its default
    /// permissions. Already-registered functions are skipped; the count of
    /// newly registered functions is returned.
    pub fn register_functions(
        &self,
        descriptors: &[FunctionDescriptor],
        project: &ProjectRef,
    ) -> usize {
        self.namespaces.create_project_namespace(project);
        self.security.initialize_project_permissions(project);

        let mut registered = 0;
        for descriptor in descriptors {
            let id = match FunctionId::new(project.clone(), &descriptor.name) {
                Ok(id) => id,
                Err(e) => {
                    warn!(function = %descriptor.name, error = %e, "skipping unregistrable function");
                    continue;
                }
            };
            match self
                .namespaces
                .register_function(FunctionInstance::new(id, descriptor.clone()))
            {
                Ok(_) => registered += 1,
                Err(NamespaceError::AlreadyRegistered(id)) => {
                    debug!(function = %id, "already registered");
                }
                Err(e) => {
                    warn!(function = %descriptor.name, error = %e, "registration failed");
                }
            }
        }
        registered
    }

    /// Tear down a tenant entirely: drops its cached security contexts and
    /// permissions, then removes its namespace. Returns whether a namespace
    /// existed.
    pub fn teardown_project(&self, project: &ProjectRef) -> bool {
        self.security.invalidate_project(project);
        let removed = self.namespaces.remove_project_namespace(project);
        if removed {
            info!(project = %project, "tore down project");
        }
        removed
    }

    // --- Deployment runs ---

    /// Deploy a descriptor snapshot for one tenant.
    ///
    /// Provisions the tenant, plans batches, then deploys batch by batch.
    /// Later batches do not start until every function of the earlier batch
    /// has finished, successfully or not. Detected cycles are surfaced on
    /// the report's order; the run still proceeds best-effort.
    #[instrument(skip(self, descriptors), fields(project = %project, functions = descriptors.len()))]
    pub async fn deploy_project(
        &self,
        descriptors: &[FunctionDescriptor],
        project: &ProjectRef,
    ) -> DeploymentReport {
        self.register_functions(descriptors, project);
        self.build_graph(descriptors);
        let order = self.calculate_deployment_order();
        if order.has_cycles() {
            warn!(cycles = order.cycles.len(), "deploying despite dependency cycles");
        }

        let by_path: HashMap<&str, &FunctionDescriptor> = descriptors
            .iter()
            .map(|d| (d.path.as_str(), d))
            .collect();

        let mut results: Vec<DeploymentResult> = Vec::with_capacity(order.len());
        for (index, batch) in order.batches.iter().enumerate() {
            debug!(batch = index + 1, size = batch.len(), "deploying batch");
            let batch_results: Vec<DeploymentResult> = stream::iter(
                batch
                    .iter()
                    .filter_map(|path| by_path.get(path.as_str()))
                    .map(|descriptor| self.deployments.deploy_function(descriptor, project)),
            )
            .buffer_unordered(self.batch_parallelism)
            .collect()
            .await;
            results.extend(batch_results);
        }

        let report = DeploymentReport::new(order, results);
        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "deployment run finished"
        );
        report
    }

    // --- Audit and health ---

    /// All retained security violations, oldest first.
    pub fn security_violations(&self) -> Vec<SecurityViolation> {
        self.security.violations()
    }

    /// Violations involving one tenant.
    pub fn project_violations(&self, project: &ProjectRef) -> Vec<SecurityViolation> {
        self.security.project_violations(project)
    }

    /// Internal-consistency findings across namespace and security state.
    pub fn validate(&self) -> Vec<String> {
        let mut findings = self.security.validate();
        findings.extend(
            self.validate_dependency_graph()
                .errors
                .into_iter()
                .map(|e| format!("dependency graph: {e}")),
        );
        findings
    }

    /// Drop all runtime state: graph, namespaces, permissions, contexts and
    /// the audit log.
    pub fn reset(&self) {
        *self.resolver.write() = DependencyResolver::new();
        self.security.reset();
        self.namespaces.reset();
    }
}
