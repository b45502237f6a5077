//! Transport seam to the hosting control plane

use crate::payload::DeployPayload;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use ember_types::ProjectRef;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Transport errors
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Control plane unreachable: {0}")]
    Unreachable(String),

    #[error("Deployment rejected: {0}")]
    Rejected(String),

    #[error("Control plane error: {0}")]
    ControlPlane(String),
}

/// Result type for transport calls
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Successful upload acknowledged by the control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteDeployment {
    pub deployment_id: String,
    /// URL as reported by the control plane, when it reports one; the
    /// manager computes the canonical public URL itself.
    pub url: Option<String>,
}

/// Remote deployment state of one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployState {
    Deployed,
    Failed,
    Pending,
    NotFound,
}

/// The external deploy/status collaborator.
///
/// Implementations perform the actual network calls; everything here may
/// suspend. The deployment manager wraps each call in its configured
/// timeout, so implementations need not enforce their own.
#[async_trait]
pub trait FunctionTransport: Send + Sync {
    /// Upload one function's payload for a tenant.
    async fn deploy(
        &self,
        project: &ProjectRef,
        function_name: &str,
        payload: &DeployPayload,
    ) -> TransportResult<RemoteDeployment>;

    /// Query the remote state of one function.
    async fn get_status(
        &self,
        project: &ProjectRef,
        function_name: &str,
    ) -> TransportResult<(DeployState, Option<DateTime<Utc>>)>;

    /// Whether the tenant exists/is reachable on the control plane.
    async fn project_exists(&self, project: &ProjectRef) -> TransportResult<bool>;
}

/// In-memory transport for development and testing.
///
/// Tracks deployed functions per tenant; tenants must be added before they
/// are considered reachable.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    projects: DashSet<ProjectRef>,
    deployed: DashMap<(ProjectRef, String), (String, DateTime<Utc>)>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a tenant known to the fake control plane.
    pub fn add_project(&self, project: ProjectRef) {
        self.projects.insert(project);
    }

    /// Number of successful deploys recorded.
    pub fn deployed_count(&self) -> usize {
        self.deployed.len()
    }
}

#[async_trait]
impl FunctionTransport for InMemoryTransport {
    async fn deploy(
        &self,
        project: &ProjectRef,
        function_name: &str,
        _payload: &DeployPayload,
    ) -> TransportResult<RemoteDeployment> {
        if !self.projects.contains(project) {
            return Err(TransportError::Rejected(format!(
                "unknown project {project}"
            )));
        }
        let deployment_id = Uuid::new_v4().to_string();
        self.deployed.insert(
            (project.clone(), function_name.to_string()),
            (deployment_id.clone(), Utc::now()),
        );
        Ok(RemoteDeployment {
            deployment_id,
            url: None,
        })
    }

    async fn get_status(
        &self,
        project: &ProjectRef,
        function_name: &str,
    ) -> TransportResult<(DeployState, Option<DateTime<Utc>>)> {
        match self
            .deployed
            .get(&(project.clone(), function_name.to_string()))
        {
            Some(record) => Ok((DeployState::Deployed, Some(record.1))),
            None => Ok((DeployState::NotFound, None)),
        }
    }

    async fn project_exists(&self, project: &ProjectRef) -> TransportResult<bool> {
        Ok(self.projects.contains(project))
    }
}
