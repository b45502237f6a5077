//! Per-function deployment outcomes

use crate::ids::ProjectRef;
use serde::{Deserialize, Serialize};

/// Outcome of deploying one function for one tenant.
///
/// Exactly one result is produced per function per run; results are never
/// merged or updated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentResult {
    /// Whether the deployment succeeded.
    pub success: bool,

    /// Bare function name.
    pub function_name: String,

    /// Owning tenant.
    pub project: ProjectRef,

    /// Control-plane deployment id, present on success.
    pub deployment_id: Option<String>,

    /// Public invocation URL, present on success.
    pub url: Option<String>,

    /// Failure description, present on failure.
    pub error: Option<String>,

    /// Non-fatal findings collected along the way.
    pub warnings: Vec<String>,
}

impl DeploymentResult {
    /// Build a success result.
    pub fn succeeded(
        function_name: impl Into<String>,
        project: ProjectRef,
        deployment_id: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            function_name: function_name.into(),
            project,
            deployment_id: Some(deployment_id.into()),
            url: Some(url.into()),
            error: None,
            warnings: Vec::new(),
        }
    }

    /// Build a failure result.
    pub fn failed(
        function_name: impl Into<String>,
        project: ProjectRef,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            function_name: function_name.into(),
            project,
            deployment_id: None,
            url: None,
            error: Some(error.into()),
            warnings: Vec::new(),
        }
    }

    /// Attach warnings collected during validation or payload preparation.
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_result_has_id_and_url() {
        let project = ProjectRef::parse("t1").unwrap();
        let result = DeploymentResult::succeeded("hello", project, "dep-1", "https://t1.example");
        assert!(result.success);
        assert_eq!(result.deployment_id.as_deref(), Some("dep-1"));
        assert!(result.error.is_none());
    }

    #[test]
    fn failure_result_embeds_error() {
        let project = ProjectRef::parse("t1").unwrap();
        let result = DeploymentResult::failed("hello", project, "transport unreachable")
            .with_warnings(vec!["reachability check skipped".into()]);
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("transport unreachable"));
        assert_eq!(result.warnings.len(), 1);
    }
}
