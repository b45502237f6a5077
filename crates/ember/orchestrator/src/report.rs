//! Aggregate deployment reports

use ember_graph::DeploymentOrder;
use ember_types::DeploymentResult;
use serde::{Deserialize, Serialize};

/// Outcome of one full deployment run.
///
/// Carries the plan the run executed against, one result per function, and
/// the aggregate counts. Cycles detected while planning are reachable
/// through the embedded order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentReport {
    /// The plan this run executed.
    pub order: DeploymentOrder,

    /// One result per planned function, in completion order.
    pub results: Vec<DeploymentResult>,

    /// Number of successful deployments.
    pub succeeded: usize,

    /// Number of failed deployments.
    pub failed: usize,
}

impl DeploymentReport {
    pub fn new(order: DeploymentOrder, results: Vec<DeploymentResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        let failed = results.len() - succeeded;
        Self {
            order,
            results,
            succeeded,
            failed,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Result for one function by bare name, if it was part of the run.
    pub fn result_for(&self, function_name: &str) -> Option<&DeploymentResult> {
        self.results.iter().find(|r| r.function_name == function_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_types::ProjectRef;

    #[test]
    fn counts_follow_results() {
        let project = ProjectRef::parse("t1").unwrap();
        let order = DeploymentOrder {
            functions: vec!["functions/a/index.ts".into(), "functions/b/index.ts".into()],
            batches: vec![vec![
                "functions/a/index.ts".into(),
                "functions/b/index.ts".into(),
            ]],
            cycles: Vec::new(),
        };
        let report = DeploymentReport::new(
            order,
            vec![
                DeploymentResult::succeeded("a", project.clone(), "dep-1", "https://x"),
                DeploymentResult::failed("b", project, "boom"),
            ],
        );

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert!(!report.all_succeeded());
        assert!(report.result_for("b").is_some());
        assert!(report.result_for("c").is_none());
    }
}
