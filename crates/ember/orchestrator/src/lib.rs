//! Ember orchestrator - Batch-sequencing deployment facade
//!
//! Wires the dependency resolver, namespace manager, security manager and
//! deployment manager into one entry point. A deployment run provisions the
//! tenant, plans dependency-ordered batches, deploys them strictly in
//! sequence with bounded in-batch parallelism, and aggregates one result
//! per function into a `DeploymentReport`.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod orchestrator;
pub mod report;

// Re-exports
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use report::DeploymentReport;
