//! Ember deployment manager - Executes per-function deployments
//!
//! Wraps the external transport/control-plane collaborator with target
//! validation, tenant-scoped environment injection and bounded retries.
//! One `DeploymentResult` is produced per function regardless of outcome;
//! a failed function never aborts the surrounding batch.
//!
//! The transport itself is an opaque async trait; an in-memory
//! implementation is provided for development and testing.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod error;
pub mod manager;
pub mod payload;
pub mod transport;

// Re-exports
pub use error::{DeploymentError, Result};
pub use manager::{ConfigUpdate, DeployConfig, DeploymentManager, FunctionStatus, TargetValidation};
pub use payload::DeployPayload;
pub use transport::{
    DeployState, FunctionTransport, InMemoryTransport, RemoteDeployment, TransportError,
    TransportResult,
};
