//! Ember core types - Shared data model for the deployment orchestrator
//!
//! This crate defines the identifiers and records that flow between the
//! dependency resolver, namespace manager, security manager and deployment
//! manager:
//!
//! - **ProjectRef**: validated tenant reference
//! - **FunctionId**: structured per-tenant function identity
//! - **FunctionDescriptor**: immutable output of the discovery scanner
//! - **DeploymentResult**: per-function outcome of one deployment run
//!
//! Tenant identity is carried as a structured `FunctionId` end-to-end rather
//! than re-parsed out of composite strings; the legacy `ef_<ref>_<name>` key
//! is only rendered/parsed at process boundaries.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod descriptor;
pub mod error;
pub mod ids;
pub mod result;

// Re-exports
pub use descriptor::{FunctionDescriptor, FunctionInstance};
pub use error::IdentityError;
pub use ids::{FunctionId, ProjectRef, ResourceId};
pub use result::DeploymentResult;

/// Environment variable mapping, always scoped to a single tenant.
pub type EnvMap = std::collections::HashMap<String, String>;
