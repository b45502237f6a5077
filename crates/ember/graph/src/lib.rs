//! Ember dependency resolver - Safe, parallelizable deployment plans
//!
//! Turns a snapshot of discovered function descriptors into a deployment
//! order: a dependency-first sequence partitioned into batches that are safe
//! to deploy in parallel, plus the list of detected circular dependencies.
//!
//! The resolver is pure in-memory computation with no I/O. It never fails on
//! malformed input: unresolved dependency targets are dropped with a warning,
//! cycles are recorded and surfaced but do not abort ordering.
//!
//! The graph is an arena of nodes addressed by integer index with adjacency
//! lists of indices, rebuilt whole on every `build_graph` call.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod order;
pub mod path;
pub mod resolver;
pub mod validation;

// Re-exports
pub use order::{CircularDependency, CycleKind, DeploymentOrder};
pub use resolver::DependencyResolver;
pub use validation::GraphValidation;
