//! Ember namespace manager - Per-tenant partitioning of functions and env
//!
//! Every tenant ("project") gets its own namespace: a registry of function
//! instances keyed by structured `FunctionId` and a private environment map.
//! Two tenants may register functions with identical bare names; their ids
//! and environment mappings never collide, even when key names do.
//!
//! All operations are pure in-memory computation with no suspension points;
//! the backing maps are concurrent so the manager can be shared behind an
//! `Arc` without extra locking.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod error;
pub mod manager;
pub mod namespace;

// Re-exports
pub use error::{NamespaceError, Result};
pub use manager::NamespaceManager;
pub use namespace::ProjectNamespace;
