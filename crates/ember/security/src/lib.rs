//! Ember security manager - Authoritative tenant boundary enforcement
//!
//! The single point where "is this access allowed" is decided and logged.
//! Built on namespace identity: every check reduces to comparing the tenant
//! embedded in a structured id against the requesting tenant, under a strict
//! default-deny isolation policy with no cross-tenant exceptions.
//!
//! Every denial is appended to a bounded, append-only audit log and emitted
//! as a structured `tracing` event; denied operations return `false`, they
//! never silently succeed and never panic on malformed input. Only API
//! misuse (requesting a security context that failed validation) surfaces as
//! an explicit error.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod context;
pub mod error;
pub mod manager;
pub mod permissions;
pub mod violation;

// Re-exports
pub use context::{IsolationLevel, SecurityContext, TenantCredentials};
pub use error::{Result, SecurityError};
pub use manager::{ResourceAccessRequest, SecurityConfig, SecurityManager};
pub use permissions::{Operation, ResourceType, FUNCTION_ACCESS};
pub use violation::{SecurityViolation, Severity, ViolationKind};
