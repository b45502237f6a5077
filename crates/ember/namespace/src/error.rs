//! Namespace error types

use ember_types::{FunctionId, ProjectRef};
use thiserror::Error;

/// Namespace manager errors
#[derive(Debug, Clone, Error)]
pub enum NamespaceError {
    #[error("Function already registered: {0}")]
    AlreadyRegistered(FunctionId),

    #[error("No namespace for project: {0}")]
    UnknownNamespace(ProjectRef),
}

/// Result type for namespace operations
pub type Result<T> = std::result::Result<T, NamespaceError>;
