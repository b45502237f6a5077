//! Security error types

use ember_types::{FunctionId, ProjectRef};
use thiserror::Error;

/// Security manager errors.
///
/// Denied runtime checks return `false` rather than erroring; these variants
/// cover caller misuse of the API.
#[derive(Debug, Clone, Error)]
pub enum SecurityError {
    #[error("Access denied: {function} is not accessible by project {project}")]
    AccessDenied {
        function: FunctionId,
        project: ProjectRef,
    },
}

/// Result type for security operations
pub type Result<T> = std::result::Result<T, SecurityError>;
