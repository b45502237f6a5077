//! Identity validation errors

use thiserror::Error;

/// Errors produced when constructing validated identifiers
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    #[error("Invalid project ref '{0}': must be 1-63 alphanumeric/'-'/'_' characters starting with an alphanumeric")]
    InvalidProjectRef(String),

    #[error("Function name must not be empty")]
    EmptyFunctionName,

    #[error("Resource name must not be empty")]
    EmptyResourceName,
}
