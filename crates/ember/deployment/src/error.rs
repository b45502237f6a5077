//! Deployment error types

use crate::transport::TransportError;
use thiserror::Error;

/// Deployment errors
///
/// These surface from payload preparation and transport plumbing; the
/// manager folds them into per-function `DeploymentResult`s rather than
/// letting them escape a batch run.
#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("Failed to read function source {path}: {source}")]
    SourceRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid function name '{0}'")]
    InvalidFunctionName(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for deployment operations
pub type Result<T> = std::result::Result<T, DeploymentError>;
