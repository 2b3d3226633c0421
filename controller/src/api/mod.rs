pub mod external;
pub mod handler;
pub mod types;

use definition::pod::ValidationError;
use std::fmt::{Display, Formatter, Result};
use thiserror::Error;

/// Mutating operations driven against both the cluster and the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crud {
    Create,
    Update,
    Delete,
}

impl Display for Crud {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            Crud::Create => write!(f, "create"),
            Crud::Update => write!(f, "update"),
            Crud::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Invalid pod: {0}")]
    Validation(String),

    #[error("Pod {0} already exists")]
    AlreadyExists(String),

    #[error("Pod {0} not found")]
    NotFound(String),

    #[error("Pod name {0} is already registered")]
    DuplicateName(String),

    #[error("Registry constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Cluster unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Cluster rejected the request: {0}")]
    BackendRejected(String),

    #[error("Pod {pod} diverged during {operation}, the cluster was changed but the registry was not: {source}")]
    Divergence {
        operation: Crud,
        pod: String,
        #[source]
        source: Box<ControllerError>,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Parsing error: {0}")]
    Parsing(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ValidationError> for ControllerError {
    fn from(error: ValidationError) -> Self {
        ControllerError::Validation(error.to_string())
    }
}

impl ControllerError {
    /// HTTP status returned to the caller for this failure
    pub fn status_code(&self) -> u16 {
        match self {
            ControllerError::Validation(_) | ControllerError::Parsing(_) => 400,
            ControllerError::NotFound(_) => 404,
            ControllerError::AlreadyExists(_)
            | ControllerError::DuplicateName(_)
            | ControllerError::ConstraintViolation(_) => 409,
            ControllerError::BackendRejected(_) => 502,
            ControllerError::BackendUnavailable(_) => 503,
            ControllerError::Divergence { .. }
            | ControllerError::Database(_)
            | ControllerError::Io(_) => 500,
        }
    }
}
