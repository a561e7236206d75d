use thiserror::Error;

use crate::actor_framework::{EntityId, FrameworkError};

pub type FarmResult<T> = Result<T, FarmError>;

/// Errors reported by every orchard operation.
///
/// The transport layer maps these to its own status codes; nothing in the
/// core retries on its own.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FarmError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: EntityId },
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    /// A storage actor stopped answering. Safe for the caller to retry.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl FarmError {
    pub fn not_found(entity: &'static str, id: EntityId) -> Self {
        FarmError::NotFound { entity, id }
    }
}

impl From<FrameworkError> for FarmError {
    fn from(err: FrameworkError) -> Self {
        match err {
            FrameworkError::NotFound { entity, id } => FarmError::NotFound { entity, id },
            FrameworkError::ActorClosed | FrameworkError::ActorDropped => {
                FarmError::Unavailable(err.to_string())
            }
        }
    }
}
