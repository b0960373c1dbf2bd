use crate::types::{Account, Role};
use thiserror::Error;
use uuid::Uuid;

pub type CoreResult<T> = Result<T, CoreError>;

/// Domain error taxonomy. Every variant except `Internal` (and its `#[from]`
/// tails) is recoverable and reported back to the caller with a stable
/// machine-readable kind.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The reason is internal diagnostics only. It is never rendered into the
    /// client-facing message so a denied caller cannot tell a forbidden target
    /// from a missing one.
    #[error("Access denied")]
    Denied { reason: &'static str },

    #[error("Insufficient credits: {0}")]
    InsufficientCredits(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Invalid campaign state: {0}")]
    InvalidState(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    pub fn denied(reason: &'static str) -> Self {
        Self::Denied { reason }
    }

    /// Stable machine-readable error kind for API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::Denied { .. } => "denied",
            Self::InsufficientCredits(_) => "insufficient_credits",
            Self::InvalidTransition(_) => "invalid_transition",
            Self::InvalidState(_) => "invalid_state",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Serialization(_) | Self::Io(_) | Self::Internal(_) => "internal",
        }
    }
}

/// Error for a target account the actor cannot see. Admins learn the target
/// is missing; everyone else gets the same denial a forbidden target yields,
/// so a caller cannot tell a forbidden target from a missing one.
pub fn missing_account(actor: &Account, target_id: Uuid) -> CoreError {
    if actor.role == Role::Admin {
        CoreError::NotFound(format!("account {target_id}"))
    } else {
        CoreError::denied("target account does not exist or is not visible to this actor")
    }
}
