//! Error taxonomy shared by every service in the workspace.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TourError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("invite has expired")]
    InviteExpired,

    #[error("invite has already been used")]
    InviteAlreadyUsed,

    #[error("email does not match the invitation")]
    InviteEmailMismatch,

    #[error("incorrect password")]
    IncorrectPassword,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl TourError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type TourResult<T> = Result<T, TourError>;
