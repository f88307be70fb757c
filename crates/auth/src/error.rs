//! Authentication error types.

use thiserror::Error;
use tour::error::TourError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password must not be empty")]
    EmptyPassword,

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error("{what} lifetime of {secs}s is out of range")]
    LifetimeOutOfRange { what: &'static str, secs: u64 },
}

impl From<AuthError> for TourError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmptyPassword => TourError::validation(err.to_string()),
            AuthError::Crypto(msg) => TourError::Internal(msg),
            AuthError::LifetimeOutOfRange { .. } => TourError::Internal(err.to_string()),
        }
    }
}
