//! HTTP mapping of the shared error taxonomy.
//!
//! Every failure leaves the server as `{"error": {"message", "code"}}` with a
//! status derived from the error kind. Storage and internal failures are
//! logged and reported with a generic message.

use auth::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tour::TourError;
use tracing::error;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    /// Seconds until the client may retry; set on rate limiting only.
    pub retry_after: Option<u64>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_failed", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthenticated", message)
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            retry_after: Some(retry_after),
            ..Self::new(
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Too many requests, please try again later",
            )
        }
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "Internal server error",
        )
    }
}

impl From<TourError> for ApiError {
    fn from(err: TourError) -> Self {
        match err {
            TourError::Unauthenticated => Self::unauthenticated("Authentication required"),
            TourError::Forbidden { reason } => {
                Self::new(StatusCode::FORBIDDEN, "forbidden", reason)
            }
            TourError::NotFound { entity, .. } => {
                Self::not_found(format!("{} not found", capitalize(entity)))
            }
            TourError::Conflict { message } => Self::new(StatusCode::CONFLICT, "conflict", message),
            TourError::Validation { message } => Self::bad_request(message),
            TourError::InviteExpired => Self::new(
                StatusCode::BAD_REQUEST,
                "expired",
                "This invite has expired",
            ),
            TourError::InviteAlreadyUsed => Self::new(
                StatusCode::BAD_REQUEST,
                "already_used",
                "This invite has already been used",
            ),
            TourError::InviteEmailMismatch => Self::new(
                StatusCode::BAD_REQUEST,
                "email_mismatch",
                "Email does not match the invitation",
            ),
            TourError::IncorrectPassword => Self::new(
                StatusCode::UNAUTHORIZED,
                "incorrect_password",
                "Incorrect password",
            ),
            TourError::Storage(detail) | TourError::Internal(detail) => {
                error!(error = %detail, "request failed");
                Self::internal()
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        TourError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut error = json!({
            "message": self.message,
            "code": self.code,
        });
        if let Some(retry_after) = self.retry_after {
            error["retryAfter"] = json!(retry_after);
        }
        let mut response = (self.status, Json(json!({ "error": error }))).into_response();
        if let Some(retry_after) = self.retry_after {
            if let Ok(value) = retry_after.to_string().parse() {
                response
                    .headers_mut()
                    .insert(http::header::RETRY_AFTER, value);
            }
        }
        response
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
