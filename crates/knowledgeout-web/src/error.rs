//! Error-to-response mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use knowledgeout_core::Error;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Web layer error type.
#[derive(Error, Debug)]
pub enum WebError {
    /// Business failure from the domain layer
    #[error(transparent)]
    Domain(#[from] Error),

    /// Server configuration problem (bad bind address etc.)
    #[error("configuration error: {0}")]
    Config(String),

    /// Socket-level failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WebError>;

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            WebError::Domain(err) => match err {
                Error::NotFound(c) => (StatusCode::NOT_FOUND, c.as_str(), c.message()),
                Error::Conflict(c) => (StatusCode::CONFLICT, c.as_str(), c.message()),
                Error::Forbidden(c) => (StatusCode::FORBIDDEN, c.as_str(), c.message()),
                Error::Validation(c) => (StatusCode::BAD_REQUEST, c.as_str(), c.message()),
                Error::Unauthorized(c) => (StatusCode::UNAUTHORIZED, c.as_str(), c.message()),
                Error::Storage(detail) => {
                    // Log the detail, leak nothing
                    error!(%detail, "storage failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "Internal server error",
                    )
                }
            },
            other => {
                error!(error = %other, "unexpected web error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error",
                )
            }
        };

        (status, Json(json!({ "code": code, "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledgeout_core::ErrorCode;

    #[test]
    fn statuses_follow_the_taxonomy() {
        let cases = [
            (Error::NotFound(ErrorCode::QuestionNotFound), 404),
            (Error::Conflict(ErrorCode::DuplicateEmail), 409),
            (Error::Forbidden(ErrorCode::AccessDenied), 403),
            (Error::Validation(ErrorCode::PasswordPolicyViolation), 400),
            (Error::Unauthorized(ErrorCode::LoginRequired), 401),
            (Error::Storage("secret detail".into()), 500),
        ];

        for (err, expected) in cases {
            let response = WebError::from(err).into_response();
            assert_eq!(response.status().as_u16(), expected);
        }
    }
}
