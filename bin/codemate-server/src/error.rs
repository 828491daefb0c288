//! Unified server error type.
//!
//! Handlers return `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so failures become a short plain-text
//! page with an appropriate status code.
//!
//! Internal errors (database, templates) are logged with full detail but only
//! a generic message reaches the browser.
//!
//! Completion API failures are not represented here: the assist handlers
//! render them inside the normal page.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;

/// All errors that can occur in the codemate-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Propagated from the SQLite store.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A template failed to render.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// The caller referenced a resource that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            ServerError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::Database(e) => {
                error!(error = %e, "database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
            }
            ServerError::Template(e) => {
                error!(error = ?e, "template error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
            }
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
            }
        };
        (status, client_message).into_response()
    }
}

impl From<AuthError> for ServerError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Database(e) => ServerError::Database(e),
            taken @ AuthError::UsernameTaken => ServerError::BadRequest(taken.to_string()),
            other @ (AuthError::PasswordHash(_) | AuthError::SessionTtl(_)) => {
                ServerError::Internal(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn not_found_keeps_message() {
        let resp = ServerError::NotFound("record 'x' not found".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_errors_are_500() {
        let resp = ServerError::Internal("boom".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let resp = ServerError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn auth_failures_outside_the_users_control_are_internal() {
        let err: ServerError = AuthError::PasswordHash("bad salt".into()).into();
        assert!(matches!(err, ServerError::Internal(_)));
        let err: ServerError = AuthError::SessionTtl(chrono::Duration::MAX).into();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn duplicate_username_is_a_bad_request() {
        let err: ServerError = AuthError::UsernameTaken.into();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }
}
