//! One error type for every handler, mapped to a status and an
//! `{"error": "..."}` body.

use hyper::StatusCode;
use thiserror::Error;
use tracing::{error, warn};

use shared::types::PaginationError;

use super::utils::json_response::{JsonResponse, deliver_error_json, fallback_error};
use crate::auth::AuthError;
use crate::database::DbError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Pagination(#[from] PaginationError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn forbidden() -> Self {
        ApiError::Forbidden("Insufficient privileges".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Pagination(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(err) => match err {
                AuthError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AuthError::MissingCredentials
                | AuthError::MissingEmail
                | AuthError::Exchange(_)
                | AuthError::MissingIdToken => StatusCode::BAD_REQUEST,
                AuthError::Upstream(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::UNAUTHORIZED,
            },
            ApiError::Db(err) => match err {
                DbError::NotFound { .. } => StatusCode::NOT_FOUND,
                DbError::InvalidField { .. } | DbError::Validation(_) => StatusCode::BAD_REQUEST,
                DbError::UniqueViolation(_) | DbError::ForeignKeyViolation(_) => {
                    StatusCode::CONFLICT
                }
                DbError::Type(_) | DbError::Query(_) | DbError::Connection(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Text sent to the client. Internal failures are reported generically;
    /// their detail only goes to the log.
    pub fn message(&self) -> String {
        match self {
            ApiError::Internal(_) => "internal server error".to_string(),
            ApiError::Auth(AuthError::Upstream(_)) => "unable to reach Google".to_string(),
            ApiError::Db(DbError::Type(_) | DbError::Query(_) | DbError::Connection(_)) => {
                "database error".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn into_response(self) -> JsonResponse {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = ?self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        deliver_error_json(&self.message(), status).unwrap_or_else(|_| fallback_error())
    }
}
