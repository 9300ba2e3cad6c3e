use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use petitions_db::StoreError;
use petitions_types::api::ErrorBody;

use crate::storage::StorageError;

/// Message for every failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{}", INVALID_CREDENTIALS)]
    InvalidCredentials,

    #[error("authentication required")]
    Unauthorized,

    #[error("you do not have permission to do that")]
    Forbidden,

    #[error("{0}")]
    BadRequest(String),

    #[error("request body is too large")]
    PayloadTooLarge,

    #[error("{0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn internal(msg: impl std::fmt::Display) -> Self {
        ApiError::Internal(msg.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(e) => match e {
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                StoreError::Validation(_) => StatusCode::BAD_REQUEST,
                StoreError::Conflict(_) => StatusCode::CONFLICT,
                StoreError::Database(_) | StoreError::Corrupt(_) | StoreError::Poisoned(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Storage(e) => match e {
                StorageError::Empty | StorageError::InvalidContentType(_) => StatusCode::BAD_REQUEST,
                StorageError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                StorageError::Rejected { .. } | StorageError::Transport(_) => StatusCode::BAD_GATEWAY,
            },
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Never leak internals to clients
        let message = if let ApiError::Unavailable(reason) = &self {
            reason.clone()
        } else if status.is_server_error() {
            error!("{}", self);
            match status {
                StatusCode::BAD_GATEWAY => "file upload failed".to_string(),
                _ => "something went wrong, please try again".to_string(),
            }
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_status_codes() {
        assert_eq!(ApiError::from(StoreError::NotFound("petition")).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(StoreError::validation("x")).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(StoreError::Conflict("x".into())).status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::from(StoreError::Poisoned("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unavailable_keeps_its_message() {
        let err = ApiError::Unavailable("file uploads are disabled".into());
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ApiError::PayloadTooLarge.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn credentials_message_is_generic() {
        assert_eq!(ApiError::InvalidCredentials.to_string(), "Invalid email or password.");
    }
}
