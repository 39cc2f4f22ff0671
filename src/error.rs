use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Meeting expired.")]
    MeetingExpired,

    #[error("Meeting is full.")]
    MeetingFull,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("Database internal error: {0}")]
    StorageError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::MeetingExpired => (StatusCode::BAD_REQUEST, "Meeting expired.".to_string()),
            AppError::MeetingFull => (StatusCode::BAD_REQUEST, "Meeting is full.".to_string()),
            AppError::UsernameTaken => {
                (StatusCode::BAD_REQUEST, "Username already taken".to_string())
            }
            AppError::IncorrectPassword => {
                (StatusCode::BAD_REQUEST, "Incorrect password".to_string())
            }
            AppError::StorageError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database internal error.".to_string(),
            ),
            AppError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "Error": error_message }));

        (status, body).into_response()
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::StorageError(err.to_string())
    }
}

impl From<deadpool_redis::PoolError> for AppError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        AppError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_hide_details_from_clients() {
        // The response body must carry the generic message, not the Redis error.
        let err = AppError::StorageError("connection refused".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn business_rule_failures_are_client_errors() {
        for err in [
            AppError::MeetingExpired,
            AppError::MeetingFull,
            AppError::UsernameTaken,
            AppError::IncorrectPassword,
        ] {
            assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        }
    }
}
