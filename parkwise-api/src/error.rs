use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parkwise_core::CoreError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            },
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) => AppError::ValidationError(msg),
            CoreError::NotFoundError(what) => AppError::NotFoundError(format!("{} not found", what)),
            CoreError::ConflictError(msg) => AppError::ConflictError(msg),
            CoreError::NoSpotAvailable(_) => {
                AppError::ConflictError("No available spots in the selected lot".to_string())
            }
            CoreError::ForbiddenError(msg) => AppError::AuthorizationError(msg),
            CoreError::StorageError(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}
