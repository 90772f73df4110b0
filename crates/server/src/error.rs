use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{auth::AuthError, explain::ExplainError};
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

/// Error type of every route handler. Validation failures are rejected
/// before storage is touched; not-found and not-owned are deliberately the
/// same variant; storage errors are logged here and reach the caller only
/// as a generic message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("authentication required")]
    Unauthorized,
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Explain(#[from] ExplainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            Self::Database(e) => {
                error!("storage failure: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage failure".to_string())
            }
            Self::Auth(e) => {
                error!("identity resolution failed: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage failure".to_string())
            }
            Self::Explain(e) => {
                let status = match e {
                    ExplainError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, e.to_string())
            }
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}
