//! Pass-through proxy for AI code explanations.

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::post,
};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use services::services::explain::ExplainError;
use ts_rs::TS;

use crate::{AppState, error::ApiError, identity::Identity};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ExplainRequest {
    pub content: String,
}

/// Streams the model's explanation back as plain text chunks; the dialog on
/// the other end just concatenates them.
pub async fn explain(
    State(state): State<AppState>,
    _identity: Identity,
    Json(payload): Json<ExplainRequest>,
) -> Result<Response, ApiError> {
    if payload.content.is_empty() {
        return Err(ApiError::Validation("content is required".to_string()));
    }
    let service = state.explain.as_ref().ok_or(ExplainError::NotConfigured)?;
    let stream = service.explain_stream(payload.content).await?;
    let body = Body::from_stream(stream.map(|chunk| chunk.map(axum::body::Bytes::from)));
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/explain", post(explain))
}
