//! Public snippet search.

use axum::{
    Router,
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::snippet::Snippet;
use serde::Deserialize;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Empty queries short-circuit to an empty list without touching storage.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Snippet>>>, ApiError> {
    if query.q.is_empty() {
        return Ok(ResponseJson(ApiResponse::success(Vec::new())));
    }
    let snippets = Snippet::search_public(&state.db.pool, &query.q).await?;
    Ok(ResponseJson(ApiResponse::success(snippets)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/search", get(search))
}
