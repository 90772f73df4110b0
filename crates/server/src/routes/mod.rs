pub mod auth;
pub mod explain;
pub mod folders;
pub mod search;
pub mod snippets;

use axum::{Router, response::Json as ResponseJson, routing::get};
use utils::response::ApiResponse;

use crate::AppState;

pub async fn health() -> ResponseJson<ApiResponse<&'static str>> {
    ResponseJson(ApiResponse::success("ok"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(auth::router())
        .merge(explain::router())
        .merge(folders::router())
        .merge(search::router())
        .merge(snippets::router())
}
