pub mod error;
pub mod identity;
pub mod routes;

use axum::Router;
use db::DBService;
use services::services::explain::ExplainService;

#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    /// Absent when no API key is configured; the explain endpoint then
    /// answers 503 instead of the server refusing to start.
    pub explain: Option<ExplainService>,
}

impl AppState {
    pub fn new(db: DBService, explain: Option<ExplainService>) -> Self {
        Self { db, explain }
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::router())
        .with_state(state)
}
