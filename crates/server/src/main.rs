use anyhow::Result;
use db::DBService;
use server::{AppState, app_router};
use services::services::{config::Config, explain::ExplainService};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    let db = DBService::new(&config.database_url).await?;

    let explain = match &config.anthropic_api_key {
        Some(api_key) => Some(ExplainService::new(
            api_key.clone(),
            config.explain_model.clone(),
        )?),
        None => {
            warn!("ANTHROPIC_API_KEY not set; /api/explain is disabled");
            None
        }
    };

    let app = app_router(AppState::new(db, explain))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
