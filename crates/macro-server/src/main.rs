//! macro-server
//!
//! Axum server exposing the macro event analyzer as a JSON API.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use macro_advisor::{AnalyzerConfig, MacroAnalyzer};
use macro_runtime::EmbeddingConfig;

use crate::handlers::{analyze, health_check, list_archetypes};
use crate::state::AppState;

/// Routes without the tracing and CORS layers
fn routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/archetypes", get(list_archetypes))
        .route("/api/analyze", post(analyze))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Embedding provider
    let provider = EmbeddingConfig::from_env()?.build()?;
    let info = provider.info();
    match provider.health_check().await {
        Ok(true) => tracing::info!("✓ Embedding provider {} ready (dim {})", info.name, info.dimension),
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ Embedding provider {} not reachable", info.name);
            tracing::warn!("  Set MACRO_EMBEDDER=local to run offline");
        }
    }

    // Registry validation and anchor/analog embedding happen here
    let config = AnalyzerConfig::from_env()?;
    let analyzer = MacroAnalyzer::builder(provider).config(config).build().await?;
    tracing::info!(
        "Loaded {} archetypes, classifier {:?}",
        analyzer.registry().len(),
        analyzer.config().classifier
    );

    let state = AppState {
        analyzer: Arc::new(analyzer),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("macro-server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health          - Provider status");
    tracing::info!("  GET  /api/archetypes  - Archetype registry");
    tracing::info!("  POST /api/analyze     - Analyze a headline");

    axum::serve(listener, app).await?;

    Ok(())
}
