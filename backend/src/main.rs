use std::sync::Arc;

use axum::middleware;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use review_insight_backend::{logging, routes, AnalysisStore, AppState, Config, OllamaClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    logging::init(&config.logging.level);

    tracing::info!("Starting Review Insight backend");

    // Initialize components
    let inference = Arc::new(OllamaClient::new(&config.ollama.base_url));
    let store = Arc::new(AnalysisStore::new(&config.database.url)?);
    tracing::info!(
        base_url = %config.ollama.base_url,
        text_model = %config.ollama.text_model,
        vision_model = %config.ollama.vision_model,
        database = %config.database.url,
        "Components initialized"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, inference, store));

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = routes::router(state.clone())
        .layer(middleware::from_fn(logging::request_logger))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown(state))
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Wait for Ctrl-C, then tell running batches to wrap up.
async fn shutdown(state: Arc<AppState>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
    state.begin_shutdown();
}
