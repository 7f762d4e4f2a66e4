//! HTTP API server
//!
//! Routes:
//! - `GET  /health`
//! - `POST /api/upload-process` (multipart `weights_file`, `prices_file`)
//! - `GET  /api/performance`
//! - `GET  /api/composition`
//! - `GET  /api/holding-price-change?date=YYYY-MM-DD`
//! - `GET  /api/top-holdings?n=5`
//! - `GET  /api/full-price-history`

pub mod handlers;
pub mod types;

use crate::core::config::ServerConfig;
use crate::store::TabularStore;
use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared state for the handlers
pub struct AppState {
    pub store: Arc<TabularStore>,
}

impl AppState {
    pub fn new(store: Arc<TabularStore>) -> Self {
        Self { store }
    }
}

/// Builds the router with CORS, request tracing and the upload size cap.
pub fn router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/upload-process", post(handlers::upload_process))
        .route("/api/performance", get(handlers::performance))
        .route("/api/composition", get(handlers::composition))
        .route(
            "/api/holding-price-change",
            get(handlers::holding_price_change),
        )
        .route("/api/top-holdings", get(handlers::top_holdings))
        .route("/api/full-price-history", get(handlers::full_price_history))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allows_any_origin() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(%origin, error = %e, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Serves `app` on an already bound listener until `shutdown` resolves.
pub async fn run(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Binds to the configured address and serves until Ctrl-C.
pub async fn serve(config: &ServerConfig, store: Arc<TabularStore>) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid address: {}:{}", config.host, config.port))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    let app = router(Arc::new(AppState::new(store)), config);

    info!("Starting etfview API server on {}", addr);
    info!("  POST http://{}/api/upload-process", addr);
    info!("  GET  http://{}/api/performance", addr);
    info!("  GET  http://{}/api/composition", addr);
    info!("  GET  http://{}/api/holding-price-change", addr);
    info!("  GET  http://{}/api/top-holdings", addr);
    info!("  GET  http://{}/api/full-price-history", addr);

    run(listener, app, shutdown_signal())
        .await
        .context("API server error")?;
    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("API server shutting down");
}
