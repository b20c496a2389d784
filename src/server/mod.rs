//! HTTP server for cert-forge.
//!
//! Routes:
//! - `POST /predict` — forgery detection, returns `{"detections": [...]}`
//! - `POST /extract` (and `/extract/`) — certificate field extraction
//!
//! Both take a multipart upload with the image in the `file` field.

pub mod error;
pub mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::forensics::ForensicsService;

pub use error::ApiError;
pub use routes::UPLOAD_FIELD;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ForensicsService>,
}

impl AppState {
    pub fn new(service: ForensicsService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Builds the router with CORS, request tracing and the upload size limit.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/predict", post(routes::predict))
        .route("/extract", post(routes::extract))
        .route("/extract/", post(routes::extract))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Runs the HTTP server until Ctrl-C.
pub async fn run(config: ServerConfig, service: ForensicsService) -> Result<()> {
    config.validate()?;

    let app = build_router(AppState::new(service), config.max_upload_bytes);

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_address()))?;
    let addr = listener.local_addr()?;
    info!(addr = %addr, model = %config.model.model, "Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
