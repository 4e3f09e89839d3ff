//! HTTP API for Plugin Shop license issuance and device activation.
//!
//! Wraps the `pluginshop-license` service with an in-memory store that
//! enforces key uniqueness and serializes activation-count updates.

pub mod api;
pub mod config;
pub mod error;
pub mod extractors;
pub mod store;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{delete, get, post},
};
use pluginshop_license::Clock;
use tokio::net::TcpListener;
use tracing::info;

pub use config::ServerConfig;
pub use store::{LicenseStore, MAX_KEY_ATTEMPTS, StoreError};

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LicenseStore>,
}

impl AppState {
    /// Creates state with an empty store reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Arc::new(LicenseStore::new(clock)),
        }
    }
}

/// Build the HTTP API router with the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(api::health))
        .route("/api/v1/license-types", get(api::license_types))
        .route("/api/v1/licenses", post(api::issue_license))
        .route("/api/v1/licenses/{key}", get(api::get_license))
        .route("/api/v1/licenses/{key}/validate", post(api::validate_license))
        .route(
            "/api/v1/licenses/{key}/activations",
            get(api::list_activations).post(api::activate),
        )
        .route(
            "/api/v1/licenses/{key}/activations/{id}",
            delete(api::deactivate),
        )
        .with_state(state)
}

/// Binds `config` and serves the API until Ctrl-C.
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("License API listening on {}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
