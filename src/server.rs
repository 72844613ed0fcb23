//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::header::CONNECTION,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{services::ServeFile, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::api;
use crate::error::ApiError;
use crate::models::AppConfig;
use crate::services::{
    Pipeline, PipelineRunner, ProcessOutcome, BINARY_FILE, HEADER_FILE, PREVIEW_FILE, STATS_FILE,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub runner: PipelineRunner,
}

/// Create application state from a loaded configuration.
pub fn create_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    std::fs::create_dir_all(&config.output_dir).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create output directory {}: {e}",
            config.output_dir.display()
        )
    })?;

    let pipeline = Pipeline::from_config(&config);
    let runner = PipelineRunner::new(pipeline, config.output_dir.clone());

    Ok(AppState {
        config: Arc::new(config),
        runner,
    })
}

/// Build the API router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
/// It includes the `Connection: close` header to prevent connection
/// accumulation from the frame's HTTP client.
pub fn build_router(state: AppState) -> Router {
    let output_dir = state.runner.output_dir().to_path_buf();
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        // Upload endpoint
        .route("/api/upload", post(handle_upload))
        // Published artifacts, 404 until the first successful run
        .route_service(
            &format!("/{BINARY_FILE}"),
            ServeFile::new(output_dir.join(BINARY_FILE)),
        )
        .route_service(
            &format!("/{HEADER_FILE}"),
            ServeFile::new(output_dir.join(HEADER_FILE)),
        )
        .route_service(
            &format!("/{STATS_FILE}"),
            ServeFile::new(output_dir.join(STATS_FILE)),
        )
        .route_service(
            &format!("/{PREVIEW_FILE}"),
            ServeFile::new(output_dir.join(PREVIEW_FILE)),
        )
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Add state and tracing
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        // The frame's HTTP client never reuses connections; close them
        // server-side so they do not pile up.
        .layer(SetResponseHeaderLayer::overriding(
            CONNECTION,
            axum::http::HeaderValue::from_static("close"),
        ))
}

async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ProcessOutcome>, ApiError> {
    api::handle_upload(
        State(state.runner),
        state.config.max_upload_bytes,
        multipart,
    )
    .await
}
