//! collab-ia library interface
//!
//! Employee collaboration ingest & analytics: streams assignment CSV files
//! into storage and answers which employee pair worked together longest.
//! Exposes public APIs for integration testing.

pub mod api;
pub mod db;
pub mod error;
pub mod services;
pub mod store;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use collab_common::config::Settings;
use tower_http::trace::TraceLayer;

use crate::services::{IngestOptions, UploadGate};
use crate::store::AssignmentStore;

/// Allowance on top of the file size limit for multipart boundaries and headers
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Storage capability handed to ingestion and analysis
    pub store: Arc<dyn AssignmentStore>,
    pub ingest_options: IngestOptions,
    pub upload_gate: UploadGate,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(store: Arc<dyn AssignmentStore>, ingest_options: IngestOptions, upload_gate: UploadGate) -> Self {
        Self {
            store,
            ingest_options,
            upload_gate,
            startup_time: Utc::now(),
        }
    }

    pub fn from_settings(store: Arc<dyn AssignmentStore>, settings: &Settings) -> Self {
        let ingest_options = IngestOptions {
            chunk_size: settings.chunk_size,
            read_ahead: settings.read_ahead,
            today: None,
        };
        Self::new(store, ingest_options, UploadGate::new(settings.max_upload_bytes))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state
        .upload_gate
        .max_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .merge(api::analytics_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
