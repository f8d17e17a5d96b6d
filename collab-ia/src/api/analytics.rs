//! Analytics API handlers
//!
//! POST /api/v1/analytics/upload, GET /api/v1/analytics/longest-collaboration

use std::io::Cursor;

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use collab_common::LongestCollaboration;
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    services::{IngestSummary, IngestionCoordinator, OverlapAnalyzer, UploadRejection},
    AppState,
};

/// Multipart field carrying the CSV file
pub const FILE_FIELD: &str = "file";

/// POST /api/v1/analytics/upload
///
/// Accepts one CSV file in the `file` field and ingests it. Rows that fail
/// validation are counted in `rowsWithError` and do not fail the request.
pub async fn upload_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<IngestSummary>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        state
            .upload_gate
            .check_type(file_name.as_deref(), content_type.as_deref())?;

        let bytes = field.bytes().await.map_err(multipart_error)?;
        state.upload_gate.check_size(bytes.len())?;

        info!(
            file_name = file_name.as_deref().unwrap_or("<unnamed>"),
            size = bytes.len(),
            "CSV upload received"
        );

        let coordinator = IngestionCoordinator::new(state.store.clone(), state.ingest_options);
        let summary = coordinator.ingest(Cursor::new(bytes)).await?;
        return Ok(Json(summary));
    }

    Err(UploadRejection::MissingFile.into())
}

/// GET /api/v1/analytics/longest-collaboration
///
/// Returns `{0, 0, 0}` when no two employees ever overlapped.
pub async fn longest_collaboration(
    State(state): State<AppState>,
) -> ApiResult<Json<LongestCollaboration>> {
    let analyzer = OverlapAnalyzer::new(state.store.clone());
    let result = analyzer.find_longest_collaboration().await?;
    Ok(Json(result))
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::BadRequest(format!("Invalid multipart body: {}", e.body_text()))
    }
}

/// Build analytics routes
pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/analytics/upload", post(upload_csv))
        .route(
            "/api/v1/analytics/longest-collaboration",
            get(longest_collaboration),
        )
}
