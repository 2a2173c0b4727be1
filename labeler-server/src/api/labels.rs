//! Labeling endpoints
//!
//! - POST /api/label: record a true/false label
//! - POST /api/undo: revert the most recent label
//! - GET /api/stats: true count and index size
//! - GET /api/history: undo history, oldest first

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use labeler_common::{Label, Stats, UndoEntry};
use serde::{Deserialize, Serialize};

use super::image_url;
use crate::{ApiError, ApiResult, AppState};

/// Label request body
///
/// Fields are optional so that a missing field is reported as 400 rather than
/// a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct LabelRequest {
    pub image_path: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LabelResponse {
    pub success: bool,
    pub label: Label,
    pub image_path: String,
}

#[derive(Debug, Serialize)]
pub struct UndoResponse {
    pub success: bool,
    pub image_path: String,
    pub image_url: String,
    pub label: Label,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<UndoEntry>,
}

/// Build labeling routes
pub fn label_routes() -> Router<AppState> {
    Router::new()
        .route("/api/label", post(label_image))
        .route("/api/undo", post(undo_last))
        .route("/api/stats", get(get_stats))
        .route("/api/history", get(get_history))
}

/// POST /api/label
///
/// `true` labels are appended to the label log; every label is pushed onto
/// the undo history.
pub async fn label_image(
    State(state): State<AppState>,
    payload: Result<Json<LabelRequest>, JsonRejection>,
) -> ApiResult<Json<LabelResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let image_path = request
        .image_path
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Invalid request: image_path is required".to_string()))?;
    let label: Label = request
        .label
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("Invalid request: label is required".to_string()))?
        .parse()?;

    // Rejects traversal (403) and missing files (404) before anything is recorded
    state.index.resolve(&image_path)?;

    state.store.lock().await.label(&image_path, label)?;

    Ok(Json(LabelResponse {
        success: true,
        label,
        image_path,
    }))
}

/// POST /api/undo
///
/// Returns the reverted image so the client can show it again.
pub async fn undo_last(State(state): State<AppState>) -> ApiResult<Json<UndoResponse>> {
    let entry = state.store.lock().await.undo()?;

    Ok(Json(UndoResponse {
        success: true,
        image_url: image_url(&entry.path),
        image_path: entry.path,
        label: entry.label,
    }))
}

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<Stats>> {
    let stats = state.store.lock().await.stats(&state.index)?;
    Ok(Json(stats))
}

/// GET /api/history
pub async fn get_history(State(state): State<AppState>) -> Json<HistoryResponse> {
    let history = state.store.lock().await.history();
    Json(HistoryResponse { history })
}
