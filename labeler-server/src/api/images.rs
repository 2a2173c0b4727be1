//! Image selection and serving
//!
//! - GET /api/next-image: random image from the index
//! - POST /api/refresh: rescan the dataset root
//! - GET /image/*path: raw image bytes, confined to the dataset root

use axum::{
    body::Body,
    extract::{Path, Request, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use labeler_common::selector;
use serde::Serialize;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::debug;

use super::image_url;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct NextImageResponse {
    pub image_path: String,
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub total: usize,
}

/// Build image routes
pub fn image_routes() -> Router<AppState> {
    Router::new()
        .route("/api/next-image", get(next_image))
        .route("/api/refresh", post(refresh_index))
        .route("/image/*image_path", get(serve_image))
}

/// GET /api/next-image
///
/// Labeled images stay in circulation, so the same image may come back.
pub async fn next_image(State(state): State<AppState>) -> ApiResult<Json<NextImageResponse>> {
    let image_path = selector::next_image(&state.index).ok_or_else(|| {
        ApiError::NotFound(format!(
            "No images found in {}",
            state.index.root().display()
        ))
    })?;

    debug!("Presenting {}", image_path);
    Ok(Json(NextImageResponse {
        image_url: image_url(&image_path),
        image_path,
    }))
}

/// POST /api/refresh
///
/// Replaces the cached listing with a fresh scan.
pub async fn refresh_index(State(state): State<AppState>) -> Json<RefreshResponse> {
    let total = state.index.refresh();
    Json(RefreshResponse {
        success: true,
        total,
    })
}

/// GET /image/*image_path
///
/// 403 if the path escapes the dataset root, 404 if the file is missing.
pub async fn serve_image(
    State(state): State<AppState>,
    Path(image_path): Path<String>,
    request: Request,
) -> ApiResult<Response> {
    let full_path = state.index.resolve(&image_path)?;

    let response = ServeFile::new(full_path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});

    Ok(response.map(Body::new))
}
