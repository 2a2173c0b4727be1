//! labeler-server library - HTTP front end for the image labeler
//!
//! Exposes the application state and router for the binary and for
//! integration testing.

pub mod api;
pub mod error;
pub mod logging;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use labeler_common::config::LabelerConfig;
use labeler_common::{ImageIndex, LabelLog, LabelStore};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
///
/// Created once at startup and dropped at shutdown. The label store sits
/// behind one mutex so each label, undo, or stats request sees a consistent
/// log and history.
#[derive(Clone)]
pub struct AppState {
    /// Cached image listing under the dataset root
    pub index: Arc<ImageIndex>,
    /// True-label log plus undo history
    pub store: Arc<Mutex<LabelStore>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(index: ImageIndex, store: LabelStore) -> Self {
        Self {
            index: Arc::new(index),
            store: Arc::new(Mutex::new(store)),
            startup_time: Utc::now(),
        }
    }

    /// Build state from resolved configuration
    pub fn from_config(config: &LabelerConfig) -> Self {
        let index = ImageIndex::new(&config.dataset_dir, &config.extensions);
        let store = LabelStore::new(LabelLog::new(&config.labels_file));
        Self::new(index, store)
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::ui_routes())
        .merge(api::image_routes())
        .merge(api::label_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
