//! # Labeler Common Library
//!
//! Bookkeeping core for the image labeler:
//! - Image discovery with an explicit cache (`image_index`)
//! - Random presentation order (`selector`)
//! - Durable true-label log (`label_log`)
//! - Bounded undo history (`undo`)
//! - Per-request atomic label/undo operations (`store`)
//! - Configuration loading

pub mod config;
pub mod error;
pub mod image_index;
pub mod label_log;
pub mod selector;
pub mod store;
pub mod undo;

pub use error::{Error, Result};
pub use image_index::ImageIndex;
pub use label_log::LabelLog;
pub use store::{LabelStore, Stats};
pub use undo::{Label, UndoEntry, UndoStack, MAX_HISTORY};
