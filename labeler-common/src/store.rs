//! Label store
//!
//! Owns the true-label log and the undo history so that a label or undo
//! request mutates both as one unit. Callers hold the store behind a single
//! lock.

use serde::Serialize;
use tracing::{error, info, warn};

use crate::label_log::LabelLog;
use crate::undo::{Label, UndoEntry, UndoStack};
use crate::{Error, ImageIndex, Result};

/// Labeling statistics
///
/// `remaining` is the full index size, not filtered by the log, so images
/// already labeled true are counted twice in `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    #[serde(rename = "true")]
    pub true_count: usize,
    pub remaining: usize,
    pub total: usize,
}

/// Label log plus undo history
#[derive(Debug)]
pub struct LabelStore {
    log: LabelLog,
    history: UndoStack,
}

impl LabelStore {
    pub fn new(log: LabelLog) -> Self {
        Self {
            log,
            history: UndoStack::new(),
        }
    }

    pub fn log(&self) -> &LabelLog {
        &self.log
    }

    /// Record a label; `true` labels are appended to the log first
    pub fn label(&mut self, image_path: &str, label: Label) -> Result<()> {
        if label == Label::True {
            self.log.append(image_path)?;
        }
        self.history.record(image_path, label);
        info!("Labeled {} as {}", image_path, label);
        Ok(())
    }

    /// Undo the most recent label
    ///
    /// A `true` label also removes the last matching line from the log. If
    /// that removal fails the entry is put back on the history.
    pub fn undo(&mut self) -> Result<UndoEntry> {
        let entry = self.history.pop().ok_or(Error::EmptyHistory)?;

        if entry.label == Label::True {
            match self.log.remove_last_occurrence(&entry.path) {
                Ok(true) => {}
                Ok(false) => warn!(
                    "Undo of {}: no matching line in {}",
                    entry.path,
                    self.log.path().display()
                ),
                Err(e) => {
                    error!("Undo of {} failed: {}", entry.path, e);
                    self.history.restore(entry);
                    return Err(Error::Internal(e.to_string()));
                }
            }
        }

        info!("Undid {} label on {}", entry.label, entry.path);
        Ok(entry)
    }

    /// Counts of logged true labels and indexed images
    pub fn stats(&self, index: &ImageIndex) -> Result<Stats> {
        let true_count = self.log.count()?;
        let remaining = index.len();
        Ok(Stats {
            true_count,
            remaining,
            total: true_count + remaining,
        })
    }

    /// Snapshot of the undo history, oldest first
    pub fn history(&self) -> Vec<UndoEntry> {
        self.history.iter().cloned().collect()
    }
}
