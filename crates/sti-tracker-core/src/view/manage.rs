//! Manage mode: mark rows, then confirm or cancel their deletion.

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::store::{HistoryStore, StoreResult};

/// Build a delete mask over `row_count` rows from snapshot labels.
///
/// Labels point into the unfiltered history, so the mask addresses the same
/// physical rows whatever filter was active when they were marked. Labels
/// outside the table are ignored.
pub fn selector_for(labels: &BTreeSet<usize>, row_count: usize) -> Vec<bool> {
    (0..row_count).map(|i| labels.contains(&i)).collect()
}

/// Rows marked for deletion in the history view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManageMode {
    enabled: bool,
    marked: BTreeSet<usize>,
}

impl ManageMode {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switch manage mode on or off. Turning it off drops any marks.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.marked.clear();
        }
    }

    /// Flip the mark on a row label. Returns whether the row is now marked.
    pub fn toggle(&mut self, label: usize) -> bool {
        if !self.marked.remove(&label) {
            self.marked.insert(label);
            true
        } else {
            false
        }
    }

    pub fn is_marked(&self, label: usize) -> bool {
        self.marked.contains(&label)
    }

    pub fn marked(&self) -> &BTreeSet<usize> {
        &self.marked
    }

    /// True when there is something to confirm.
    pub fn has_pending(&self) -> bool {
        !self.marked.is_empty()
    }

    /// Warning text shown while rows are marked.
    pub fn pending_message(&self) -> Option<String> {
        self.has_pending()
            .then(|| format!("You selected {} record(s) for deletion.", self.marked.len()))
    }

    /// Drop all marks without deleting anything.
    pub fn cancel(&mut self) {
        if self.has_pending() {
            info!(count = self.marked.len(), "Deletion cancelled");
        }
        self.marked.clear();
    }

    /// Delete the marked rows from the store and clear the marks.
    pub fn confirm(&mut self, store: &mut HistoryStore) -> StoreResult<usize> {
        if !self.has_pending() {
            return Ok(0);
        }

        let mask = selector_for(&self.marked, store.row_count());
        warn!(count = self.marked.len(), labels = ?self.marked, "Confirm delete pressed");
        let marked = std::mem::take(&mut self.marked);
        match store.delete_rows(Some(mask.as_slice())) {
            Ok(removed) => Ok(removed),
            Err(e) => {
                // Keep the marks so the user can retry.
                self.marked = marked;
                Err(e)
            }
        }
    }
}
