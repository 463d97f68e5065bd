//! Lead import event payload types
//!
//! Supporting types for import session progress reporting.

use serde::{Deserialize, Serialize};

/// Row counts produced by parsing an uploaded file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseSummary {
    /// Records that passed every field rule
    pub valid: usize,
    /// Records with at least one validation error
    pub invalid: usize,
    /// Data lines dropped for a column-count mismatch
    pub skipped: usize,
}

impl ParseSummary {
    /// Records shown in the preview (valid and invalid together)
    pub fn records(&self) -> usize {
        self.valid + self.invalid
    }
}

/// Cumulative counters for one import session
///
/// `processed == successful + failed` after every batch and
/// `processed <= total` at all times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportProgress {
    pub total: usize,
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
}

impl ImportProgress {
    /// Percentage of `total` processed (0.0 - 100.0)
    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            (self.processed as f32 / self.total as f32) * 100.0
        }
    }
}
