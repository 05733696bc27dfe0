//! Per-item batch results.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;

/// An artifact that was downloaded and verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadedArtifact {
    /// Model id.
    pub catalog_id: u64,
    /// Version id.
    pub version_id: u64,
    /// Model display name.
    pub model_name: String,
    /// Where the file was written.
    pub path: PathBuf,
    /// Bytes written during this run.
    pub bytes_written: u64,
    /// Final size on disk.
    pub final_size: u64,
    /// Offset the transfer resumed from (0 for a fresh download).
    pub resumed_from: u64,
}

/// Outcome of one batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// The artifact is on disk.
    Success(DownloadedArtifact),
    /// The item failed; the error names the stage.
    Failure(PipelineError),
}

/// Result of one batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerItemResult {
    /// `catalog@version`, or the trimmed raw line when it did not parse.
    pub identifier: String,
    /// What happened.
    pub outcome: ItemOutcome,
}

impl PerItemResult {
    /// Create a successful result.
    pub fn success(identifier: impl Into<String>, artifact: DownloadedArtifact) -> Self {
        Self {
            identifier: identifier.into(),
            outcome: ItemOutcome::Success(artifact),
        }
    }

    /// Create a failed result.
    pub fn failure(identifier: impl Into<String>, error: impl Into<PipelineError>) -> Self {
        Self {
            identifier: identifier.into(),
            outcome: ItemOutcome::Failure(error.into()),
        }
    }

    /// Whether the item succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, ItemOutcome::Success(_))
    }

    /// The error, if the item failed.
    pub const fn error(&self) -> Option<&PipelineError> {
        match &self.outcome {
            ItemOutcome::Failure(err) => Some(err),
            ItemOutcome::Success(_) => None,
        }
    }
}

/// Counts over a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Items that succeeded.
    pub succeeded: usize,
    /// Items that failed for any reason other than cancellation.
    pub failed: usize,
    /// Items stopped by cancellation.
    pub cancelled: usize,
}

impl BatchSummary {
    /// Tally a result list.
    pub fn from_results(results: &[PerItemResult]) -> Self {
        results.iter().fold(Self::default(), |mut acc, r| {
            match r.error() {
                None => acc.succeeded += 1,
                Some(err) if err.stage() == crate::errors::Stage::Cancelled => acc.cancelled += 1,
                Some(_) => acc.failed += 1,
            }
            acc
        })
    }

    /// Total number of items.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.succeeded + self.failed + self.cancelled
    }

    /// Whether every item succeeded.
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }
}
