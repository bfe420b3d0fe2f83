use serde::Serialize;

use crate::domain::errors::Progress;

/// A key the backend refused to delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteFailure {
    pub key: String,
    pub code: String,
    pub message: String,
}

impl DeleteFailure {
    pub fn new(key: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Aggregate result of a batched deletion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    pub deleted: usize,
    pub batches: usize,
    pub errors: Vec<DeleteFailure>,
}

impl DeleteSummary {
    /// Some keys could not be deleted, but the operation ran to completion
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn progress(&self, scanned: usize) -> Progress {
        Progress {
            scanned,
            deleted: self.deleted,
            batches: self.batches,
        }
    }
}
