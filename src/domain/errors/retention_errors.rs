use serde::Serialize;

use crate::domain::{errors::StorageError, value_objects::BucketName};

/// Counters accumulated before an operation was aborted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub scanned: usize,
    pub deleted: usize,
    pub batches: usize,
}

/// Errors surfaced by retention operations
#[derive(Debug, Clone)]
pub enum RetentionError {
    /// Bucket is not on the allow-list; no client was resolved
    BucketNotAllowed { bucket: String },

    /// None of the configured clients could access the bucket
    NoUsableClient {
        bucket: BucketName,
        attempts: usize,
        last_error: Option<StorageError>,
    },

    /// A backend call failed outright
    Transport {
        operation: String,
        source: StorageError,
        progress: Progress,
    },

    /// Request parameters are malformed
    InvalidRequest { message: String },
}

impl RetentionError {
    pub(crate) fn transport(operation: &str, source: StorageError, progress: Progress) -> Self {
        RetentionError::Transport {
            operation: operation.to_string(),
            source,
            progress,
        }
    }

    /// Progress counters carried by the error, if any work was done
    pub fn progress(&self) -> Option<Progress> {
        match self {
            RetentionError::Transport { progress, .. } => Some(*progress),
            _ => None,
        }
    }
}

impl std::fmt::Display for RetentionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetentionError::BucketNotAllowed { bucket } => {
                write!(f, "Bucket not allowed: {}", bucket)
            }
            RetentionError::NoUsableClient {
                bucket,
                attempts,
                last_error,
            } => {
                write!(
                    f,
                    "No usable client for bucket '{}' after {} attempt(s)",
                    bucket, attempts
                )?;
                if let Some(err) = last_error {
                    write!(f, ": {}", err)?;
                }
                Ok(())
            }
            RetentionError::Transport {
                operation,
                source,
                progress,
            } => {
                write!(
                    f,
                    "{} failed after {} deleted in {} batch(es): {}",
                    operation, progress.deleted, progress.batches, source
                )
            }
            RetentionError::InvalidRequest { message } => {
                write!(f, "Invalid request: {}", message)
            }
        }
    }
}

impl std::error::Error for RetentionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RetentionError::NoUsableClient {
                last_error: Some(err),
                ..
            } => Some(err),
            RetentionError::Transport { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for retention operations
pub type RetentionResult<T> = Result<T, RetentionError>;
