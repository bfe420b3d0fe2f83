use std::sync::Arc;

use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::{
    domain::{
        errors::{RetentionError, RetentionResult, StorageResult},
        models::{DeleteSummary, Entry, ListMode},
        value_objects::Prefix,
    },
    ports::storage::{StorageClient, MAX_DELETE_KEYS},
};

use super::enumerator::Enumeration;

/// Prefixes whose contents are gathered before flushing a partial batch
pub const DEFAULT_PREFIX_BATCH_SIZE: usize = 50;

/// Deletes keys in bounded batches, one call in flight at a time.
///
/// Per-key failures are collected and the run continues; a failed call
/// aborts with [`RetentionError::Transport`] carrying the progress so far.
#[derive(Debug, Clone, Copy)]
pub struct BatchDeleter {
    batch_size: usize,
    prefix_batch_size: usize,
}

impl Default for BatchDeleter {
    fn default() -> Self {
        Self {
            batch_size: MAX_DELETE_KEYS,
            prefix_batch_size: DEFAULT_PREFIX_BATCH_SIZE,
        }
    }
}

impl BatchDeleter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys per delete call, clamped to `1..=1000`
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_DELETE_KEYS);
        self
    }

    pub fn with_prefix_batch_size(mut self, prefix_batch_size: usize) -> Self {
        self.prefix_batch_size = prefix_batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn prefix_batch_size(&self) -> usize {
        self.prefix_batch_size
    }

    /// Delete an explicit list of keys
    pub async fn delete_keys(
        &self,
        client: &dyn StorageClient,
        keys: &[String],
    ) -> RetentionResult<DeleteSummary> {
        let mut summary = DeleteSummary::default();
        for (idx, chunk) in keys.chunks(self.batch_size).enumerate() {
            let scanned = idx * self.batch_size;
            self.flush(client, chunk, &mut summary, scanned).await?;
        }

        info!(
            bucket = %client.bucket(),
            deleted = summary.deleted,
            batches = summary.batches,
            errors = summary.errors.len(),
            "Deleted keys"
        );
        Ok(summary)
    }

    /// Recursively delete everything below each prefix, folder markers included
    pub async fn delete_prefixes(
        &self,
        client: &Arc<dyn StorageClient>,
        prefixes: &[String],
    ) -> RetentionResult<DeleteSummary> {
        let prefixes = prefixes
            .iter()
            .map(|p| {
                let prefix = Prefix::new(p).map_err(|e| RetentionError::InvalidRequest {
                    message: format!("Invalid prefix '{}': {}", p, e),
                })?;
                if prefix.is_root() {
                    return Err(RetentionError::InvalidRequest {
                        message: "Refusing to delete the bucket root as a prefix".to_string(),
                    });
                }
                Ok(prefix)
            })
            .collect::<RetentionResult<Vec<_>>>()?;

        let mut summary = DeleteSummary::default();
        let mut pending = Vec::with_capacity(self.batch_size);
        let mut scanned = 0;

        for group in prefixes.chunks(self.prefix_batch_size) {
            for prefix in group {
                let entries =
                    Enumeration::new(client.clone(), prefix.clone(), ListMode::Recursive)
                        .with_placeholders()
                        .into_stream();
                self.drain(
                    client.as_ref(),
                    entries,
                    |_| true,
                    &mut pending,
                    &mut summary,
                    &mut scanned,
                )
                .await?;
            }
            if !pending.is_empty() {
                self.flush(client.as_ref(), &pending, &mut summary, scanned)
                    .await?;
                pending.clear();
            }
        }

        info!(
            bucket = %client.bucket(),
            prefixes = prefixes.len(),
            deleted = summary.deleted,
            batches = summary.batches,
            errors = summary.errors.len(),
            "Deleted prefixes"
        );
        Ok(summary)
    }

    /// Delete every key yielded by `entries`, returning the number scanned
    pub async fn delete_stream<S>(
        &self,
        client: &dyn StorageClient,
        entries: S,
    ) -> RetentionResult<(DeleteSummary, usize)>
    where
        S: Stream<Item = StorageResult<Entry>> + Unpin,
    {
        self.delete_matching(client, entries, |_| true).await
    }

    /// Delete the keys of the entries accepted by `predicate`.
    ///
    /// Every entry counts as scanned; folders are never deleted.
    pub async fn delete_matching<S, F>(
        &self,
        client: &dyn StorageClient,
        entries: S,
        predicate: F,
    ) -> RetentionResult<(DeleteSummary, usize)>
    where
        S: Stream<Item = StorageResult<Entry>> + Unpin,
        F: FnMut(&Entry) -> bool,
    {
        let mut summary = DeleteSummary::default();
        let mut pending = Vec::with_capacity(self.batch_size);
        let mut scanned = 0;

        self.drain(
            client,
            entries,
            predicate,
            &mut pending,
            &mut summary,
            &mut scanned,
        )
        .await?;
        if !pending.is_empty() {
            self.flush(client, &pending, &mut summary, scanned).await?;
        }
        Ok((summary, scanned))
    }

    async fn drain<S, F>(
        &self,
        client: &dyn StorageClient,
        mut entries: S,
        mut predicate: F,
        pending: &mut Vec<String>,
        summary: &mut DeleteSummary,
        scanned: &mut usize,
    ) -> RetentionResult<()>
    where
        S: Stream<Item = StorageResult<Entry>> + Unpin,
        F: FnMut(&Entry) -> bool,
    {
        while let Some(entry) = entries.next().await {
            let entry = entry.map_err(|e| {
                RetentionError::transport("list_objects", e, summary.progress(*scanned))
            })?;
            *scanned += 1;
            if !predicate(&entry) {
                continue;
            }
            let key = match entry {
                Entry::Object(object) => object.key,
                Entry::Placeholder(key) => key,
                Entry::Folder(_) => continue,
            };
            pending.push(key);

            if pending.len() >= self.batch_size {
                self.flush(client, pending.as_slice(), summary, *scanned)
                    .await?;
                pending.clear();
            }
        }
        Ok(())
    }

    async fn flush(
        &self,
        client: &dyn StorageClient,
        keys: &[String],
        summary: &mut DeleteSummary,
        scanned: usize,
    ) -> RetentionResult<()> {
        let output = client.delete_objects(keys).await.map_err(|e| {
            warn!(bucket = %client.bucket(), keys = keys.len(), error = %e, "Delete batch failed");
            RetentionError::transport("delete_objects", e, summary.progress(scanned))
        })?;

        summary.batches += 1;
        summary.deleted += output.deleted;
        debug!(
            bucket = %client.bucket(),
            batch = summary.batches,
            requested = keys.len(),
            deleted = output.deleted,
            "Deleted batch"
        );
        for failure in &output.errors {
            warn!(key = %failure.key, code = %failure.code, message = %failure.message, "Key not deleted");
        }
        summary.errors.extend(output.errors);
        Ok(())
    }
}
