use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, instrument};

use crate::{
    domain::{
        errors::{Progress, RetentionError, RetentionResult, StorageError},
        models::{
            extract_timestamp, select, BucketAllowList, DeleteSummary, Entry, FolderDescriptor,
            ListMode, ListingPage, ObjectDescriptor, RetentionRecord, RetentionTarget,
            TimestampSource,
        },
        value_objects::{ObjectKey, Prefix},
    },
    ports::{
        services::{
            CandidatesReport, CleanupReport, RetentionService, RetentionSummary,
            SmartCleanupRequest, DEFAULT_PRESIGN_EXPIRY,
        },
        storage::{ListRequest, StorageClient},
    },
};

use super::{
    batch_deleter::BatchDeleter, client_resolver::ClientResolver, enumerator::Enumeration,
};

/// Source of "now" for age computations
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Implementation of RetentionService over resolved storage clients
#[derive(Clone)]
pub struct RetentionServiceImpl {
    allow_list: BucketAllowList,
    resolver: ClientResolver,
    deleter: BatchDeleter,
    clock: Clock,
}

impl RetentionServiceImpl {
    pub fn new(allow_list: BucketAllowList, resolver: ClientResolver, deleter: BatchDeleter) -> Self {
        Self {
            allow_list,
            resolver,
            deleter,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock, e.g. to evaluate retention at a fixed instant
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Allow-list check followed by client resolution
    async fn client_for(&self, bucket: &str) -> RetentionResult<Arc<dyn StorageClient>> {
        let bucket = self.allow_list.check(bucket)?;
        self.resolver.resolve(&bucket).await
    }

    fn parse_prefix(prefix: Option<&str>) -> RetentionResult<Prefix> {
        Prefix::parse(prefix).map_err(|e| RetentionError::InvalidRequest {
            message: format!("Invalid prefix: {}", e),
        })
    }

    fn threshold(&self, days: u32) -> DateTime<Utc> {
        self.now() - ChronoDuration::days(i64::from(days))
    }

    /// Immediate subfolders of `prefix`, decorated with their name timestamps
    async fn list_folders(
        &self,
        client: &Arc<dyn StorageClient>,
        prefix: &Prefix,
    ) -> RetentionResult<Vec<FolderDescriptor>> {
        let mut cursor = Enumeration::new(client.clone(), prefix.clone(), ListMode::Delimited);
        let mut folders = Vec::new();
        while let Some(entry) = cursor.next().await.map_err(|e| list_failed(e, folders.len()))? {
            if let Entry::Folder(folder) = entry {
                folders.push(folder.with_extracted_timestamp());
            }
        }
        Ok(folders)
    }

    /// Every object below `prefix`
    async fn list_objects(
        &self,
        client: &Arc<dyn StorageClient>,
        prefix: &Prefix,
    ) -> RetentionResult<Vec<ObjectDescriptor>> {
        let mut cursor = Enumeration::new(client.clone(), prefix.clone(), ListMode::Recursive);
        let mut objects = Vec::new();
        while let Some(entry) = cursor.next().await.map_err(|e| list_failed(e, objects.len()))? {
            if let Entry::Object(object) = entry {
                objects.push(object);
            }
        }
        Ok(objects)
    }
}

fn list_failed(source: StorageError, scanned: usize) -> RetentionError {
    RetentionError::transport(
        "list_objects",
        source,
        Progress {
            scanned,
            ..Progress::default()
        },
    )
}

fn object_timestamp(object: &ObjectDescriptor, source: TimestampSource) -> Option<DateTime<Utc>> {
    match source {
        TimestampSource::LastModified => object.last_modified,
        TimestampSource::KeyName => extract_timestamp(&object.key),
        TimestampSource::KeyNameOrLastModified => {
            extract_timestamp(&object.key).or(object.last_modified)
        }
    }
}

fn cleanup_report(bucket: &str, summary: DeleteSummary, scanned: usize) -> CleanupReport {
    CleanupReport {
        bucket: bucket.to_string(),
        scanned,
        deleted: summary.deleted,
        batches: summary.batches,
        days: None,
        errors: summary.errors,
    }
}

#[async_trait]
impl RetentionService for RetentionServiceImpl {
    fn allowed_buckets(&self) -> Vec<String> {
        self.allow_list.iter().map(str::to_string).collect()
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        token: Option<&str>,
    ) -> RetentionResult<ListingPage> {
        let prefix = Self::parse_prefix(prefix)?;
        let client = self.client_for(bucket).await?;

        let request = ListRequest {
            prefix: prefix.as_str().to_string(),
            delimited: true,
            continuation_token: token.filter(|t| !t.is_empty()).map(str::to_string),
            max_keys: None,
        };
        let page = client
            .list_page(&request)
            .await
            .map_err(|e| list_failed(e, 0))?;

        let objects = page
            .objects
            .into_iter()
            .filter(|o| !o.is_placeholder() && prefix.contains(&o.key))
            .collect();

        Ok(ListingPage {
            prefix: prefix.as_str().to_string(),
            folders: page.common_prefixes,
            objects,
            is_truncated: page.next_continuation_token.is_some(),
            next_token: page.next_continuation_token,
        })
    }

    #[instrument(skip(self, request), fields(bucket = %request.bucket, dry_run = request.dry_run))]
    async fn smart_cleanup(&self, request: SmartCleanupRequest) -> RetentionResult<RetentionSummary> {
        let prefix = Self::parse_prefix(request.prefix.as_deref())?;
        let client = self.client_for(&request.bucket).await?;
        let now = self.now();

        // Folder listing doubles as the probe for `Auto`.
        let folders = match request.target {
            RetentionTarget::Objects { .. } => None,
            RetentionTarget::Folders | RetentionTarget::Auto => {
                Some(self.list_folders(&client, &prefix).await?)
            }
        };

        let target = match (request.target, &folders) {
            (RetentionTarget::Auto, Some(folders)) => {
                if folders.iter().any(|f| f.timestamp.is_some()) {
                    RetentionTarget::Folders
                } else {
                    RetentionTarget::Objects {
                        timestamp_source: TimestampSource::default(),
                    }
                }
            }
            (target, _) => target,
        };
        debug!(prefix = %prefix, ?target, "Resolved retention target");

        let (scanned, records) = match target {
            RetentionTarget::Objects { timestamp_source } => {
                let objects = self.list_objects(&client, &prefix).await?;
                let scanned = objects.len();
                let records: Vec<RetentionRecord> = objects
                    .into_iter()
                    .filter_map(|o| {
                        let ts = object_timestamp(&o, timestamp_source)?;
                        Some(RetentionRecord::new(o.key, ts, o.size))
                    })
                    .collect();
                (scanned, records)
            }
            _ => {
                let folders = folders.unwrap_or_default();
                let scanned = folders.len();
                let records: Vec<RetentionRecord> = folders
                    .into_iter()
                    .filter_map(|f| Some(RetentionRecord::new(f.prefix, f.timestamp?, 0)))
                    .collect();
                (scanned, records)
            }
        };

        let candidates = records.len();
        let decision = select(records, now);
        let delete_ids = decision.delete_ids();

        let mut summary = RetentionSummary {
            bucket: request.bucket.clone(),
            prefix: prefix.as_str().to_string(),
            target,
            dry_run: request.dry_run,
            scanned,
            candidates,
            excluded: scanned - candidates,
            kept: decision.keep.len(),
            to_delete: delete_ids.len(),
            bytes_to_delete: decision.bytes_to_delete(),
            tiers: decision.tiers,
            keep: decision.keep,
            ..RetentionSummary::default()
        };

        if !request.dry_run && !delete_ids.is_empty() {
            let result = match target {
                RetentionTarget::Objects { .. } => {
                    self.deleter.delete_keys(client.as_ref(), &delete_ids).await?
                }
                _ => self.deleter.delete_prefixes(&client, &delete_ids).await?,
            };
            summary.deleted = result.deleted;
            summary.batches = result.batches;
            summary.errors = result.errors;
        }
        summary.delete = delete_ids;

        info!(
            prefix = %summary.prefix,
            scanned = summary.scanned,
            kept = summary.kept,
            to_delete = summary.to_delete,
            deleted = summary.deleted,
            "Smart cleanup finished"
        );
        Ok(summary)
    }

    async fn cleanup_candidates(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        days: u32,
    ) -> RetentionResult<CandidatesReport> {
        let prefix = Self::parse_prefix(prefix)?;
        let client = self.client_for(bucket).await?;
        let threshold = self.threshold(days);

        let objects = self.list_objects(&client, &prefix).await?;
        let scanned = objects.len();
        let candidates: Vec<ObjectDescriptor> = objects
            .into_iter()
            .filter(|o| o.last_modified.is_some_and(|ts| ts < threshold))
            .collect();

        Ok(CandidatesReport {
            bucket: bucket.to_string(),
            prefix: prefix.as_str().to_string(),
            days,
            scanned,
            total_size: candidates.iter().map(|o| o.size).sum(),
            candidates,
        })
    }

    #[instrument(skip(self))]
    async fn cleanup_older_than(&self, bucket: &str, days: u32) -> RetentionResult<CleanupReport> {
        let client = self.client_for(bucket).await?;
        let threshold = self.threshold(days);

        let entries =
            Enumeration::new(client.clone(), Prefix::root(), ListMode::Recursive).into_stream();
        let (summary, scanned) = self
            .deleter
            .delete_matching(client.as_ref(), entries, |entry| match entry {
                Entry::Object(o) => o.last_modified.is_some_and(|ts| ts < threshold),
                _ => false,
            })
            .await?;

        info!(scanned, deleted = summary.deleted, batches = summary.batches, "Age cleanup finished");
        Ok(CleanupReport {
            days: Some(days),
            ..cleanup_report(bucket, summary, scanned)
        })
    }

    #[instrument(skip(self))]
    async fn delete_all(&self, bucket: &str) -> RetentionResult<CleanupReport> {
        let client = self.client_for(bucket).await?;

        let entries = Enumeration::new(client.clone(), Prefix::root(), ListMode::Recursive)
            .with_placeholders()
            .into_stream();
        let (summary, scanned) = self.deleter.delete_stream(client.as_ref(), entries).await?;

        info!(scanned, deleted = summary.deleted, batches = summary.batches, "Bucket emptied");
        Ok(cleanup_report(bucket, summary, scanned))
    }

    async fn delete_keys(&self, bucket: &str, keys: Vec<String>) -> RetentionResult<CleanupReport> {
        if keys.iter().any(|k| k.is_empty()) {
            return Err(RetentionError::InvalidRequest {
                message: "Keys must not be empty".to_string(),
            });
        }
        let client = self.client_for(bucket).await?;

        let summary = self.deleter.delete_keys(client.as_ref(), &keys).await?;
        Ok(cleanup_report(bucket, summary, keys.len()))
    }

    async fn presign_download(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Option<Duration>,
    ) -> RetentionResult<String> {
        let key = ObjectKey::new(key.to_string()).map_err(|e| RetentionError::InvalidRequest {
            message: format!("Invalid key: {}", e),
        })?;
        if key.is_placeholder() {
            return Err(RetentionError::InvalidRequest {
                message: format!("{} is a folder, not an object", key),
            });
        }
        let client = self.client_for(bucket).await?;
        debug!(bucket, key = %key, file_name = key.file_name(), "Presigning download");

        client
            .presigned_get_url(&key, expires_in.unwrap_or(DEFAULT_PRESIGN_EXPIRY))
            .await
            .map_err(|e| RetentionError::transport("presign", e, Progress::default()))
    }
}

/// Builder for RetentionServiceImpl
#[derive(Default)]
pub struct RetentionServiceBuilder {
    allow_list: Option<BucketAllowList>,
    resolver: Option<ClientResolver>,
    deleter: BatchDeleter,
    clock: Option<Clock>,
}

impl RetentionServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_list(mut self, allow_list: BucketAllowList) -> Self {
        self.allow_list = Some(allow_list);
        self
    }

    pub fn resolver(mut self, resolver: ClientResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn deleter(mut self, deleter: BatchDeleter) -> Self {
        self.deleter = deleter;
        self
    }

    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<RetentionServiceImpl, &'static str> {
        let allow_list = self.allow_list.ok_or("Allow-list is required")?;
        let resolver = self.resolver.ok_or("Resolver is required")?;

        let service = RetentionServiceImpl::new(allow_list, resolver, self.deleter);
        Ok(match self.clock {
            Some(clock) => service.with_clock(clock),
            None => service,
        })
    }
}
