use async_trait::async_trait;
use bon::Builder;
use serde::Serialize;
use std::{collections::BTreeMap, time::Duration};

use crate::domain::{
    errors::RetentionResult,
    models::{
        DeleteFailure, ListingPage, ObjectDescriptor, RetentionTarget, Survivor, Tier, TierStats,
    },
};

/// Lifetime of download URLs when the caller does not specify one
pub const DEFAULT_PRESIGN_EXPIRY: Duration = Duration::from_secs(300);

/// Service port for retention and cleanup operations.
///
/// Every operation checks the bucket against the allow-list first and then
/// resolves a client for it; a rejected bucket never reaches the backend.
#[async_trait]
pub trait RetentionService: Send + Sync + 'static {
    /// Buckets callers may operate on
    fn allowed_buckets(&self) -> Vec<String>;

    /// One delimited page below `prefix`
    async fn list_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        token: Option<&str>,
    ) -> RetentionResult<ListingPage>;

    /// Tiered retention below a prefix
    async fn smart_cleanup(&self, request: SmartCleanupRequest) -> RetentionResult<RetentionSummary>;

    /// Objects below `prefix` last modified more than `days` ago, without deleting
    async fn cleanup_candidates(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        days: u32,
    ) -> RetentionResult<CandidatesReport>;

    /// Delete every object in the bucket last modified more than `days` ago
    async fn cleanup_older_than(&self, bucket: &str, days: u32) -> RetentionResult<CleanupReport>;

    /// Delete every object in the bucket
    async fn delete_all(&self, bucket: &str) -> RetentionResult<CleanupReport>;

    /// Delete an explicit list of keys
    async fn delete_keys(&self, bucket: &str, keys: Vec<String>) -> RetentionResult<CleanupReport>;

    /// Presigned download URL, valid for `expires_in` or [`DEFAULT_PRESIGN_EXPIRY`]
    async fn presign_download(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Option<Duration>,
    ) -> RetentionResult<String>;
}

/// Parameters of a tiered retention pass
#[derive(Debug, Clone, Builder)]
pub struct SmartCleanupRequest {
    #[builder(into)]
    pub bucket: String,
    #[builder(into)]
    pub prefix: Option<String>,
    #[builder(default)]
    pub target: RetentionTarget,
    /// Compute the decision but skip deletion
    #[builder(default)]
    pub dry_run: bool,
}

/// Outcome of a tiered retention pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetentionSummary {
    pub bucket: String,
    pub prefix: String,
    /// The target actually used; `auto` is resolved before selection
    pub target: RetentionTarget,
    pub dry_run: bool,
    /// Entries seen below the prefix
    pub scanned: usize,
    /// Entries that carried a usable timestamp
    pub candidates: usize,
    /// Entries left untouched for lack of a timestamp
    pub excluded: usize,
    pub kept: usize,
    pub to_delete: usize,
    pub bytes_to_delete: u64,
    pub tiers: BTreeMap<Tier, TierStats>,
    pub deleted: usize,
    pub batches: usize,
    pub errors: Vec<DeleteFailure>,
    pub keep: Vec<Survivor>,
    pub delete: Vec<String>,
}

/// Preview of age-based cleanup
#[derive(Debug, Clone, Serialize)]
pub struct CandidatesReport {
    pub bucket: String,
    pub prefix: String,
    pub days: u32,
    pub scanned: usize,
    pub total_size: u64,
    pub candidates: Vec<ObjectDescriptor>,
}

/// Outcome of a bulk deletion
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub bucket: String,
    pub scanned: usize,
    pub deleted: usize,
    pub batches: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    pub errors: Vec<DeleteFailure>,
}
