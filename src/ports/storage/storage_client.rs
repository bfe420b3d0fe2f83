use async_trait::async_trait;
use std::{sync::Arc, time::Duration};

use crate::domain::{
    errors::StorageResult,
    models::{ClientConfig, DeleteFailure, ObjectDescriptor},
    value_objects::{BucketName, ObjectKey},
};

/// Maximum number of keys a single bulk delete call accepts
pub const MAX_DELETE_KEYS: usize = 1000;

/// Parameters of one list call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    pub prefix: String,
    /// Group keys below the next '/' into common prefixes
    pub delimited: bool,
    pub continuation_token: Option<String>,
    pub max_keys: Option<usize>,
}

/// One page returned by the backend
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    pub objects: Vec<ObjectDescriptor>,
    pub common_prefixes: Vec<String>,
    /// Present only when more results remain
    pub next_continuation_token: Option<String>,
}

/// Per-item outcome of a bulk delete call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteObjectsOutput {
    /// Number of keys the backend reported as deleted
    pub deleted: usize,
    pub errors: Vec<DeleteFailure>,
}

/// Port for a bucket-scoped storage client.
///
/// Implementations talk to exactly one endpoint with one set of credentials.
/// An `Err` from any method is a call-level failure; per-key delete failures
/// are reported inside [`DeleteObjectsOutput`].
#[async_trait]
pub trait StorageClient: Send + Sync + 'static {
    /// The bucket this client is bound to
    fn bucket(&self) -> &BucketName;

    /// Human-readable endpoint, never containing credentials
    fn endpoint_label(&self) -> &str;

    /// Cheap existence/permission check for the bound bucket
    async fn head_bucket(&self) -> StorageResult<()>;

    /// Fetch a single page of keys
    async fn list_page(&self, request: &ListRequest) -> StorageResult<ListPage>;

    /// Quiet bulk delete of at most [`MAX_DELETE_KEYS`] keys
    async fn delete_objects(&self, keys: &[String]) -> StorageResult<DeleteObjectsOutput>;

    /// Presigned GET URL for `key`
    async fn presigned_get_url(&self, key: &ObjectKey, expires_in: Duration)
        -> StorageResult<String>;
}

/// Builds storage clients from candidate configurations
#[async_trait]
pub trait ClientFactory: Send + Sync + 'static {
    /// Construct a client without contacting the bucket
    async fn connect(
        &self,
        config: &ClientConfig,
        bucket: &BucketName,
    ) -> StorageResult<Arc<dyn StorageClient>>;
}
