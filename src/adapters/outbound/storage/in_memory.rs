use async_trait::async_trait;
use object_store::memory::InMemory;
use std::{collections::HashMap, sync::Arc};

use super::{error::StoreError, object_store_client::ObjectStoreClient};
use crate::{
    domain::{errors::StorageResult, models::ClientConfig, value_objects::BucketName},
    ports::storage::{ClientFactory, StorageClient},
};

/// Client factory over process-local `InMemory` stores, one per bucket.
///
/// Buckets are registered up front; connecting to any other bucket fails,
/// which the resolver treats like an unreachable endpoint.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClientFactory {
    stores: HashMap<String, Arc<InMemory>>,
}

impl InMemoryClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty bucket
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.stores
            .entry(bucket.into())
            .or_insert_with(|| Arc::new(InMemory::new()));
        self
    }

    /// The store behind a registered bucket, for seeding data
    pub fn store(&self, bucket: &str) -> Option<Arc<InMemory>> {
        self.stores.get(bucket).cloned()
    }
}

#[async_trait]
impl ClientFactory for InMemoryClientFactory {
    async fn connect(
        &self,
        _config: &ClientConfig,
        bucket: &BucketName,
    ) -> StorageResult<Arc<dyn StorageClient>> {
        let store = self.store(bucket.as_str()).ok_or_else(|| {
            StoreError::UnknownBucket(bucket.to_string()).into_bucket_error(bucket, "connect")
        })?;

        Ok(Arc::new(ObjectStoreClient::new(
            bucket.clone(),
            "memory",
            store,
        )))
    }
}
