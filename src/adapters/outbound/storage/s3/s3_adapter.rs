//! StorageClient over the AWS SDK.
//!
//! Keys travel byte-for-byte, so folder markers such as `db/2025/` are
//! listed and deleted under their real names, and continuation tokens are
//! the backend's own.

use async_trait::async_trait;
use aws_sdk_s3::{
    presigning::PresigningConfig,
    primitives::DateTime as SdkDateTime,
    types::{Delete, Object, ObjectIdentifier},
    Client,
};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::debug;

use crate::{
    adapters::outbound::storage::error::StoreError,
    domain::{
        errors::{StorageError, StorageResult},
        models::{DeleteFailure, ObjectDescriptor},
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::{DeleteObjectsOutput, ListPage, ListRequest, StorageClient, MAX_DELETE_KEYS},
};

/// Largest page ListObjectsV2 returns
const MAX_LIST_KEYS: usize = 1000;

pub struct S3StorageClient {
    bucket: BucketName,
    endpoint: String,
    client: Client,
}

impl S3StorageClient {
    pub fn new(bucket: BucketName, endpoint: impl Into<String>, client: Client) -> Self {
        Self {
            bucket,
            endpoint: endpoint.into(),
            client,
        }
    }

    fn descriptor(object: &Object) -> Option<ObjectDescriptor> {
        let mut descriptor =
            ObjectDescriptor::new(object.key()?, object.size().unwrap_or(0).max(0) as u64);
        if let Some(last_modified) = object.last_modified().and_then(to_chrono) {
            descriptor = descriptor.with_last_modified(last_modified);
        }
        if let Some(class) = object.storage_class() {
            descriptor = descriptor.with_storage_class(class.as_str());
        }
        Some(descriptor)
    }
}

fn to_chrono(timestamp: &SdkDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

#[async_trait]
impl StorageClient for S3StorageClient {
    fn bucket(&self) -> &BucketName {
        &self.bucket
    }

    fn endpoint_label(&self) -> &str {
        &self.endpoint
    }

    async fn head_bucket(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(self.bucket.as_str())
            .send()
            .await
            .map_err(|e| {
                StoreError::from_sdk("head_bucket", e).into_bucket_error(&self.bucket, "head_bucket")
            })?;
        Ok(())
    }

    async fn list_page(&self, request: &ListRequest) -> StorageResult<ListPage> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(self.bucket.as_str())
            .set_prefix((!request.prefix.is_empty()).then(|| request.prefix.clone()))
            .set_delimiter(request.delimited.then(|| "/".to_string()))
            .set_continuation_token(request.continuation_token.clone())
            .set_max_keys(
                request
                    .max_keys
                    .map(|n| n.clamp(1, MAX_LIST_KEYS) as i32),
            )
            .send()
            .await
            .map_err(|e| {
                StoreError::from_sdk("list_objects", e)
                    .into_bucket_error(&self.bucket, "list_objects")
            })?;

        let next_continuation_token = if output.is_truncated().unwrap_or(false) {
            output.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ListPage {
            objects: output.contents().iter().filter_map(Self::descriptor).collect(),
            common_prefixes: output
                .common_prefixes()
                .iter()
                .filter_map(|p| p.prefix())
                .map(str::to_string)
                .collect(),
            next_continuation_token,
        })
    }

    async fn delete_objects(&self, keys: &[String]) -> StorageResult<DeleteObjectsOutput> {
        if keys.len() > MAX_DELETE_KEYS {
            return Err(StorageError::InvalidKey {
                key: format!("{} keys", keys.len()),
                reason: format!("at most {} keys per delete call", MAX_DELETE_KEYS),
            });
        }

        let mut output = DeleteObjectsOutput::default();
        let mut identifiers = Vec::with_capacity(keys.len());
        for key in keys {
            match ObjectIdentifier::builder().key(key).build() {
                Ok(identifier) => identifiers.push(identifier),
                Err(e) => output
                    .errors
                    .push(DeleteFailure::new(key.clone(), "InvalidKey", e.to_string())),
            }
        }
        if identifiers.is_empty() {
            return Ok(output);
        }

        let requested = identifiers.len();
        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .quiet(true)
            .build()
            .map_err(|e| StorageError::InvalidKey {
                key: format!("{} keys", requested),
                reason: e.to_string(),
            })?;

        // Any Err here is the whole request failing; refused keys come back in the body.
        let response = self
            .client
            .delete_objects()
            .bucket(self.bucket.as_str())
            .delete(delete)
            .send()
            .await
            .map_err(|e| {
                StoreError::from_sdk("delete_objects", e)
                    .into_bucket_error(&self.bucket, "delete_objects")
            })?;

        for error in response.errors() {
            output.errors.push(DeleteFailure::new(
                error.key().unwrap_or_default(),
                error.code().unwrap_or("InternalError"),
                error.message().unwrap_or_default(),
            ));
        }
        // Quiet mode only reports failures.
        output.deleted = requested.saturating_sub(response.errors().len());

        debug!(
            bucket = %self.bucket,
            requested,
            deleted = output.deleted,
            failed = output.errors.len(),
            "Bulk delete"
        );
        Ok(output)
    }

    async fn presigned_get_url(
        &self,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let presigning =
            PresigningConfig::expires_in(expires_in).map_err(|e| StorageError::Configuration {
                message: format!("Invalid presign expiry: {}", e),
            })?;

        let file_name = match key.file_name() {
            "" => "download",
            name => name,
        };
        let request = self
            .client
            .get_object()
            .bucket(self.bucket.as_str())
            .key(key.as_str())
            .response_content_disposition(format!("attachment; filename=\"{}\"", file_name))
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::from(StoreError::from_sdk("presign", e)))?;

        Ok(request.uri().to_string())
    }
}
