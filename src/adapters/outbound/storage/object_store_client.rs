use async_trait::async_trait;
use futures::{stream, StreamExt, TryStreamExt};
use object_store::{path::Path as ObjectPath, ObjectMeta, ObjectStore};
use std::{sync::Arc, time::Duration};
use tracing::debug;

use super::error::StoreError;
use crate::{
    domain::{
        errors::{StorageError, StorageResult},
        models::{DeleteFailure, ObjectDescriptor},
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::{DeleteObjectsOutput, ListPage, ListRequest, StorageClient, MAX_DELETE_KEYS},
};

/// Keys per page when the caller does not bound the listing
const DEFAULT_PAGE_SIZE: usize = 1000;

/// StorageClient over a process-local `object_store` backend bound to one bucket.
///
/// `object_store` paginates internally, so continuation tokens are emulated:
/// the token is the last key (or common prefix) of the previous page and the
/// next page resumes after it. Paths cannot hold a key ending in '/', so such
/// keys are never listed and are refused on delete rather than normalised.
pub struct ObjectStoreClient {
    bucket: BucketName,
    endpoint: String,
    inner: Arc<dyn ObjectStore>,
}

impl ObjectStoreClient {
    pub fn new(bucket: BucketName, endpoint: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            bucket,
            endpoint: endpoint.into(),
            inner: store,
        }
    }

    /// Parse `key` into a path that names exactly the same object
    fn path(key: &str) -> Result<ObjectPath, StoreError> {
        let path = ObjectPath::parse(key).map_err(|e| StoreError::InvalidPath {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        // `parse` drops a trailing '/', which would address a different object.
        if path.as_ref() != key {
            return Err(StoreError::InvalidPath {
                key: key.to_string(),
                reason: "not representable as an object path".to_string(),
            });
        }
        Ok(path)
    }

    fn prefix_path(prefix: &str) -> Result<Option<ObjectPath>, StoreError> {
        let trimmed = prefix.trim_end_matches('/');
        if trimmed.is_empty() {
            Ok(None)
        } else {
            Self::path(trimmed).map(Some)
        }
    }

    fn descriptor(meta: ObjectMeta) -> ObjectDescriptor {
        ObjectDescriptor::new(meta.location.to_string(), meta.size)
            .with_last_modified(meta.last_modified)
    }

    async fn list_delimited(
        &self,
        prefix: Option<&ObjectPath>,
        token: Option<&str>,
        max_keys: usize,
    ) -> StorageResult<ListPage> {
        let result = self
            .inner
            .list_with_delimiter(prefix)
            .await
            .map_err(|e| StoreError::from(e).into_bucket_error(&self.bucket, "list_objects"))?;

        // Objects and common prefixes share one key order, as in ListObjectsV2.
        let mut entries: Vec<(String, Option<ObjectDescriptor>)> = result
            .objects
            .into_iter()
            .map(|meta| {
                let descriptor = Self::descriptor(meta);
                (descriptor.key.clone(), Some(descriptor))
            })
            .chain(
                result
                    .common_prefixes
                    .into_iter()
                    .map(|p| (format!("{}/", p), None)),
            )
            .filter(|(name, _)| token.map_or(true, |t| name.as_str() > t))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let truncated = entries.len() > max_keys;
        entries.truncate(max_keys);
        let next_continuation_token = if truncated {
            entries.last().map(|(name, _)| name.clone())
        } else {
            None
        };

        let mut page = ListPage {
            next_continuation_token,
            ..ListPage::default()
        };
        for (name, object) in entries {
            match object {
                Some(object) => page.objects.push(object),
                None => page.common_prefixes.push(name),
            }
        }
        Ok(page)
    }

    async fn list_recursive(
        &self,
        prefix: Option<&ObjectPath>,
        token: Option<&str>,
        max_keys: usize,
    ) -> StorageResult<ListPage> {
        let offset = token.map(Self::path).transpose()?;
        let mut listing = match &offset {
            Some(offset) => self.inner.list_with_offset(prefix, offset),
            None => self.inner.list(prefix),
        };

        let mut objects = Vec::with_capacity(max_keys.min(DEFAULT_PAGE_SIZE));
        let mut truncated = false;
        while let Some(meta) = listing
            .try_next()
            .await
            .map_err(|e| StoreError::from(e).into_bucket_error(&self.bucket, "list_objects"))?
        {
            if objects.len() == max_keys {
                truncated = true;
                break;
            }
            objects.push(Self::descriptor(meta));
        }

        // Resumption relies on key order; sort in case the backend did not.
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        let next_continuation_token = if truncated {
            objects.last().map(|o| o.key.clone())
        } else {
            None
        };

        Ok(ListPage {
            objects,
            common_prefixes: Vec::new(),
            next_continuation_token,
        })
    }
}

#[async_trait]
impl StorageClient for ObjectStoreClient {
    fn bucket(&self) -> &BucketName {
        &self.bucket
    }

    fn endpoint_label(&self) -> &str {
        &self.endpoint
    }

    async fn head_bucket(&self) -> StorageResult<()> {
        // object_store has no bucket-level call; one list request proves access.
        let mut listing = self.inner.list(None);
        match listing.next().await {
            None | Some(Ok(_)) => Ok(()),
            Some(Err(e)) => Err(StoreError::from(e).into_bucket_error(&self.bucket, "head_bucket")),
        }
    }

    async fn list_page(&self, request: &ListRequest) -> StorageResult<ListPage> {
        let prefix = Self::prefix_path(&request.prefix)?;
        let token = request.continuation_token.as_deref();
        let max_keys = request.max_keys.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        if request.delimited {
            self.list_delimited(prefix.as_ref(), token, max_keys).await
        } else {
            self.list_recursive(prefix.as_ref(), token, max_keys).await
        }
    }

    async fn delete_objects(&self, keys: &[String]) -> StorageResult<DeleteObjectsOutput> {
        if keys.len() > MAX_DELETE_KEYS {
            return Err(StorageError::InvalidKey {
                key: format!("{} keys", keys.len()),
                reason: format!("at most {} keys per delete call", MAX_DELETE_KEYS),
            });
        }

        let mut output = DeleteObjectsOutput::default();
        let mut paths = Vec::with_capacity(keys.len());
        for key in keys {
            match Self::path(key) {
                Ok(path) => paths.push(path),
                Err(e) => output
                    .errors
                    .push(DeleteFailure::new(key.clone(), "InvalidKey", e.to_string())),
            }
        }
        if paths.is_empty() {
            return Ok(output);
        }

        let requested = paths.len();
        let locations = stream::iter(paths.into_iter().map(Ok)).boxed();
        let mut results = self.inner.delete_stream(locations);

        // Local stores have no per-key failure report: any error fails the call.
        let mut deleted = 0;
        while let Some(result) = results.next().await {
            match result {
                Ok(_) | Err(object_store::Error::NotFound { .. }) => deleted += 1,
                Err(e) => {
                    return Err(StoreError::from(e).into_bucket_error(&self.bucket, "delete_objects"))
                }
            }
        }

        output.deleted = deleted;
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
        debug!(bucket = %self.bucket, key = %key, ?expires_in, "Presign requested");
        Err(StorageError::UnsupportedOperation {
            operation: "presigned_url".to_string(),
            reason: "Not supported by this backend".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::{memory::InMemory, PutPayload};

    async fn client_with(keys: &[&str]) -> ObjectStoreClient {
        let store = Arc::new(InMemory::new());
        for key in keys {
            store
                .put(&ObjectPath::from(*key), PutPayload::from_static(b"data"))
                .await
                .unwrap();
        }
        ObjectStoreClient::new(
            BucketName::new("backups".to_string()).unwrap(),
            "memory",
            store,
        )
    }

    #[tokio::test]
    async fn test_recursive_pages_resume_after_token() {
        let client = client_with(&["a/1", "a/2", "a/3", "b/1"]).await;
        let mut request = ListRequest {
            prefix: "a/".to_string(),
            max_keys: Some(2),
            ..ListRequest::default()
        };

        let first = client.list_page(&request).await.unwrap();
        let keys: Vec<_> = first.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a/1", "a/2"]);
        assert_eq!(first.next_continuation_token.as_deref(), Some("a/2"));

        request.continuation_token = first.next_continuation_token;
        let second = client.list_page(&request).await.unwrap();
        assert_eq!(second.objects.len(), 1);
        assert_eq!(second.objects[0].key, "a/3");
        assert!(second.next_continuation_token.is_none());
    }

    #[tokio::test]
    async fn test_delimited_listing() {
        let client = client_with(&["root.txt", "runs/x/1", "runs/y/1"]).await;
        let page = client
            .list_page(&ListRequest {
                prefix: "runs/".to_string(),
                delimited: true,
                ..ListRequest::default()
            })
            .await
            .unwrap();

        assert!(page.objects.is_empty());
        assert_eq!(page.common_prefixes, vec!["runs/x/", "runs/y/"]);
    }

    #[tokio::test]
    async fn test_delimited_listing_pages_after_token() {
        let client = client_with(&["runs/a/1", "runs/b/1", "runs/c.txt", "runs/d/1"]).await;
        let mut request = ListRequest {
            prefix: "runs/".to_string(),
            delimited: true,
            max_keys: Some(2),
            ..ListRequest::default()
        };

        let first = client.list_page(&request).await.unwrap();
        assert_eq!(first.common_prefixes, vec!["runs/a/", "runs/b/"]);
        assert!(first.objects.is_empty());
        assert_eq!(first.next_continuation_token.as_deref(), Some("runs/b/"));

        request.continuation_token = first.next_continuation_token;
        let second = client.list_page(&request).await.unwrap();
        assert_eq!(second.objects.len(), 1);
        assert_eq!(second.objects[0].key, "runs/c.txt");
        assert_eq!(second.common_prefixes, vec!["runs/d/"]);
        assert!(second.next_continuation_token.is_none());
    }

    #[tokio::test]
    async fn test_delete_refuses_folder_marker_key() {
        let store = Arc::new(InMemory::new());
        for key in ["logs", "logs/app.log"] {
            store
                .put(&ObjectPath::from(key), PutPayload::from_static(b"data"))
                .await
                .unwrap();
        }
        let client = ObjectStoreClient::new(
            BucketName::new("backups".to_string()).unwrap(),
            "memory",
            store.clone(),
        );

        let output = client.delete_objects(&["logs/".to_string()]).await.unwrap();
        assert_eq!(output.deleted, 0);
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].key, "logs/");
        assert_eq!(output.errors[0].code, "InvalidKey");

        // The sibling object the marker name would collapse to is untouched.
        assert!(store.head(&ObjectPath::from("logs")).await.is_ok());
        assert!(store.head(&ObjectPath::from("logs/app.log")).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_missing_key_counts_as_deleted() {
        let client = client_with(&["a/1"]).await;
        let output = client
            .delete_objects(&["a/1".to_string(), "a/gone".to_string()])
            .await
            .unwrap();
        assert_eq!(output.deleted, 2);
        assert!(output.errors.is_empty());
    }

    #[tokio::test]
    async fn test_delete_objects_counts() {
        let client = client_with(&["a/1", "a/2"]).await;
        let output = client
            .delete_objects(&["a/1".to_string(), "a/2".to_string()])
            .await
            .unwrap();
        assert_eq!(output.deleted, 2);
        assert!(output.errors.is_empty());

        let rest = client.list_page(&ListRequest::default()).await.unwrap();
        assert!(rest.objects.is_empty());
    }

    #[tokio::test]
    async fn test_presign_is_unsupported() {
        let client = client_with(&[]).await;
        let key = ObjectKey::new("a/1".to_string()).unwrap();
        let err = client
            .presigned_get_url(&key, Duration::from_secs(60))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NotImplemented");
    }
}
