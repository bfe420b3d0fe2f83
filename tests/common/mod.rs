#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use s3_retention::{
    domain::{
        errors::{StorageError, StorageResult},
        models::{BucketAllowList, ClientConfig, DeleteFailure, ObjectDescriptor},
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::{ClientFactory, DeleteObjectsOutput, ListPage, ListRequest, StorageClient},
    services::{BatchDeleter, ClientResolver, Clock, RetentionServiceImpl},
};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

pub fn utc(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
}

pub fn fixed_clock(now: DateTime<Utc>) -> Clock {
    Arc::new(move || now)
}

pub fn bucket(name: &str) -> BucketName {
    BucketName::new(name.to_string()).unwrap()
}

/// Calls observed by a [`FakeClient`]
#[derive(Debug, Default)]
pub struct Calls {
    pub heads: usize,
    pub lists: Vec<ListRequest>,
    pub deletes: Vec<Vec<String>>,
}

/// In-process S3 imitation that records every call.
///
/// Listing follows ListObjectsV2: keys in lexicographic order, common
/// prefixes rolled up under the delimiter, and opaque continuation tokens.
pub struct FakeClient {
    bucket: BucketName,
    endpoint: String,
    page_size: usize,
    head_error: Option<StorageError>,
    rejected: HashSet<String>,
    fail_delete_call: Option<usize>,
    fail_list_call: Option<usize>,
    objects: Mutex<BTreeMap<String, ObjectDescriptor>>,
    calls: Mutex<Calls>,
}

impl FakeClient {
    pub fn new(bucket_name: &str, endpoint: &str) -> Self {
        Self {
            bucket: bucket(bucket_name),
            endpoint: endpoint.to_string(),
            page_size: 1000,
            head_error: None,
            rejected: HashSet::new(),
            fail_delete_call: None,
            fail_list_call: None,
            objects: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Calls::default()),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Make the bucket probe fail
    pub fn unreachable(mut self, error: StorageError) -> Self {
        self.head_error = Some(error);
        self
    }

    /// Report these keys as per-item delete failures
    pub fn rejecting<I: IntoIterator<Item = &'static str>>(mut self, keys: I) -> Self {
        self.rejected = keys.into_iter().map(str::to_string).collect();
        self
    }

    /// Fail the n-th delete call (1-based) outright
    pub fn failing_delete_call(mut self, n: usize) -> Self {
        self.fail_delete_call = Some(n);
        self
    }

    /// Fail the n-th list call (1-based) outright
    pub fn failing_list_call(mut self, n: usize) -> Self {
        self.fail_list_call = Some(n);
        self
    }

    pub fn with_object(self, key: &str, size: u64, last_modified: DateTime<Utc>) -> Self {
        self.insert(ObjectDescriptor::new(key, size).with_last_modified(last_modified));
        self
    }

    pub fn with_objects<I, S>(self, keys: I, last_modified: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            self.insert(ObjectDescriptor::new(key.as_ref(), 1).with_last_modified(last_modified));
        }
        self
    }

    pub fn insert(&self, object: ObjectDescriptor) {
        self.objects
            .lock()
            .unwrap()
            .insert(object.key.clone(), object);
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn heads(&self) -> usize {
        self.calls.lock().unwrap().heads
    }

    pub fn list_calls(&self) -> Vec<ListRequest> {
        self.calls.lock().unwrap().lists.clone()
    }

    pub fn delete_calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().deletes.clone()
    }

    pub fn total_calls(&self) -> usize {
        let calls = self.calls.lock().unwrap();
        calls.heads + calls.lists.len() + calls.deletes.len()
    }
}

enum Item {
    Object(ObjectDescriptor),
    Prefix(String),
}

impl Item {
    fn sort_key(&self) -> &str {
        match self {
            Item::Object(o) => &o.key,
            Item::Prefix(p) => p,
        }
    }
}

#[async_trait]
impl StorageClient for FakeClient {
    fn bucket(&self) -> &BucketName {
        &self.bucket
    }

    fn endpoint_label(&self) -> &str {
        &self.endpoint
    }

    async fn head_bucket(&self) -> StorageResult<()> {
        self.calls.lock().unwrap().heads += 1;
        match &self.head_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn list_page(&self, request: &ListRequest) -> StorageResult<ListPage> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.lists.push(request.clone());
            calls.lists.len()
        };
        if self.fail_list_call == Some(call) {
            return Err(StorageError::InfrastructureError {
                message: "connection reset".to_string(),
                source: None,
            });
        }

        let objects = self.objects.lock().unwrap();
        let mut prefixes = BTreeSet::new();
        let mut items = Vec::new();
        for (key, object) in objects.range(request.prefix.clone()..) {
            let Some(rest) = key.strip_prefix(&request.prefix) else {
                break;
            };
            match rest.find('/') {
                Some(idx) if request.delimited => {
                    prefixes.insert(format!("{}{}", request.prefix, &rest[..=idx]));
                }
                _ => items.push(Item::Object(object.clone())),
            }
        }
        items.extend(prefixes.into_iter().map(Item::Prefix));
        items.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));

        let start = request.continuation_token.as_deref();
        let limit = request.max_keys.unwrap_or(self.page_size).min(self.page_size);
        let mut remaining = items
            .into_iter()
            .filter(|item| start.map_or(true, |token| item.sort_key() > token))
            .peekable();

        let mut page = ListPage::default();
        let mut last = None;
        for _ in 0..limit {
            let Some(item) = remaining.next() else {
                break;
            };
            last = Some(item.sort_key().to_string());
            match item {
                Item::Object(o) => page.objects.push(o),
                Item::Prefix(p) => page.common_prefixes.push(p),
            }
        }
        if remaining.peek().is_some() {
            page.next_continuation_token = last;
        }
        Ok(page)
    }

    async fn delete_objects(&self, keys: &[String]) -> StorageResult<DeleteObjectsOutput> {
        assert!(keys.len() <= 1000, "delete call exceeded 1000 keys");
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.deletes.push(keys.to_vec());
            calls.deletes.len()
        };
        if self.fail_delete_call == Some(call) {
            return Err(StorageError::InfrastructureError {
                message: "connection reset".to_string(),
                source: None,
            });
        }

        let mut objects = self.objects.lock().unwrap();
        let mut output = DeleteObjectsOutput::default();
        for key in keys {
            if self.rejected.contains(key) {
                output
                    .errors
                    .push(DeleteFailure::new(key.clone(), "AccessDenied", "Access Denied"));
            } else {
                objects.remove(key);
                output.deleted += 1;
            }
        }
        Ok(output)
    }

    async fn presigned_get_url(
        &self,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> StorageResult<String> {
        Ok(format!(
            "{}/{}/{}?X-Amz-Expires={}",
            self.endpoint,
            self.bucket,
            key,
            expires_in.as_secs()
        ))
    }
}

/// Hands out pre-built fake clients by endpoint label
#[derive(Default)]
pub struct FakeFactory {
    clients: HashMap<String, Arc<FakeClient>>,
    broken: HashSet<String>,
    connects: Mutex<Vec<String>>,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(mut self, client: Arc<FakeClient>) -> Self {
        self.clients.insert(client.endpoint_label().to_string(), client);
        self
    }

    /// Client construction fails for this endpoint
    pub fn with_broken(mut self, endpoint: &str) -> Self {
        self.broken.insert(endpoint.to_string());
        self
    }

    pub fn connects(&self) -> Vec<String> {
        self.connects.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClientFactory for FakeFactory {
    async fn connect(
        &self,
        config: &ClientConfig,
        _bucket: &BucketName,
    ) -> StorageResult<Arc<dyn StorageClient>> {
        let label = config.label().to_string();
        self.connects.lock().unwrap().push(label.clone());
        if self.broken.contains(&label) {
            return Err(StorageError::Configuration {
                message: format!("cannot build client for {}", label),
            });
        }
        self.clients
            .get(&label)
            .cloned()
            .map(|c| c as Arc<dyn StorageClient>)
            .ok_or_else(|| StorageError::Configuration {
                message: format!("no fake registered for {}", label),
            })
    }
}

pub fn endpoint(label: &str) -> ClientConfig {
    ClientConfig::default().with_endpoint(label)
}

/// A service over a single fake client, with every bucket of `allowed` permitted
pub fn service_with(
    client: Arc<FakeClient>,
    allowed: &[&str],
    now: DateTime<Utc>,
) -> (RetentionServiceImpl, Arc<FakeFactory>) {
    let label = client.endpoint_label().to_string();
    let factory = Arc::new(FakeFactory::new().with_client(client));
    let resolver = ClientResolver::new(vec![endpoint(&label)], factory.clone());
    let service = RetentionServiceImpl::new(
        BucketAllowList::new(allowed.iter().copied()),
        resolver,
        BatchDeleter::new(),
    )
    .with_clock(fixed_clock(now));
    (service, factory)
}
