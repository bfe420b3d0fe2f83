use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    domain::{
        errors::{RetentionError, RetentionResult, StorageError},
        models::ClientConfig,
        value_objects::BucketName,
    },
    ports::storage::{ClientFactory, StorageClient},
};

/// Finds the first configured endpoint/credential pair that can reach a bucket.
///
/// Candidates are probed in configuration order, one at a time. Nothing is
/// cached, so every call probes again.
#[derive(Clone)]
pub struct ClientResolver {
    configs: Arc<[ClientConfig]>,
    factory: Arc<dyn ClientFactory>,
}

impl ClientResolver {
    pub fn new(configs: Vec<ClientConfig>, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            configs: configs.into(),
            factory,
        }
    }

    pub async fn resolve(&self, bucket: &BucketName) -> RetentionResult<Arc<dyn StorageClient>> {
        let mut last_error: Option<StorageError> = None;

        for (attempt, config) in self.configs.iter().enumerate() {
            debug!(
                bucket = %bucket,
                endpoint = config.label(),
                attempt = attempt + 1,
                "Probing client candidate"
            );

            let client = match self.factory.connect(config, bucket).await {
                Ok(client) => client,
                Err(e) => {
                    warn!(bucket = %bucket, endpoint = config.label(), error = %e, "Client construction failed");
                    last_error = Some(e);
                    continue;
                }
            };

            match client.head_bucket().await {
                Ok(()) => {
                    info!(bucket = %bucket, endpoint = client.endpoint_label(), "Resolved client");
                    return Ok(client);
                }
                Err(e) => {
                    warn!(bucket = %bucket, endpoint = config.label(), error = %e, "Bucket probe failed");
                    last_error = Some(e);
                }
            }
        }

        Err(RetentionError::NoUsableClient {
            bucket: bucket.clone(),
            attempts: self.configs.len(),
            last_error,
        })
    }
}
