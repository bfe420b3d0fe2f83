//! S3 client construction using the AWS SDK

mod s3_adapter;

pub use s3_adapter::S3StorageClient;

use async_trait::async_trait;
use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region};
use aws_credential_types::Credentials;
use std::{sync::Arc, time::Duration};

use crate::{
    domain::{errors::StorageResult, models::ClientConfig, value_objects::BucketName},
    ports::storage::{ClientFactory, StorageClient},
};

/// Retries per request before a call is reported as failed
pub const DEFAULT_MAX_RETRIES: u32 = 10;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Builds S3 clients with path-style addressing
#[derive(Debug, Clone)]
pub struct S3ClientFactory {
    max_retries: u32,
}

impl Default for S3ClientFactory {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl S3ClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// SDK configuration for one candidate endpoint/credential pair
    pub async fn sdk_config(&self, config: &ClientConfig) -> aws_sdk_s3::Config {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .retry_config(RetryConfig::standard().with_max_attempts(self.max_retries + 1))
            .timeout_config(
                TimeoutConfig::builder()
                    .connect_timeout(CONNECT_TIMEOUT)
                    .read_timeout(READ_TIMEOUT)
                    .build(),
            );

        // Without both keys, fall back to the ambient AWS credential chain.
        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                "s3-retention-config",
            ));
        }

        let sdk_config = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(true);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        builder.build()
    }
}

#[async_trait]
impl ClientFactory for S3ClientFactory {
    async fn connect(
        &self,
        config: &ClientConfig,
        bucket: &BucketName,
    ) -> StorageResult<Arc<dyn StorageClient>> {
        let client = aws_sdk_s3::Client::from_conf(self.sdk_config(config).await);
        Ok(Arc::new(S3StorageClient::new(
            bucket.clone(),
            config.label(),
            client,
        )))
    }
}
