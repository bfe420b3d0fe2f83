use std::sync::Arc;

use crate::{
    adapters::outbound::storage::{InMemoryClientFactory, S3ClientFactory},
    config::EnvConfig,
    domain::models::{BucketAllowList, ClientConfig},
    ports::storage::ClientFactory,
    services::{
        BatchDeleter, ClientResolver, Clock, RetentionServiceBuilder, RetentionServiceImpl,
    },
};

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    /// Candidate endpoint/credential pairs, probed in order
    pub clients: Vec<ClientConfig>,
    pub allow_list: BucketAllowList,
    pub delete_batch_size: usize,
    pub prefix_batch_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        let deleter = BatchDeleter::default();
        Self {
            storage_backend: StorageBackend::S3,
            clients: vec![ClientConfig::default()],
            allow_list: BucketAllowList::default(),
            delete_batch_size: deleter.batch_size(),
            prefix_batch_size: deleter.prefix_batch_size(),
        }
    }
}

impl From<EnvConfig> for AppConfig {
    fn from(env: EnvConfig) -> Self {
        Self {
            storage_backend: StorageBackend::S3,
            clients: env.clients,
            allow_list: env.allow_list,
            delete_batch_size: env.delete_batch_size,
            prefix_batch_size: env.prefix_batch_size,
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// Process-local buckets, for tests and dry experiments
    InMemory(InMemoryClientFactory),
    S3,
}

/// Application builder for dependency injection
pub struct AppBuilder {
    config: AppConfig,
    factory: Option<Arc<dyn ClientFactory>>,
    clock: Option<Clock>,
}

impl AppBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            factory: None,
            clock: None,
        }
    }

    /// Configure the application with custom settings
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure storage backend
    pub fn with_storage_backend(mut self, backend: StorageBackend) -> Self {
        self.config.storage_backend = backend;
        self
    }

    pub fn with_allow_list(mut self, allow_list: BucketAllowList) -> Self {
        self.config.allow_list = allow_list;
        self
    }

    pub fn with_clients(mut self, clients: Vec<ClientConfig>) -> Self {
        self.config.clients = clients;
        self
    }

    /// Use a custom client factory instead of the configured backend
    pub fn with_client_factory(mut self, factory: Arc<dyn ClientFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the retention service
    pub fn build(self) -> Result<RetentionServiceImpl, AppError> {
        if self.config.clients.is_empty() {
            return Err(AppError::Configuration {
                message: "At least one client configuration is required".to_string(),
            });
        }

        let factory = match self.factory {
            Some(factory) => factory,
            None => match self.config.storage_backend {
                StorageBackend::InMemory(factory) => Arc::new(factory) as Arc<dyn ClientFactory>,
                StorageBackend::S3 => Arc::new(S3ClientFactory::new()) as Arc<dyn ClientFactory>,
            },
        };

        let resolver = ClientResolver::new(self.config.clients, factory);
        let deleter = BatchDeleter::new()
            .with_batch_size(self.config.delete_batch_size)
            .with_prefix_batch_size(self.config.prefix_batch_size);

        let mut builder = RetentionServiceBuilder::new()
            .allow_list(self.config.allow_list)
            .resolver(resolver)
            .deleter(deleter);
        if let Some(clock) = self.clock {
            builder = builder.clock(clock);
        }
        builder.build().map_err(|message| AppError::ServiceInit {
            message: message.to_string(),
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    ServiceInit { message: String },
}

/// Create an in-memory application over the given buckets, all allowed
pub fn create_in_memory_app(
    buckets: &[&str],
) -> Result<(RetentionServiceImpl, InMemoryClientFactory), AppError> {
    let factory = buckets
        .iter()
        .fold(InMemoryClientFactory::new(), |f, b| f.with_bucket(*b));

    let service = AppBuilder::new()
        .with_storage_backend(StorageBackend::InMemory(factory.clone()))
        .with_allow_list(BucketAllowList::new(buckets.iter().copied()))
        .build()?;
    Ok((service, factory))
}

/// Create application from environment variables
pub fn create_app_from_env() -> Result<RetentionServiceImpl, AppError> {
    let config = EnvConfig::from_env()?;
    AppBuilder::new().with_config(config.into()).build()
}
