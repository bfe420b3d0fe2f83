// Infrastructure error types
pub mod error;

// Storage implementations
pub mod in_memory;
pub mod object_store_client;

// Provider-specific implementations
pub mod s3;

// Re-export key types
pub use error::StoreError;
pub use in_memory::InMemoryClientFactory;
pub use object_store_client::ObjectStoreClient;
pub use s3::{S3ClientFactory, S3StorageClient};
