pub mod adapters;
pub mod app;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - core business entities and value objects
pub use domain::{
    // Models
    extract_timestamp,
    folder_timestamp,
    select,
    BucketAllowList,
    // Value objects
    BucketName,
    ClientConfig,
    DeleteFailure,
    DeleteSummary,
    Entry,
    FolderDescriptor,
    ListMode,
    ObjectDescriptor,
    ObjectKey,
    Prefix,
    // Errors
    Progress,
    RetentionDecision,
    RetentionError,
    RetentionRecord,
    RetentionResult,
    RetentionTarget,
    StorageError,
    Tier,
    TierBucketKey,
    TimestampSource,
};

// Port types - interfaces for external systems
pub use ports::{
    // Storage ports
    ClientFactory,
    // Service ports
    RetentionService,
    SmartCleanupRequest,
    StorageClient,
};

// Service implementations - business logic
pub use services::{enumerate, BatchDeleter, ClientResolver, Enumeration, RetentionServiceImpl};

// Application factory and configuration
pub use app::{
    create_app_from_env, create_in_memory_app, AppBuilder, AppConfig, AppError, StorageBackend,
};

// Adapter types - infrastructure implementations
pub use adapters::outbound::storage::{
    InMemoryClientFactory, ObjectStoreClient, S3ClientFactory, S3StorageClient,
};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        create_app_from_env, create_in_memory_app, AppBuilder, BucketName, ClientConfig,
        ClientResolver, RetentionService, RetentionServiceImpl, RetentionTarget,
        SmartCleanupRequest, StorageClient, TimestampSource,
    };
}
