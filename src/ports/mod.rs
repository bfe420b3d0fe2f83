pub mod services;
pub mod storage;

// Re-export all port traits for convenience
pub use services::{
    CandidatesReport, CleanupReport, RetentionService, RetentionSummary, SmartCleanupRequest,
};
pub use storage::{ClientFactory, DeleteObjectsOutput, ListPage, ListRequest, StorageClient};
