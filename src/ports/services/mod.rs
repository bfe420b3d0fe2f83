mod retention_service;

pub use retention_service::{
    CandidatesReport, CleanupReport, RetentionService, RetentionSummary, SmartCleanupRequest,
    DEFAULT_PRESIGN_EXPIRY,
};
