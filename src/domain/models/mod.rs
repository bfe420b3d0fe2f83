pub mod allow_list;
pub mod client_config;
pub mod deletion;
pub mod object;
pub mod retention;
pub mod timestamp;

pub use allow_list::BucketAllowList;
pub use client_config::{ClientConfig, DEFAULT_REGION};
pub use deletion::{DeleteFailure, DeleteSummary};
pub use object::{Entry, FolderDescriptor, ListMode, ListingPage, ObjectDescriptor};
pub use retention::{
    select, RetentionDecision, RetentionRecord, RetentionTarget, Survivor, Tier, TierBucketKey,
    TierStats, TimestampSource,
};
pub use timestamp::{extract_timestamp, folder_timestamp};
