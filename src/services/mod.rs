mod batch_deleter;
mod client_resolver;
mod enumerator;
mod retention_service_impl;

pub use batch_deleter::{BatchDeleter, DEFAULT_PREFIX_BATCH_SIZE};
pub use client_resolver::ClientResolver;
pub use enumerator::{enumerate, Enumeration};
pub use retention_service_impl::{Clock, RetentionServiceBuilder, RetentionServiceImpl};
