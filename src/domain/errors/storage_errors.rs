use crate::domain::value_objects::BucketName;

/// Errors that can occur during storage backend operations
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// Bucket does not exist on the endpoint that was asked
    BucketNotFound { bucket: BucketName },

    /// Object not found
    ObjectNotFound { key: String },

    /// Credentials were rejected for the operation
    AccessDenied { bucket: BucketName, operation: String },

    /// Key or prefix cannot be addressed by this backend
    InvalidKey { key: String, reason: String },

    /// Client could not be constructed from its configuration
    Configuration { message: String },

    /// Unsupported operation
    UnsupportedOperation { operation: String, reason: String },

    /// Infrastructure error with external source
    InfrastructureError {
        message: String,
        source: Option<String>, // Store error as string to allow Clone
    },
}

impl StorageError {
    /// Short machine-readable code, used when reporting per-item failures
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::BucketNotFound { .. } => "NoSuchBucket",
            StorageError::ObjectNotFound { .. } => "NoSuchKey",
            StorageError::AccessDenied { .. } => "AccessDenied",
            StorageError::InvalidKey { .. } => "InvalidKey",
            StorageError::Configuration { .. } => "InvalidConfiguration",
            StorageError::UnsupportedOperation { .. } => "NotImplemented",
            StorageError::InfrastructureError { .. } => "InternalError",
        }
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::BucketNotFound { bucket } => {
                write!(f, "Bucket not found: {}", bucket)
            }
            StorageError::ObjectNotFound { key } => {
                write!(f, "Object not found: {}", key)
            }
            StorageError::AccessDenied { bucket, operation } => {
                write!(
                    f,
                    "Access denied for operation '{}' on bucket: {}",
                    operation, bucket
                )
            }
            StorageError::InvalidKey { key, reason } => {
                write!(f, "Invalid key '{}': {}", key, reason)
            }
            StorageError::Configuration { message } => {
                write!(f, "Client configuration error: {}", message)
            }
            StorageError::UnsupportedOperation { operation, reason } => {
                write!(f, "Unsupported operation '{}': {}", operation, reason)
            }
            StorageError::InfrastructureError { message, .. } => {
                write!(f, "Infrastructure error: {}", message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
