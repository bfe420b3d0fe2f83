use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error as ThisError;

use crate::domain::{errors::StorageError, value_objects::BucketName};

/// S3 error codes that mean the credentials were refused
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AllAccessDisabled",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
];

#[derive(ThisError, Debug)]
pub enum StoreError {
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("S3 {operation} failed: {message}")]
    S3 {
        operation: String,
        code: Option<String>,
        status: Option<u16>,
        message: String,
    },

    #[error("Invalid object path '{key}': {reason}")]
    InvalidPath { key: String, reason: String },

    #[error("Bucket not registered: {0}")]
    UnknownBucket(String),

    #[error("Client configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Capture the service code and HTTP status of an SDK failure
    pub fn from_sdk<E>(operation: &str, err: SdkError<E>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
    {
        let code = err.code().map(str::to_string);
        let status = err.raw_response().map(|r| r.status().as_u16());
        StoreError::S3 {
            operation: operation.to_string(),
            code,
            status,
            message: DisplayErrorContext(err).to_string(),
        }
    }

    /// Map an error from a bucket-level call, where "not found" means the bucket
    pub fn into_bucket_error(self, bucket: &BucketName, operation: &str) -> StorageError {
        let access_denied = StorageError::AccessDenied {
            bucket: bucket.clone(),
            operation: operation.to_string(),
        };
        match self {
            StoreError::ObjectStore(object_store::Error::NotFound { .. })
            | StoreError::UnknownBucket(_) => StorageError::BucketNotFound {
                bucket: bucket.clone(),
            },
            StoreError::ObjectStore(
                object_store::Error::PermissionDenied { .. }
                | object_store::Error::Unauthenticated { .. },
            ) => access_denied,
            StoreError::S3 {
                ref code, status, ..
            } if status == Some(404) || code.as_deref() == Some("NoSuchBucket") => {
                StorageError::BucketNotFound {
                    bucket: bucket.clone(),
                }
            }
            StoreError::S3 {
                ref code, status, ..
            } if matches!(status, Some(401 | 403))
                || code
                    .as_deref()
                    .is_some_and(|c| ACCESS_DENIED_CODES.contains(&c)) =>
            {
                access_denied
            }
            other => other.into(),
        }
    }
}

/// Convert object_store errors to domain storage errors
impl From<object_store::Error> for StorageError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => StorageError::ObjectNotFound { key: path },
            object_store::Error::InvalidPath { source } => StorageError::InvalidKey {
                key: String::new(),
                reason: source.to_string(),
            },
            object_store::Error::NotSupported { .. } | object_store::Error::NotImplemented => {
                StorageError::UnsupportedOperation {
                    operation: "unknown".to_string(),
                    reason: err.to_string(),
                }
            }
            object_store::Error::UnknownConfigurationKey { .. } => StorageError::Configuration {
                message: err.to_string(),
            },
            _ => StorageError::InfrastructureError {
                message: format!("Object store operation failed: {}", err),
                source: Some(err.to_string()),
            },
        }
    }
}

/// Convert infrastructure StoreError to domain StorageError
impl From<StoreError> for StorageError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ObjectStore(object_err) => object_err.into(),
            StoreError::S3 { ref code, .. } => StorageError::InfrastructureError {
                source: code.clone(),
                message: err.to_string(),
            },
            StoreError::InvalidPath { key, reason } => StorageError::InvalidKey { key, reason },
            StoreError::Configuration(message) => StorageError::Configuration { message },
            StoreError::UnknownBucket(bucket) => StorageError::Configuration {
                message: format!("Bucket not registered: {}", bucket),
            },
        }
    }
}
