use crate::domain::{
    errors::{RetentionError, RetentionResult},
    value_objects::BucketName,
};

/// Buckets the process is permitted to operate on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketAllowList {
    buckets: Vec<String>,
}

impl BucketAllowList {
    pub fn new<I, S>(buckets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Vec::new();
        for bucket in buckets {
            let bucket = bucket.into();
            if !bucket.is_empty() && !list.contains(&bucket) {
                list.push(bucket);
            }
        }
        Self { buckets: list }
    }

    /// Parse a comma-separated list, ignoring blanks
    pub fn from_csv(value: &str) -> Self {
        Self::new(value.split(',').map(str::trim))
    }

    pub fn contains(&self, bucket: &str) -> bool {
        self.buckets.iter().any(|b| b == bucket)
    }

    /// Admit `bucket` or reject it before any client is resolved
    pub fn check(&self, bucket: &str) -> RetentionResult<BucketName> {
        if !self.contains(bucket) {
            return Err(RetentionError::BucketNotAllowed {
                bucket: bucket.to_string(),
            });
        }
        BucketName::new(bucket.to_string()).map_err(|e| RetentionError::InvalidRequest {
            message: format!("Invalid bucket name '{}': {}", bucket, e),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_csv() {
        let list = BucketAllowList::from_csv(" backups , ,logs,backups");
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["backups", "logs"]);
        assert!(BucketAllowList::from_csv("").is_empty());
    }

    #[test]
    fn test_check() {
        let list = BucketAllowList::new(["backups", "Bad_Name"]);
        assert_eq!(list.check("backups").unwrap().as_str(), "backups");
        assert!(matches!(
            list.check("private-bucket"),
            Err(RetentionError::BucketNotAllowed { .. })
        ));
        assert!(matches!(
            list.check("Bad_Name"),
            Err(RetentionError::InvalidRequest { .. })
        ));
    }
}
