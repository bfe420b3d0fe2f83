use serde::Serialize;

use crate::domain::errors::ValidationError;

/// A folder-style key prefix: empty for the bucket root, otherwise ending with '/'
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Prefix(String);

impl Prefix {
    /// The bucket root
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Normalize a user-supplied prefix; a missing trailing '/' is added
    pub fn new(value: &str) -> Result<Self, ValidationError> {
        if value.is_empty() {
            return Ok(Self::root());
        }

        if value.starts_with('/') {
            return Err(ValidationError::PrefixStartsWithSlash);
        }

        if value.contains("//") {
            return Err(ValidationError::PrefixContainsEmptySegment);
        }

        if value.contains('\0') {
            return Err(ValidationError::InvalidObjectKeyCharacter('\0'));
        }

        let mut normalized = value.to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        Ok(Self(normalized))
    }

    /// Parse an optional prefix, treating `None` and "" as the root
    pub fn parse(value: Option<&str>) -> Result<Self, ValidationError> {
        value.map_or_else(|| Ok(Self::root()), Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `key` lies strictly below this prefix
    pub fn contains(&self, key: &str) -> bool {
        key.starts_with(self.as_str()) && key != self.as_str()
    }
}

impl std::fmt::Display for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_normalization() {
        assert_eq!(Prefix::new("backups").unwrap().as_str(), "backups/");
        assert_eq!(Prefix::new("backups/db/").unwrap().as_str(), "backups/db/");
        assert!(Prefix::new("").unwrap().is_root());
        assert!(Prefix::parse(None).unwrap().is_root());
    }

    #[test]
    fn test_invalid_prefix() {
        assert_eq!(
            Prefix::new("/backups"),
            Err(ValidationError::PrefixStartsWithSlash)
        );
        assert_eq!(
            Prefix::new("a//b"),
            Err(ValidationError::PrefixContainsEmptySegment)
        );
    }

    #[test]
    fn test_contains() {
        let prefix = Prefix::new("logs").unwrap();
        assert!(prefix.contains("logs/a.txt"));
        assert!(!prefix.contains("logs/"));
        assert!(!prefix.contains("other/a.txt"));
        assert!(Prefix::root().contains("anything"));
    }
}
