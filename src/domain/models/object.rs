use chrono::{DateTime, Utc};
use serde::Serialize;

use super::timestamp::folder_timestamp;

/// An object found below a prefix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectDescriptor {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub storage_class: Option<String>,
}

impl ObjectDescriptor {
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified: None,
            storage_class: None,
        }
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    pub fn with_storage_class(mut self, storage_class: impl Into<String>) -> Self {
        self.storage_class = Some(storage_class.into());
        self
    }

    /// Zero-byte "folder" markers end with the delimiter
    pub fn is_placeholder(&self) -> bool {
        self.key.ends_with('/')
    }
}

/// An immediate subfolder of a prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderDescriptor {
    /// Always ends with '/'
    pub prefix: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl FolderDescriptor {
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        Self {
            prefix,
            timestamp: None,
        }
    }

    /// Decorate the folder with the timestamp parsed from its name
    pub fn with_extracted_timestamp(mut self) -> Self {
        self.timestamp = folder_timestamp(&self.prefix);
        self
    }
}

/// One item produced by an enumeration
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Object(ObjectDescriptor),
    Folder(FolderDescriptor),
    /// Folder marker key; only produced when explicitly requested
    Placeholder(String),
}

/// How deep an enumeration walks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// Immediate children only, using the '/' delimiter
    Delimited,
    /// The whole subtree, objects only
    Recursive,
}

/// A single page of a delimited listing, as shown to a browsing caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingPage {
    pub prefix: String,
    pub folders: Vec<String>,
    pub objects: Vec<ObjectDescriptor>,
    pub is_truncated: bool,
    pub next_token: Option<String>,
}
