//! Object listings returned by one page of a paginated enumeration.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One stored object within a bucket.
///
/// Keys are slash-delimited and never begin with `/`. A key ending in `/`
/// denotes a zero-byte folder placeholder.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Full path-like key within the bucket.
    pub key: String,

    /// Payload size in bytes.
    pub size_bytes: i64,

    /// Timestamp when the object was last modified, if reported.
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectEntry {
    pub fn new(key: impl Into<String>, size_bytes: i64) -> Self {
        Self {
            key: key.into(),
            size_bytes,
            last_modified: None,
        }
    }

    /// True for folder placeholder objects (`"reports/"`).
    pub fn is_folder_placeholder(&self) -> bool {
        self.key.ends_with('/')
    }
}

/// A single page of a listing plus the cursor for the next one.
///
/// `next_cursor` is `None` once the backend signals the listing is exhausted.
#[derive(Clone, Debug, Default)]
pub struct ObjectPage {
    pub objects: Vec<ObjectEntry>,
    pub next_cursor: Option<String>,
}
