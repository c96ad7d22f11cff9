//! A bucket as reported by the backend's list-buckets call.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A top-level namespace in the storage backend.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct BucketEntry {
    /// Bucket name as the backend knows it.
    pub name: String,

    /// Creation time, when the backend reports one.
    pub created_at: Option<DateTime<Utc>>,
}

impl BucketEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: None,
        }
    }
}
