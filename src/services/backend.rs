//! The object-storage collaborator every endpoint forwards to.
//!
//! `StorageService` only ever talks to an `ObjectBackend`; production wires in
//! the S3 implementation, tests wire in the in-memory one.

use crate::models::{bucket::BucketEntry, object::ObjectPage};
use async_trait::async_trait;
use std::{path::PathBuf, pin::Pin};
use thiserror::Error;
use tokio::io::AsyncRead;

/// Streaming payload of a fetched object.
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send>>;

/// Failure reported by (or while reaching) the storage backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend rejected the request or could not be reached. The message
    /// is the backend's own error text.
    #[error("{0}")]
    Request(String),

    /// A batch delete call went through but the backend refused one of its keys.
    #[error("failed to delete `{key}`: {code}: {message}")]
    BatchDelete {
        key: String,
        code: String,
        message: String,
    },
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Body for a put-object call.
#[derive(Debug, Clone)]
pub enum ObjectBody {
    /// Zero-length payload (folder placeholders).
    Empty,
    /// Payload read from a local file.
    File(PathBuf),
}

/// Operations the storage backend must expose.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    async fn list_buckets(&self) -> BackendResult<Vec<BucketEntry>>;

    async fn create_bucket(&self, bucket: &str) -> BackendResult<()>;

    /// Remove a bucket. Backends refuse this unless the bucket is empty.
    async fn delete_bucket(&self, bucket: &str) -> BackendResult<()>;

    /// Fetch one page of keys starting with `prefix`, continuing from `cursor`.
    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        cursor: Option<String>,
    ) -> BackendResult<ObjectPage>;

    async fn put_object(&self, bucket: &str, key: &str, body: ObjectBody) -> BackendResult<()>;

    async fn get_object(&self, bucket: &str, key: &str) -> BackendResult<ObjectReader>;

    async fn delete_object(&self, bucket: &str, key: &str) -> BackendResult<()>;

    /// Delete up to `MAX_DELETE_BATCH` keys in one call.
    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> BackendResult<()>;
}

/// Largest number of keys the backend accepts in one batch delete.
pub const MAX_DELETE_BATCH: usize = 1000;
