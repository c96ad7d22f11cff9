//! src/services/storage_service.rs
//!
//! StorageService — every gateway operation, forwarded to an `ObjectBackend`.
//! Object payloads stream between the backend and local files; nothing is
//! cached and no state outlives a request.

use crate::{
    models::{bucket::BucketEntry, object::ObjectEntry},
    services::{
        backend::{BackendError, MAX_DELETE_BATCH, ObjectBackend, ObjectBody},
        keys,
    },
};
use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use std::{
    fmt, io,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("{0}")]
    InvalidRequest(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Action applied to every object under a prefix.
#[derive(Debug, Clone)]
pub enum BulkAction {
    Delete,
    /// Copy each object below this local root, keeping its key as a relative path.
    DownloadTo(PathBuf),
}

/// What a bulk operation did.
///
/// `NoMatches` is distinct from a completed run so callers can tell
/// "nothing existed" from "something existed and was processed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    NoMatches {
        bucket: String,
        prefix: String,
    },
    Deleted {
        bucket: String,
        prefix: String,
        count: usize,
    },
    Downloaded {
        bucket: String,
        prefix: String,
        root: PathBuf,
        count: usize,
    },
}

impl BulkOutcome {
    /// Number of objects acted upon.
    pub fn matched(&self) -> usize {
        match self {
            BulkOutcome::NoMatches { .. } => 0,
            BulkOutcome::Deleted { count, .. } | BulkOutcome::Downloaded { count, .. } => *count,
        }
    }
}

impl fmt::Display for BulkOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BulkOutcome::NoMatches { bucket, prefix } => write!(
                f,
                "No objects found with prefix '{}' in bucket '{}'.",
                prefix, bucket
            ),
            BulkOutcome::Deleted { bucket, prefix, .. } => write!(
                f,
                "All objects under prefix '{}' deleted from bucket '{}' successfully.",
                prefix, bucket
            ),
            BulkOutcome::Downloaded { prefix, root, .. } => write!(
                f,
                "All files under prefix '{}' downloaded to '{}' successfully.",
                prefix,
                root.display()
            ),
        }
    }
}

/// Result of `create_bucket`: the bucket is never created twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateBucketOutcome {
    Created,
    AlreadyExists,
}

/// Walks a paginated listing one page at a time.
///
/// Page N+1 is requested only after page N has been handed out.
struct PrefixCursor<'a> {
    backend: &'a dyn ObjectBackend,
    bucket: &'a str,
    prefix: &'a str,
    cursor: Option<String>,
    exhausted: bool,
}

impl<'a> PrefixCursor<'a> {
    fn new(backend: &'a dyn ObjectBackend, bucket: &'a str, prefix: &'a str) -> Self {
        Self {
            backend,
            bucket,
            prefix,
            cursor: None,
            exhausted: false,
        }
    }

    async fn next_page(&mut self) -> StorageResult<Option<Vec<ObjectEntry>>> {
        if self.exhausted {
            return Ok(None);
        }
        let page = self
            .backend
            .list_objects_page(self.bucket, self.prefix, self.cursor.take())
            .await?;
        self.exhausted = page.next_cursor.is_none();
        self.cursor = page.next_cursor;
        Ok(Some(page.objects))
    }
}

/// StorageService exposes the gateway's operations:
/// - bucket listing, creation and deletion
/// - object listing, upload, folder placeholders, single-key delete and download
/// - prefix-scoped bulk delete and bulk download
#[derive(Clone)]
pub struct StorageService {
    /// Backend client built once at start-up.
    pub backend: Arc<dyn ObjectBackend>,

    /// Local root that downloaded objects are written beneath.
    pub downloads_dir: PathBuf,
}

impl StorageService {
    pub fn new(backend: Arc<dyn ObjectBackend>, downloads_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            downloads_dir: downloads_dir.into(),
        }
    }

    pub async fn list_buckets(&self) -> StorageResult<Vec<BucketEntry>> {
        Ok(self.backend.list_buckets().await?)
    }

    /// Create `bucket` unless the backend already lists it.
    pub async fn create_bucket(&self, bucket: &str) -> StorageResult<CreateBucketOutcome> {
        let existing = self.backend.list_buckets().await?;
        if existing.iter().any(|b| b.name == bucket) {
            debug!("bucket {} already exists, skipping create", bucket);
            return Ok(CreateBucketOutcome::AlreadyExists);
        }
        self.backend.create_bucket(bucket).await?;
        info!("created bucket {}", bucket);
        Ok(CreateBucketOutcome::Created)
    }

    /// Empty the bucket across all listing pages, then remove it.
    pub async fn delete_bucket(&self, bucket: &str) -> StorageResult<BulkOutcome> {
        let outcome = self.delete_prefix(bucket, "").await?;
        self.backend.delete_bucket(bucket).await?;
        info!(
            "deleted bucket {} after removing {} objects",
            bucket,
            outcome.matched()
        );
        Ok(outcome)
    }

    /// Every key in `bucket` starting with `prefix` (raw string match), across all pages.
    pub async fn list_contents(&self, bucket: &str, prefix: &str) -> StorageResult<Vec<String>> {
        let mut cursor = PrefixCursor::new(self.backend.as_ref(), bucket, prefix);
        let mut keys = Vec::new();
        while let Some(page) = cursor.next_page().await? {
            keys.extend(page.into_iter().map(|o| o.key));
        }
        Ok(keys)
    }

    /// Stream-upload a file.
    ///
    /// The payload is spooled to a temp file chunk by chunk and put from there,
    /// so it is never held in memory. The temp file is removed either way.
    /// Returns the stored key.
    pub async fn upload_file_stream<S>(
        &self,
        bucket: &str,
        folder_path: Option<&str>,
        filename: &str,
        stream: S,
    ) -> StorageResult<String>
    where
        S: Stream<Item = io::Result<Bytes>> + Send,
    {
        if filename.is_empty() {
            return Err(StorageError::InvalidRequest(
                "uploaded file has no filename".into(),
            ));
        }
        let key = keys::upload_key(folder_path, filename);

        let spool = std::env::temp_dir().join(format!("bucket-relay-upload-{}", Uuid::new_v4()));
        let result = async {
            let size = spool_to_file(stream, &spool).await?;
            debug!("spooled {} bytes for {}/{}", size, bucket, key);
            self.backend
                .put_object(bucket, &key, ObjectBody::File(spool.clone()))
                .await?;
            Ok::<_, StorageError>(size)
        }
        .await;
        let _ = fs::remove_file(&spool).await;

        let size = result?;
        info!("uploaded {}/{} ({} bytes)", bucket, key, size);
        Ok(key)
    }

    /// Create a zero-byte folder placeholder. Returns the stored key.
    pub async fn create_folder(&self, bucket: &str, key: &str) -> StorageResult<String> {
        let key = keys::folder_key(key)?;
        self.backend
            .put_object(bucket, &key, ObjectBody::Empty)
            .await?;
        info!("created folder {}/{}", bucket, key);
        Ok(key)
    }

    pub async fn delete_key(&self, bucket: &str, key: &str) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::InvalidRequest("'key' must not be empty".into()));
        }
        self.backend.delete_object(bucket, key).await?;
        info!("deleted {}/{}", bucket, key);
        Ok(())
    }

    /// Download one object below the downloads root. Returns the local path.
    ///
    /// A folder placeholder key becomes a local directory, but only once the
    /// backend has confirmed the placeholder exists.
    pub async fn download_key(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        let path = keys::local_path(&self.downloads_dir, key)?;
        if key.ends_with('/') {
            self.backend.get_object(bucket, key).await?;
            fs::create_dir_all(&path).await?;
        } else {
            self.fetch_to(bucket, key, &path).await?;
        }
        info!("downloaded {}/{} to {}", bucket, key, path.display());
        Ok(path)
    }

    /// Delete every object under the folder `prefix`.
    pub async fn delete_prefix(&self, bucket: &str, prefix: &str) -> StorageResult<BulkOutcome> {
        self.run_bulk(bucket, prefix, BulkAction::Delete).await
    }

    /// Download every object under the folder `prefix` into the downloads root.
    pub async fn download_prefix(&self, bucket: &str, prefix: &str) -> StorageResult<BulkOutcome> {
        let root = self.downloads_dir.clone();
        self.run_bulk(bucket, prefix, BulkAction::DownloadTo(root))
            .await
    }

    /// Apply `action` to every object under `prefix`.
    ///
    /// The prefix is folder-normalized first. Enumeration follows the cursor
    /// until the backend reports no further pages. Deletes collect every key
    /// before issuing batches of at most `MAX_DELETE_BATCH`; downloads stream
    /// page by page. Any failure aborts the whole operation.
    pub async fn run_bulk(
        &self,
        bucket: &str,
        prefix: &str,
        action: BulkAction,
    ) -> StorageResult<BulkOutcome> {
        let prefix = keys::normalize_prefix(prefix);
        let mut cursor = PrefixCursor::new(self.backend.as_ref(), bucket, &prefix);

        let outcome = match action {
            BulkAction::Delete => {
                let mut matched = Vec::new();
                while let Some(page) = cursor.next_page().await? {
                    debug!("collected {} keys under {}/{}", page.len(), bucket, prefix);
                    matched.extend(page.into_iter().map(|o| o.key));
                }
                if matched.is_empty() {
                    None
                } else {
                    for batch in matched.chunks(MAX_DELETE_BATCH) {
                        debug!("deleting batch of {} from {}", batch.len(), bucket);
                        self.backend.delete_objects(bucket, batch).await?;
                    }
                    Some(BulkOutcome::Deleted {
                        bucket: bucket.to_string(),
                        prefix: prefix.clone(),
                        count: matched.len(),
                    })
                }
            }
            BulkAction::DownloadTo(root) => {
                let mut count = 0;
                while let Some(page) = cursor.next_page().await? {
                    for object in page {
                        let path = keys::local_path(&root, &object.key)?;
                        if object.is_folder_placeholder() {
                            fs::create_dir_all(&path).await?;
                        } else {
                            self.fetch_to(bucket, &object.key, &path).await?;
                        }
                        debug!("downloaded {} to {}", object.key, path.display());
                        count += 1;
                    }
                }
                (count > 0).then(|| BulkOutcome::Downloaded {
                    bucket: bucket.to_string(),
                    prefix: prefix.clone(),
                    root,
                    count,
                })
            }
        };

        let outcome = outcome.unwrap_or_else(|| BulkOutcome::NoMatches {
            bucket: bucket.to_string(),
            prefix,
        });
        info!("{} ({} objects)", outcome, outcome.matched());
        Ok(outcome)
    }

    /// Stream one object to `dest`, creating parent directories.
    ///
    /// Bytes land in a `.tmp-*` sibling first and are renamed over `dest`,
    /// so a re-run overwrites the previous download.
    async fn fetch_to(&self, bucket: &str, key: &str, dest: &Path) -> StorageResult<u64> {
        let parent = dest.parent().ok_or_else(|| {
            StorageError::Io(io::Error::other("download path missing parent directory"))
        })?;
        fs::create_dir_all(parent).await?;

        let mut reader = self.backend.get_object(bucket, key).await?;
        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let written = match tokio::io::copy(&mut reader, &mut file).await {
            Ok(n) => n,
            Err(err) => {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StorageError::Io(err));
            }
        };
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }
        drop(file);

        if let Err(err) = fs::rename(&tmp_path, dest).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }
        Ok(written)
    }
}

/// Write a byte stream to `path`, returning the number of bytes written.
async fn spool_to_file<S>(stream: S, path: &Path) -> StorageResult<u64>
where
    S: Stream<Item = io::Result<Bytes>>,
{
    let mut file = File::create(path).await?;
    let mut size = 0u64;
    pin_mut!(stream);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        size += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(size)
}
