//! In-memory `ObjectBackend` used by tests.
//!
//! Pages are `page_size` keys long so multi-page enumeration can be forced
//! with a handful of objects. Every call is appended to a log, and a call
//! matching a registered fault fails once with that fault's error.

use crate::{
    models::{
        bucket::BucketEntry,
        object::{ObjectEntry, ObjectPage},
    },
    services::backend::{
        BackendError, BackendResult, MAX_DELETE_BATCH, ObjectBackend, ObjectBody, ObjectReader,
    },
};
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    collections::BTreeMap,
    io::Cursor,
    ops::Bound,
    sync::{Arc, Mutex},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListBuckets,
    CreateBucket(String),
    DeleteBucket(String),
    ListObjects { prefix: String, cursor: Option<String> },
    PutObject(String),
    GetObject(String),
    DeleteObject(String),
    DeleteObjects(Vec<String>),
}

type Buckets = BTreeMap<String, BTreeMap<String, Bytes>>;
type Fault = (Box<dyn Fn(&Call) -> bool + Send + Sync>, BackendError);

#[derive(Clone)]
pub struct MemoryBackend {
    buckets: Arc<Mutex<Buckets>>,
    calls: Arc<Mutex<Vec<Call>>>,
    faults: Arc<Mutex<Vec<Fault>>>,
    page_size: usize,
}

impl MemoryBackend {
    pub fn new(page_size: usize) -> Self {
        Self {
            buckets: Arc::default(),
            calls: Arc::default(),
            faults: Arc::default(),
            page_size: page_size.max(1),
        }
    }

    /// Seed a bucket with objects without logging any calls.
    pub fn with_objects(self, bucket: &str, objects: &[(&str, &[u8])]) -> Self {
        {
            let mut buckets = self.buckets.lock().unwrap();
            let entry = buckets.entry(bucket.to_string()).or_default();
            for (key, body) in objects {
                entry.insert(key.to_string(), Bytes::copy_from_slice(body));
            }
        }
        self
    }

    /// Fail the first call matching `when` with `error`.
    pub fn fail_when(
        self,
        when: impl Fn(&Call) -> bool + Send + Sync + 'static,
        error: BackendError,
    ) -> Self {
        self.faults.lock().unwrap().push((Box::new(when), error));
        self
    }

    pub fn keys(&self, bucket: &str) -> Option<Vec<String>> {
        self.buckets
            .lock()
            .unwrap()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.buckets.lock().unwrap().get(bucket)?.get(key).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> BackendResult<()> {
        let mut faults = self.faults.lock().unwrap();
        let triggered = faults.iter().position(|(when, _)| when(&call));
        self.calls.lock().unwrap().push(call);
        match triggered {
            Some(index) => Err(faults.remove(index).1),
            None => Ok(()),
        }
    }

    fn with_bucket<T>(
        &self,
        bucket: &str,
        f: impl FnOnce(&mut BTreeMap<String, Bytes>) -> BackendResult<T>,
    ) -> BackendResult<T> {
        let mut buckets = self.buckets.lock().unwrap();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        f(objects)
    }
}

fn no_such_bucket(bucket: &str) -> BackendError {
    BackendError::Request(format!(
        "NoSuchBucket: The specified bucket does not exist: {}",
        bucket
    ))
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    async fn list_buckets(&self) -> BackendResult<Vec<BucketEntry>> {
        self.record(Call::ListBuckets)?;
        Ok(self
            .buckets
            .lock()
            .unwrap()
            .keys()
            .map(BucketEntry::new)
            .collect())
    }

    async fn create_bucket(&self, bucket: &str) -> BackendResult<()> {
        self.record(Call::CreateBucket(bucket.to_string()))?;
        let mut buckets = self.buckets.lock().unwrap();
        if buckets.contains_key(bucket) {
            return Err(BackendError::Request(format!(
                "BucketAlreadyOwnedByYou: {}",
                bucket
            )));
        }
        buckets.insert(bucket.to_string(), BTreeMap::new());
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> BackendResult<()> {
        self.record(Call::DeleteBucket(bucket.to_string()))?;
        let mut buckets = self.buckets.lock().unwrap();
        match buckets.get(bucket) {
            None => Err(no_such_bucket(bucket)),
            Some(objects) if !objects.is_empty() => Err(BackendError::Request(format!(
                "BucketNotEmpty: The bucket you tried to delete is not empty: {}",
                bucket
            ))),
            Some(_) => {
                buckets.remove(bucket);
                Ok(())
            }
        }
    }

    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        cursor: Option<String>,
    ) -> BackendResult<ObjectPage> {
        self.record(Call::ListObjects {
            prefix: prefix.to_string(),
            cursor: cursor.clone(),
        })?;
        let page_size = self.page_size;
        self.with_bucket(bucket, |objects| {
            let lower = match &cursor {
                Some(after) => Bound::Excluded(after.clone()),
                None => Bound::Unbounded,
            };
            let mut matching = objects
                .range((lower, Bound::Unbounded))
                .filter(|(key, _)| key.starts_with(prefix));

            let page: Vec<ObjectEntry> = matching
                .by_ref()
                .take(page_size)
                .map(|(key, body)| ObjectEntry::new(key.clone(), body.len() as i64))
                .collect();
            let next_cursor = if matching.next().is_some() {
                page.last().map(|o| o.key.clone())
            } else {
                None
            };
            Ok(ObjectPage {
                objects: page,
                next_cursor,
            })
        })
    }

    async fn put_object(&self, bucket: &str, key: &str, body: ObjectBody) -> BackendResult<()> {
        self.record(Call::PutObject(key.to_string()))?;
        let bytes = match body {
            ObjectBody::Empty => Bytes::new(),
            ObjectBody::File(path) => tokio::fs::read(&path)
                .await
                .map(Bytes::from)
                .map_err(|e| BackendError::Request(e.to_string()))?,
        };
        self.with_bucket(bucket, |objects| {
            objects.insert(key.to_string(), bytes);
            Ok(())
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> BackendResult<ObjectReader> {
        self.record(Call::GetObject(key.to_string()))?;
        let body = self.with_bucket(bucket, |objects| {
            objects.get(key).cloned().ok_or_else(|| {
                BackendError::Request(format!("NoSuchKey: The specified key does not exist: {}", key))
            })
        })?;
        Ok(Box::pin(Cursor::new(body)))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> BackendResult<()> {
        self.record(Call::DeleteObject(key.to_string()))?;
        self.with_bucket(bucket, |objects| {
            objects.remove(key);
            Ok(())
        })
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> BackendResult<()> {
        self.record(Call::DeleteObjects(keys.to_vec()))?;
        if keys.len() > MAX_DELETE_BATCH {
            return Err(BackendError::Request("MalformedXML: too many keys".into()));
        }
        self.with_bucket(bucket, |objects| {
            for key in keys {
                objects.remove(key);
            }
            Ok(())
        })
    }
}
