//! `ObjectBackend` over the AWS SDK, pointed at any S3-compatible endpoint.

use crate::{
    config::S3Settings,
    models::{
        bucket::BucketEntry,
        object::{ObjectEntry, ObjectPage},
    },
    services::backend::{BackendError, BackendResult, ObjectBackend, ObjectBody, ObjectReader},
};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client,
    config::{Credentials, Region},
    error::DisplayErrorContext,
    primitives::{ByteStream, DateTime as SdkDateTime},
    types::{BucketLocationConstraint, CreateBucketConfiguration, Delete, ObjectIdentifier},
};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Region that must not be sent as a create-bucket location constraint.
const DEFAULT_REGION: &str = "us-east-1";

/// S3 client shared by every request. Cloning is cheap.
#[derive(Clone)]
pub struct S3Backend {
    client: Client,
    region: String,
}

impl S3Backend {
    /// Build the SDK client once from process-wide settings.
    pub async fn connect(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            &settings.access_key,
            &settings.secret_key,
            None,
            None,
            "bucket-relay-static",
        );
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if settings.force_path_style {
            builder = builder.force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            region: settings.region.clone(),
        }
    }
}

/// Render any SDK failure with its full cause chain.
fn request_error<E: std::error::Error>(err: E) -> BackendError {
    BackendError::Request(DisplayErrorContext(err).to_string())
}

fn to_chrono(ts: &SdkDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}

#[async_trait]
impl ObjectBackend for S3Backend {
    async fn list_buckets(&self) -> BackendResult<Vec<BucketEntry>> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(request_error)?;

        Ok(output
            .buckets()
            .iter()
            .filter_map(|b| {
                b.name().map(|name| {
                    let mut entry = BucketEntry::new(name);
                    entry.created_at = b.creation_date().and_then(to_chrono);
                    entry
                })
            })
            .collect())
    }

    async fn create_bucket(&self, bucket: &str) -> BackendResult<()> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        request.send().await.map_err(request_error)?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> BackendResult<()> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(request_error)?;
        Ok(())
    }

    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        cursor: Option<String>,
    ) -> BackendResult<ObjectPage> {
        let mut request = self.client.list_objects_v2().bucket(bucket);
        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }
        let output = request
            .set_continuation_token(cursor)
            .send()
            .await
            .map_err(request_error)?;

        let objects = output
            .contents()
            .iter()
            .filter_map(|obj| {
                obj.key().map(|key| {
                    let mut entry = ObjectEntry::new(key, obj.size().unwrap_or(0));
                    entry.last_modified = obj.last_modified().and_then(to_chrono);
                    entry
                })
            })
            .collect::<Vec<_>>();

        let next_cursor = if output.is_truncated().unwrap_or(false) {
            output.next_continuation_token().map(str::to_string)
        } else {
            None
        };
        debug!(
            "listed {} objects from {}/{} (more: {})",
            objects.len(),
            bucket,
            prefix,
            next_cursor.is_some()
        );

        Ok(ObjectPage {
            objects,
            next_cursor,
        })
    }

    async fn put_object(&self, bucket: &str, key: &str, body: ObjectBody) -> BackendResult<()> {
        let stream = match body {
            ObjectBody::Empty => ByteStream::from_static(b""),
            ObjectBody::File(path) => ByteStream::from_path(&path)
                .await
                .map_err(request_error)?,
        };
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(stream)
            .send()
            .await
            .map_err(request_error)?;
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> BackendResult<ObjectReader> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(request_error)?;
        Ok(Box::pin(output.body.into_async_read()))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> BackendResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(request_error)?;
        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> BackendResult<()> {
        let identifiers = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(request_error)?;
        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .quiet(true)
            .build()
            .map_err(request_error)?;

        let output = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(request_error)?;

        if let Some(failure) = output.errors().first() {
            return Err(BackendError::BatchDelete {
                key: failure.key().unwrap_or_default().to_string(),
                code: failure.code().unwrap_or("Unknown").to_string(),
                message: failure.message().unwrap_or_default().to_string(),
            });
        }
        Ok(())
    }
}
