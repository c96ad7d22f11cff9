//! HTTP handlers for bucket-level operations.

use crate::{
    errors::{AppError, ErrorBody},
    handlers::{BulkResponse, MessageResponse, non_empty},
    services::storage_service::{CreateBucketOutcome, StorageService},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PrefixQuery {
    /// Key prefix to scope the operation to.
    pub prefix: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct BucketsResponse {
    buckets: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ContentsResponse {
    #[serde(rename = "bucket-name")]
    bucket_name: String,
    objects: Vec<String>,
}

/// GET `/list-buckets`
#[utoipa::path(
    get,
    path = "/list-buckets",
    tag = "S3 Operations",
    responses(
        (status = 200, description = "Names of every bucket", body = BucketsResponse),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn list_buckets(
    State(service): State<StorageService>,
) -> Result<impl IntoResponse, AppError> {
    let buckets = service.list_buckets().await?;
    Ok(Json(BucketsResponse {
        buckets: buckets.into_iter().map(|b| b.name).collect(),
    }))
}

/// GET `/list-contents/{bucket}` — every key, across all listing pages.
#[utoipa::path(
    get,
    path = "/list-contents/{bucket}",
    tag = "S3 Operations",
    params(("bucket" = String, Path, description = "Bucket name"), PrefixQuery),
    responses(
        (status = 200, description = "Matching keys, or a message when there are none", body = ContentsResponse),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn list_contents(
    State(service): State<StorageService>,
    Path(bucket): Path<String>,
    Query(q): Query<PrefixQuery>,
) -> Result<Response, AppError> {
    let prefix = q.prefix.unwrap_or_default();
    let objects = service.list_contents(&bucket, &prefix).await?;
    if objects.is_empty() {
        return Ok(Json(MessageResponse::new(format!(
            "The bucket '{}' is empty.",
            bucket
        )))
        .into_response());
    }
    Ok(Json(ContentsResponse {
        bucket_name: bucket,
        objects,
    })
    .into_response())
}

/// POST `/create-bucket/{bucket}` — create unless it already exists.
#[utoipa::path(
    post,
    path = "/create-bucket/{bucket}",
    tag = "S3 Operations",
    params(("bucket" = String, Path, description = "Bucket name")),
    responses(
        (status = 200, description = "Bucket created or already present", body = MessageResponse),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn create_bucket(
    State(service): State<StorageService>,
    Path(bucket): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let message = match service.create_bucket(&bucket).await? {
        CreateBucketOutcome::AlreadyExists => format!("Bucket '{}' already exists.", bucket),
        CreateBucketOutcome::Created => format!("Bucket '{}' created successfully.", bucket),
    };
    Ok(Json(MessageResponse::new(message)))
}

/// DELETE `/delete-contents/{bucket}?prefix=` — bulk delete under a folder.
///
/// An empty or missing prefix is rejected; emptying a whole bucket goes
/// through `/delete-bucket`.
#[utoipa::path(
    delete,
    path = "/delete-contents/{bucket}",
    tag = "S3 Operations",
    params(("bucket" = String, Path, description = "Bucket name"), PrefixQuery),
    responses(
        (status = 200, description = "Objects under the prefix deleted", body = BulkResponse),
        (status = 400, description = "Missing or empty prefix", body = ErrorBody),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn delete_contents(
    State(service): State<StorageService>,
    Path(bucket): Path<String>,
    Query(q): Query<PrefixQuery>,
) -> Result<impl IntoResponse, AppError> {
    let prefix =
        non_empty(q.prefix).ok_or_else(|| AppError::bad_request("'prefix' must be provided."))?;
    let outcome = service.delete_prefix(&bucket, &prefix).await?;
    Ok(Json(BulkResponse {
        message: outcome.to_string(),
        matched: outcome.matched(),
    }))
}

/// DELETE `/delete-bucket/{bucket}` — remove all contents, then the bucket.
#[utoipa::path(
    delete,
    path = "/delete-bucket/{bucket}",
    tag = "S3 Operations",
    params(("bucket" = String, Path, description = "Bucket name")),
    responses(
        (status = 200, description = "Bucket emptied and removed", body = BulkResponse),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn delete_bucket(
    State(service): State<StorageService>,
    Path(bucket): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = service.delete_bucket(&bucket).await?;
    Ok(Json(BulkResponse {
        message: format!("Bucket '{}' deleted successfully.", bucket),
        matched: outcome.matched(),
    }))
}
