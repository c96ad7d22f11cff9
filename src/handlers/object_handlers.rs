//! HTTP handlers for object operations.
//! Upload bodies are streamed straight through to `StorageService`, which
//! spools them to disk rather than buffering in memory.

use crate::{
    errors::{AppError, ErrorBody},
    handlers::{BulkResponse, MessageResponse, non_empty},
    services::storage_service::StorageService,
};
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use serde::Deserialize;
use std::io;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// Folder the file is stored under.
    #[serde(rename = "folderPath")]
    pub folder_path: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct KeyQuery {
    pub key: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DownloadQuery {
    /// Single object to download.
    pub key: Option<String>,
    /// Folder to download recursively.
    pub prefix: Option<String>,
}

/// Multipart body accepted by `/upload-file`.
#[derive(ToSchema)]
#[allow(dead_code)]
pub(crate) struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

/// Name of the multipart field carrying the file.
const FILE_FIELD: &str = "file";

/// POST `/upload-file/{bucket}?folderPath=` — multipart upload.
#[utoipa::path(
    post,
    path = "/upload-file/{bucket}",
    tag = "S3 Operations",
    params(("bucket" = String, Path, description = "Bucket name"), UploadQuery),
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = MessageResponse),
        (status = 400, description = "Missing file field or filename", body = ErrorBody),
        (status = 413, description = "Upload exceeds the body limit", body = ErrorBody),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn upload_file(
    State(service): State<StorageService>,
    Path(bucket): Path<String>,
    Query(q): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::bad_request("uploaded file has no filename"))?;

        let stream = field.map_err(io::Error::other);
        let key = service
            .upload_file_stream(&bucket, q.folder_path.as_deref(), &filename, stream)
            .await?;

        return Ok(Json(MessageResponse::new(format!(
            "File '{}' uploaded successfully! Path:'{}/{}'",
            filename, bucket, key
        ))));
    }
    Err(AppError::bad_request("multipart field 'file' is required"))
}

/// POST `/create-folders/{bucket}?key=` — zero-byte folder placeholder.
#[utoipa::path(
    post,
    path = "/create-folders/{bucket}",
    tag = "S3 Operations",
    params(("bucket" = String, Path, description = "Bucket name"), KeyQuery),
    responses(
        (status = 200, description = "Folder placeholder created", body = MessageResponse),
        (status = 400, description = "Missing key", body = ErrorBody),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn create_folders(
    State(service): State<StorageService>,
    Path(bucket): Path<String>,
    Query(q): Query<KeyQuery>,
) -> Result<impl IntoResponse, AppError> {
    let key = non_empty(q.key).ok_or_else(|| AppError::bad_request("'key' must be provided."))?;
    let key = service.create_folder(&bucket, &key).await?;
    Ok(Json(MessageResponse::new(format!(
        "Folder '{}' created successfully.",
        key
    ))))
}

/// DELETE `/delete-key/{bucket}?key=` — delete one object.
#[utoipa::path(
    delete,
    path = "/delete-key/{bucket}",
    tag = "S3 Operations",
    params(("bucket" = String, Path, description = "Bucket name"), KeyQuery),
    responses(
        (status = 200, description = "Object deleted", body = MessageResponse),
        (status = 400, description = "Missing key", body = ErrorBody),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn delete_key(
    State(service): State<StorageService>,
    Path(bucket): Path<String>,
    Query(q): Query<KeyQuery>,
) -> Result<impl IntoResponse, AppError> {
    let key = non_empty(q.key).ok_or_else(|| AppError::bad_request("'key' must be provided."))?;
    service.delete_key(&bucket, &key).await?;
    Ok(Json(MessageResponse::new(format!(
        "File '{}' deleted from bucket '{}' successfully.",
        key, bucket
    ))))
}

/// GET `/download/{bucket}?key=|prefix=` — copy one object or a whole folder
/// below the downloads directory. Exactly one of `key` and `prefix` is accepted.
#[utoipa::path(
    get,
    path = "/download/{bucket}",
    tag = "S3 Operations",
    params(("bucket" = String, Path, description = "Bucket name"), DownloadQuery),
    responses(
        (status = 200, description = "Object or folder written to the downloads directory", body = BulkResponse),
        (status = 400, description = "Neither or both of key and prefix", body = ErrorBody),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn download(
    State(service): State<StorageService>,
    Path(bucket): Path<String>,
    Query(q): Query<DownloadQuery>,
) -> Result<Response, AppError> {
    match (non_empty(q.key), non_empty(q.prefix)) {
        (Some(key), None) => {
            let path = service.download_key(&bucket, &key).await?;
            Ok(Json(MessageResponse::new(format!(
                "File '{}' downloaded to '{}' successfully.",
                key,
                path.display()
            )))
            .into_response())
        }
        (None, Some(prefix)) => {
            let outcome = service.download_prefix(&bucket, &prefix).await?;
            Ok(Json(BulkResponse {
                message: outcome.to_string(),
                matched: outcome.matched(),
            })
            .into_response())
        }
        (None, None) => Err(AppError::bad_request(
            "Either 'key' or 'prefix' must be provided.",
        )),
        (Some(_), Some(_)) => Err(AppError::bad_request(
            "Provide only one of 'key' or 'prefix'.",
        )),
    }
}
