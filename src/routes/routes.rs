//! Defines routes for every gateway endpoint.
//!
//! ## Structure
//! - **Health checks**
//!   - `GET    /health` — liveness
//!   - `GET    /readyz` — backend + downloads directory readiness
//!
//! - **Bucket-level endpoints**
//!   - `GET    /list-buckets`
//!   - `GET    /list-contents/{bucket}` — every key (optional `prefix`)
//!   - `POST   /create-bucket/{bucket}`
//!   - `DELETE /delete-contents/{bucket}` — bulk delete under `prefix`
//!   - `DELETE /delete-bucket/{bucket}` — empty, then remove
//!
//! - **Object-level endpoints**
//!   - `GET    /download/{bucket}` — `key` or `prefix` to the downloads directory
//!   - `POST   /upload-file/{bucket}` — multipart `file`, optional `folderPath`
//!   - `POST   /create-folders/{bucket}` — folder placeholder at `key`
//!   - `DELETE /delete-key/{bucket}` — one object at `key`
//!
//! - **Docs**
//!   - `GET    /swagger` — Swagger UI over `/api-docs/openapi.json`

use crate::{
    handlers::{
        bucket_handlers::{create_bucket, delete_bucket, delete_contents, list_buckets, list_contents},
        health_handlers::{healthz, readyz},
        object_handlers::{create_folders, delete_key, download, upload_file},
    },
    routes::api_doc::{ApiDoc, OPENAPI_JSON_PATH, SWAGGER_PATH},
    services::storage_service::StorageService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Build and return the router for all gateway routes.
///
/// The router carries shared state (`StorageService`) to all handlers.
/// Upload bodies may be up to `max_upload_bytes`.
pub fn routes(max_upload_bytes: usize) -> Router<StorageService> {
    Router::new()
        .route("/health", get(healthz))
        .route("/readyz", get(readyz))
        // Bucket-level routes
        .route("/list-buckets", get(list_buckets))
        .route("/list-contents/{bucket}", get(list_contents))
        .route("/create-bucket/{bucket}", post(create_bucket))
        .route("/delete-contents/{bucket}", delete(delete_contents))
        .route("/delete-bucket/{bucket}", delete(delete_bucket))
        // Object-level routes
        .route("/download/{bucket}", get(download))
        .route(
            "/upload-file/{bucket}",
            post(upload_file).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/create-folders/{bucket}", post(create_folders))
        .route("/delete-key/{bucket}", delete(delete_key))
        // API docs
        .merge(SwaggerUi::new(SWAGGER_PATH).url(OPENAPI_JSON_PATH, ApiDoc::openapi()))
}
