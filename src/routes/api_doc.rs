//! OpenAPI document served alongside the Swagger UI.

use crate::handlers::{bucket_handlers, health_handlers, object_handlers};
use utoipa::OpenApi;

/// Where the Swagger UI is mounted.
pub const SWAGGER_PATH: &str = "/swagger";
/// Where the generated OpenAPI JSON is served.
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "bucket-relay",
        description = "HTTP facade over an S3-compatible object store"
    ),
    paths(
        health_handlers::healthz,
        health_handlers::readyz,
        bucket_handlers::list_buckets,
        bucket_handlers::list_contents,
        bucket_handlers::create_bucket,
        bucket_handlers::delete_contents,
        bucket_handlers::delete_bucket,
        object_handlers::download,
        object_handlers::upload_file,
        object_handlers::create_folders,
        object_handlers::delete_key,
    ),
    tags(
        (name = "Health Check", description = "Liveness and readiness"),
        (name = "S3 Operations", description = "Bucket and object operations forwarded to the backend")
    )
)]
pub struct ApiDoc;
