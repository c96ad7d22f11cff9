//! Health & readiness handlers.
//!
//! - GET /health  -> simple liveness ("ok")
//! - GET /readyz  -> readiness that checks the backend and the downloads directory

use crate::services::storage_service::StorageService;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;
use tokio::fs;
use utoipa::ToSchema;
use uuid::Uuid;

/// `GET /health`
///
/// Very small liveness check — always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health Check",
    responses((status = 200, description = "Process is alive", body = HealthResponse))
)]
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
            message: "Hello, World!".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness check that:
/// 1. Asks the backend to list buckets.
/// 2. Performs a best-effort write/read/delete in the downloads directory.
///
/// HTTP 200 when all checks pass, HTTP 503 when any check fails.
#[utoipa::path(
    get,
    path = "/readyz",
    tag = "Health Check",
    responses(
        (status = 200, description = "Backend and downloads directory usable", body = ReadyResponse),
        (status = 503, description = "At least one check failed", body = ReadyResponse)
    )
)]
pub async fn readyz(State(service): State<StorageService>) -> impl IntoResponse {
    // 1) Backend check
    let backend_check = match service.backend.list_buckets().await {
        Ok(_) => (true, None::<String>),
        Err(e) => (false, Some(e.to_string())),
    };

    // 2) Disk write/read/delete check
    let tmp_path = service
        .downloads_dir
        .join(format!(".readyz-{}", Uuid::new_v4()));
    let disk_check = match fs::write(&tmp_path, b"readyz").await {
        Ok(_) => {
            let read = fs::read(&tmp_path).await;
            let _ = fs::remove_file(&tmp_path).await;
            match read {
                Ok(bytes) if bytes == b"readyz" => (true, None),
                Ok(_) => (false, Some("file content mismatch".to_string())),
                Err(e) => (false, Some(format!("could not read tmp file: {}", e))),
            }
        }
        Err(e) => (false, Some(format!("could not write tmp file: {}", e))),
    };

    let overall_ok = backend_check.0 && disk_check.0;

    let mut checks = HashMap::new();
    checks.insert(
        "backend".to_string(),
        CheckStatus {
            ok: backend_check.0,
            error: backend_check.1,
        },
    );
    checks.insert(
        "disk".to_string(),
        CheckStatus {
            ok: disk_check.0,
            error: disk_check.1,
        },
    );

    let body = ReadyResponse {
        status: if overall_ok { "ok" } else { "error" }.into(),
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize, ToSchema)]
pub(crate) struct HealthResponse {
    status: String,
    message: String,
}

#[derive(Serialize, ToSchema)]
pub(crate) struct ReadyResponse {
    status: String,
    checks: HashMap<String, CheckStatus>,
}

#[derive(Serialize, ToSchema)]
pub(crate) struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
