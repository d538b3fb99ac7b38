//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that probes the object store

use crate::services::file_service::FileService;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;

/// `GET /healthz`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that asks the object store whether the bucket is
/// reachable. A missing bucket is still "ready" since uploads create it;
/// only a failing store call flips the check.
///
/// Returns JSON describing the check. HTTP 200 when it passes, HTTP 503
/// when it fails.
pub async fn readyz(State(service): State<FileService>) -> impl IntoResponse {
    let store_check = match service.store_ready().await {
        Ok(bucket_exists) => CheckStatus {
            ok: true,
            detail: Some(format!("bucket exists: {}", bucket_exists)),
        },
        Err(e) => CheckStatus {
            ok: false,
            detail: Some(format!("error: {}", e)),
        },
    };

    let overall_ok = store_check.ok;

    let mut checks = HashMap::new();
    checks.insert("store", store_check);

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    detail: Option<String>,
}
