//! HTTP handlers for simulated-directory operations. Directories are not
//! store entities; these endpoints drive the prefix-rewrite engine through
//! `FileService`.

use crate::{
    errors::AppError,
    models::requests::{DirRequest, Move, Rename},
    services::file_service::FileService,
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

/// POST `/dir/create` — body `{"dir": ...}`; stores a zero-byte marker.
pub async fn create_directory(
    State(service): State<FileService>,
    body: Result<Json<DirRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(req) = body.map_err(AppError::unprocessable)?;
    service.create_directory(&req.dir).await?;
    Ok(StatusCode::CREATED)
}

/// POST `/dir/rename` — body `{"old": ..., "new": ...}`. Fail-fast: a
/// partial failure leaves the directory split across both prefixes and is
/// reported as the failing key's error.
pub async fn rename_directory(
    State(service): State<FileService>,
    body: Result<Json<Rename>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(req) = body.map_err(AppError::unprocessable)?;
    service.rename_directory(req).await?;
    Ok(StatusCode::OK)
}

/// POST `/dir/move` — body `{"src": ..., "dst": ...}`.
pub async fn move_directory(
    State(service): State<FileService>,
    body: Result<Json<Move>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(req) = body.map_err(AppError::unprocessable)?;
    service.move_directory(req).await?;
    Ok(StatusCode::OK)
}

/// DELETE `/dir/remove` — body `{"dir": ...}`. Best-effort: per-key delete
/// failures are logged, the call still returns 200.
pub async fn remove_directory(
    State(service): State<FileService>,
    body: Result<Json<DirRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(req) = body.map_err(AppError::unprocessable)?;
    service.remove_directory(&req.dir).await?;
    Ok(StatusCode::OK)
}
