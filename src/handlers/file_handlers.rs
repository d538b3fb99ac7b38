//! HTTP handlers for file operations and the `/static` surface.
//! Streams file bodies out of the store without buffering and keeps all
//! path handling in `FileService`.

use crate::{
    errors::AppError,
    models::requests::{Move, RemoveFile, Rename, Upload},
    services::file_service::FileService,
    store::ObjectMeta,
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tokio_util::io::ReaderStream;
use tracing::info;

/// GET `/static/{*path}` — stream one file with its stored headers.
pub async fn get_static_file(
    State(service): State<FileService>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let (meta, reader) = service
        .get_file(&path)
        .await
        .map_err(AppError::internal)?;

    let body = Body::from_stream(ReaderStream::new(reader));
    let mut response = Response::new(body);
    set_file_headers(response.headers_mut(), &meta);
    Ok(response)
}

/// GET `/static` — synthesize and return the whole directory tree.
pub async fn get_tree(State(service): State<FileService>) -> Result<Response, AppError> {
    info!("listing bucket tree");
    let roots = service.get_files().await.map_err(AppError::internal)?;
    Ok(Json(roots).into_response())
}

/// POST `/file/upload` — multipart form with a `dir` field and one or more
/// `file` parts. Any malformed part fails the whole request with 400.
pub async fn upload(
    State(service): State<FileService>,
    mut multipart: Multipart,
) -> Result<StatusCode, AppError> {
    let mut dir: Option<String> = None;
    let mut files: Vec<(String, String, Bytes)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(AppError::bad_request)?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("dir") => {
                dir = Some(field.text().await.map_err(AppError::bad_request)?);
            }
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(AppError::bad_request)?;
                files.push((name, content_type, data));
            }
            _ => {}
        }
    }

    let dir = dir.ok_or_else(|| AppError::bad_request("missing `dir` field"))?;
    if files.is_empty() {
        return Err(AppError::bad_request("missing `file` field"));
    }

    for (name, content_type, data) in files {
        service
            .upload_file(Upload {
                name,
                dir: dir.clone(),
                content_type,
                data,
            })
            .await
            .map_err(AppError::bad_request)?;
    }

    Ok(StatusCode::CREATED)
}

/// DELETE `/file/remove` — body `{"filename": ...}`.
pub async fn remove_file(
    State(service): State<FileService>,
    body: Result<Json<RemoveFile>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(req) = body.map_err(AppError::unprocessable)?;
    service
        .remove_file(&req.filename)
        .await
        .map_err(AppError::unprocessable)?;
    Ok(StatusCode::OK)
}

/// POST `/file/rename` — body `{"old": ..., "new": ...}`.
pub async fn rename_file(
    State(service): State<FileService>,
    body: Result<Json<Rename>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(req) = body.map_err(AppError::unprocessable)?;
    service.rename_file(req).await?;
    Ok(StatusCode::OK)
}

/// POST `/file/move` — body `{"src": ..., "dst": ...}`.
pub async fn move_file(
    State(service): State<FileService>,
    body: Result<Json<Move>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(req) = body.map_err(AppError::unprocessable)?;
    service.move_file(req).await?;
    Ok(StatusCode::OK)
}

fn set_file_headers(headers: &mut HeaderMap, meta: &ObjectMeta) {
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&meta.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&meta.size.max(0).to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );
    if let Ok(value) = HeaderValue::from_str(&format!("\"{}\"", meta.etag)) {
        headers.insert(header::ETAG, value);
    }
    if let Ok(value) = HeaderValue::from_str(&meta.last_modified.to_rfc2822()) {
        headers.insert(header::LAST_MODIFIED, value);
    }
}
