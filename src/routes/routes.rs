//! Defines routes for the file-manager HTTP surface.
//!
//! ## Structure
//! - **Static endpoints**
//!   - `GET /static`          — full directory tree as JSON
//!   - `GET /static/{*path}`  — stream one file's bytes
//!
//! - **File endpoints**
//!   - `POST   /file/upload`  — multipart upload (`file` parts + `dir`)
//!   - `DELETE /file/remove`  — `{filename}`
//!   - `POST   /file/rename`  — `{old,new}`
//!   - `POST   /file/move`    — `{src,dst}`
//!
//! - **Directory endpoints**
//!   - `POST   /dir/create`   — `{dir}`
//!   - `POST   /dir/rename`   — `{old,new}`
//!   - `POST   /dir/move`     — `{src,dst}`
//!   - `DELETE /dir/remove`   — `{dir}`
//!
//! The wildcard `*path` allows nested paths like `photos/2025/img.jpg`.

use crate::{
    handlers::{
        dir_handlers::{create_directory, move_directory, remove_directory, rename_directory},
        file_handlers::{get_static_file, get_tree, move_file, remove_file, rename_file, upload},
        health_handlers::{healthz, readyz},
    },
    services::file_service::FileService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, header},
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tracing::warn;

/// Uploads are buffered in memory, so the body cap is a working threshold,
/// not a hard product limit. axum's 2 MB default is far too small for files.
const UPLOAD_BODY_LIMIT_BYTES: usize = 32 << 20;

/// Build and return the router for the whole HTTP surface.
///
/// The router carries shared state (`FileService`) to all handlers. CORS is
/// allowed for the single configured origin with the browser-facing methods
/// the frontend uses.
pub fn routes(cors_origin: &str) -> Router<FileService> {
    let router = Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // listing + file download
        .route("/static", get(get_tree))
        .route("/static/{*path}", get(get_static_file))
        // file-level routes
        .route(
            "/file/upload",
            post(upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT_BYTES)),
        )
        .route("/file/remove", delete(remove_file))
        .route("/file/rename", post(rename_file))
        .route("/file/move", post(move_file))
        // directory-level routes
        .route("/dir/create", post(create_directory))
        .route("/dir/rename", post(rename_directory))
        .route("/dir/move", post(move_directory))
        .route("/dir/remove", delete(remove_directory));

    match cors_layer(cors_origin) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn cors_layer(origin: &str) -> Option<CorsLayer> {
    let origin = match HeaderValue::from_str(origin) {
        Ok(value) => value,
        Err(_) => {
            warn!(origin, "invalid cors origin, cors disabled");
            return None;
        }
    };

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::CONTENT_TYPE,
                HeaderName::from_static("x-requested-with"),
            ]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::file_service::FileService, store::memory::MemoryStore, tree::TreeOptions,
    };
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use std::{sync::Arc, time::Duration};
    use tower::ServiceExt;

    fn app(store: Arc<MemoryStore>) -> Router {
        let service = FileService::new(
            store,
            "backend",
            Duration::from_secs(10),
            TreeOptions::default(),
        );
        routes("http://localhost:3000").with_state(service)
    }

    fn multipart_body(dir: &str, filename: &str, payload: &[u8]) -> (String, Vec<u8>) {
        let boundary = "filemanager-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"dir\"\r\n\r\n{dir}\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(payload);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        (format!("multipart/form-data; boundary={boundary}"), body)
    }

    #[tokio::test]
    async fn upload_accepts_bodies_beyond_default_axum_limit() {
        let store = Arc::new(MemoryStore::new());
        let app = app(store.clone());

        // 3 MiB payload, past axum's default 2 MB body cap but well under
        // the configured upload limit.
        let payload = vec![0u8; 3 * 1024 * 1024];
        let (content_type, body) = multipart_body("big", "blob.bin", &payload);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/file/upload")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(store.contains("backend/big/blob.bin"));
    }
}
