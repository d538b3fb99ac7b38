use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::services::file_service::FileError;

/// A lightweight wrapper for handler errors that keeps the message local.
///
/// Every failure path responds with `{"error": "<message>"}`; the status
/// code depends on the call site (decode failures are 422/400, store
/// failures are 500 or 422 per endpoint).
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, msg: impl fmt::Display) -> Self {
        Self {
            status,
            message: msg.to_string(),
        }
    }

    /// 500 Internal Server Error
    pub fn internal(msg: impl fmt::Display) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// 422 Unprocessable Entity
    pub fn unprocessable(msg: impl fmt::Display) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, msg)
    }

    /// 400 Bad Request
    pub fn bad_request(msg: impl fmt::Display) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

/// Default mapping for service failures where the endpoint contract says
/// 500: the store error message is surfaced verbatim.
impl From<FileError> for AppError {
    fn from(err: FileError) -> Self {
        AppError::internal(err)
    }
}
