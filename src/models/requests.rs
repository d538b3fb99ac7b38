//! Request bodies for the file and directory endpoints.
//!
//! All paths here are user-facing, relative to the configured root folder;
//! the service prepends the root prefix before any key touches the store.

use bytes::Bytes;
use serde::Deserialize;

/// Body for `POST /file/rename` and `POST /dir/rename`.
#[derive(Debug, Clone, Deserialize)]
pub struct Rename {
    pub old: String,
    pub new: String,
}

/// Body for `POST /file/move` and `POST /dir/move`.
#[derive(Debug, Clone, Deserialize)]
pub struct Move {
    pub src: String,
    pub dst: String,
}

/// Body for `DELETE /file/remove`.
#[derive(Debug, Deserialize)]
pub struct RemoveFile {
    pub filename: String,
}

/// Body for `POST /dir/create` and `DELETE /dir/remove`.
#[derive(Debug, Deserialize)]
pub struct DirRequest {
    pub dir: String,
}

/// One decoded part of a multipart upload, ready for the service.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Filename as submitted, relative to `dir` (not yet normalized).
    pub name: String,
    /// Target directory, relative to the root folder.
    pub dir: String,
    /// MIME type reported by the client part headers.
    pub content_type: String,
    /// Full payload. Uploads are buffered before hitting the store.
    pub data: Bytes,
}

impl Upload {
    /// Replace spaces in the filename with underscores so keys stay
    /// URL-friendly. Mirrors what the frontend expects back in listings.
    pub fn normalized_name(&self) -> String {
        self.name.replace(' ', "_")
    }
}
