//! Object-store adapter: the seam between the service and whatever holds
//! the bytes. The store is flat; keys are opaque strings and every notion
//! of hierarchy lives above this trait.

pub mod fs;
#[cfg(test)]
pub mod memory;
pub mod rewrite;

use std::{collections::BTreeSet, io};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncRead;

/// Streamed object payload, opened lazily by `get`.
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// Metadata kept alongside every object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub size: i64,
    pub content_type: String,
    pub etag: String,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object `{0}` not found")]
    NotFound(String),
    #[error("invalid object key `{0}`")]
    InvalidKey(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Metadata(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Minimal key/value object-store surface the core needs: atomic per-key
/// put/get/delete/copy plus a finite, restartable prefix listing. Connection
/// handling, retries, and credentials are the implementer's business.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Open an object for reading. The payload is streamed, not buffered.
    async fn get(&self, key: &str) -> StoreResult<(ObjectMeta, ObjectReader)>;

    /// Store an object, overwriting any existing one at `key`.
    async fn put(&self, key: &str, content_type: &str, data: Bytes) -> StoreResult<()>;

    /// Delete an object. Deleting a missing key is a `NotFound` error.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Copy `src` to `dst` within the bucket, metadata included.
    async fn copy(&self, src: &str, dst: &str) -> StoreResult<()>;

    /// All keys starting with `prefix`, in ascending lexical order.
    /// When `recursive` is false, keys are collapsed to their first `/`
    /// beyond the prefix, S3 common-prefix style.
    async fn list(&self, prefix: &str, recursive: bool) -> StoreResult<Vec<String>>;

    async fn bucket_exists(&self) -> StoreResult<bool>;

    async fn create_bucket(&self) -> StoreResult<()>;
}

const MAX_KEY_LEN: usize = 1024;

/// Basic key validation to keep trivially bad keys out of the backends.
/// Rejects empty, over-long, and absolute keys, and any whole `..` path
/// segment; consecutive dots inside a name (`report..v2.txt`) are legal.
/// A trailing `/` is allowed because directory markers are stored that way.
pub fn ensure_key_safe(key: &str) -> StoreResult<()> {
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    if key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    if key
        .bytes()
        .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0')
    {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Collapse a recursive key listing to one entry per first-level child of
/// `prefix`: keys with a `/` beyond the prefix are truncated just after it
/// and deduplicated.
pub(crate) fn collapse_to_first_level(keys: Vec<String>, prefix: &str) -> Vec<String> {
    let mut out = BTreeSet::new();
    for key in keys {
        let rest = &key[prefix.len()..];
        match rest.find('/') {
            Some(pos) => {
                out.insert(format!("{}{}", prefix, &rest[..=pos]));
            }
            None => {
                out.insert(key);
            }
        }
    }
    out.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_validation() {
        assert!(ensure_key_safe("docs/a.txt").is_ok());
        assert!(ensure_key_safe("docs/").is_ok());
        assert!(ensure_key_safe("").is_err());
        assert!(ensure_key_safe("/abs").is_err());
        assert!(ensure_key_safe("a/../b").is_err());
        assert!(ensure_key_safe("..").is_err());
        assert!(ensure_key_safe("a\\b").is_err());
    }

    #[test]
    fn dotted_names_are_valid_keys() {
        assert!(ensure_key_safe("backend/docs/report..v2.txt").is_ok());
        assert!(ensure_key_safe("archive..2024/notes.txt").is_ok());
    }

    #[test]
    fn collapse_groups_common_prefixes() {
        let keys = vec![
            "root/a/x.txt".to_string(),
            "root/a/y.txt".to_string(),
            "root/b.txt".to_string(),
        ];
        let collapsed = collapse_to_first_level(keys, "root/");
        assert_eq!(collapsed, vec!["root/a/", "root/b.txt"]);
    }
}
