//! FileService — the coordination layer between the HTTP handlers and the
//! object store. Every user-supplied path gets the configured root folder
//! prepended before it touches the store, and the root is stripped again
//! from anything the store returns. The heavy lifting lives elsewhere: tree
//! synthesis in [`crate::tree`], prefix fan-out in [`crate::store::rewrite`].

use std::{future::Future, sync::Arc, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    models::{
        requests::{Move, Rename, Upload},
        tree::SubDir,
    },
    store::{
        rewrite::{self, RewriteError},
        ObjectMeta, ObjectReader, ObjectStore, StoreError, StoreResult,
    },
    tree::{self, TreeError, TreeOptions},
};

#[derive(Debug, Error)]
pub enum FileError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
}

pub type FileResult<T> = Result<T, FileError>;

/// Orchestrates the file and directory verbs over an [`ObjectStore`].
#[derive(Clone)]
pub struct FileService {
    store: Arc<dyn ObjectStore>,
    /// Root folder, stored without a trailing slash (e.g. `backend`).
    root: String,
    /// Bound on upload and full-listing store calls.
    op_timeout: Duration,
    tree: TreeOptions,
}

impl FileService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        root: impl Into<String>,
        op_timeout: Duration,
        tree: TreeOptions,
    ) -> Self {
        Self {
            store,
            root: root.into().trim_end_matches('/').to_string(),
            op_timeout,
            tree,
        }
    }

    /// `<root>/<path>`, with any leading slash on the user path dropped.
    fn prefixed(&self, path: &str) -> String {
        format!("{}/{}", self.root, path.trim_start_matches('/'))
    }

    async fn timed<T>(
        &self,
        fut: impl Future<Output = StoreResult<T>>,
    ) -> FileResult<T> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(res) => Ok(res?),
            Err(_) => Err(FileError::Timeout(self.op_timeout)),
        }
    }

    /// Probe the underlying store for the readiness endpoint. Returns
    /// whether the bucket exists; an error means the store is unreachable.
    pub async fn store_ready(&self) -> FileResult<bool> {
        Ok(self.store.bucket_exists().await?)
    }

    /// Open a file for streaming out.
    pub async fn get_file(&self, path: &str) -> FileResult<(ObjectMeta, ObjectReader)> {
        Ok(self.store.get(&self.prefixed(path)).await?)
    }

    /// List everything under the root and synthesize the directory tree.
    /// An empty listing is a `NoData` error, not an empty tree.
    pub async fn get_files(&self) -> FileResult<Vec<SubDir>> {
        let keys = self.timed(self.store.list(&self.root, true)).await?;

        let strip = format!("{}/", self.root);
        let stripped: Vec<String> = keys
            .iter()
            .map(|k| tree::strip_root(k, &strip).to_string())
            .collect();

        let build = tree::build_tree(&stripped, &self.tree)?;
        if build.skipped > 0 {
            warn!(skipped = build.skipped, "listing dropped undecodable keys");
        }
        Ok(build.roots)
    }

    /// Store one uploaded file under `<root>/<dir>/<normalized name>`.
    /// Creates the bucket first if it does not exist yet.
    pub async fn upload_file(&self, upload: Upload) -> FileResult<()> {
        if !self.store.bucket_exists().await? {
            warn!("bucket missing, creating it");
            self.store.create_bucket().await?;
        }

        let name = upload.normalized_name();
        let dir = upload.dir.trim_matches('/');
        let key = if dir.is_empty() {
            self.prefixed(&name)
        } else {
            self.prefixed(&format!("{}/{}", dir, name))
        };

        info!(key, size = upload.data.len(), "uploading file");
        self.timed(self.store.put(&key, &upload.content_type, upload.data))
            .await
    }

    pub async fn remove_file(&self, path: &str) -> FileResult<()> {
        Ok(self.store.delete(&self.prefixed(path)).await?)
    }

    pub async fn rename_file(&self, req: Rename) -> FileResult<()> {
        Ok(rewrite::rename_key(
            self.store.as_ref(),
            &self.prefixed(&req.old),
            &self.prefixed(&req.new),
        )
        .await?)
    }

    /// A file move is the same key rewrite as a rename; only the request
    /// vocabulary differs.
    pub async fn move_file(&self, req: Move) -> FileResult<()> {
        Ok(rewrite::rename_key(
            self.store.as_ref(),
            &self.prefixed(&req.src),
            &self.prefixed(&req.dst),
        )
        .await?)
    }

    pub async fn create_directory(&self, dir: &str) -> FileResult<()> {
        Ok(rewrite::create_marker(self.store.as_ref(), &self.prefixed(dir)).await?)
    }

    pub async fn rename_directory(&self, req: Rename) -> FileResult<()> {
        let moved = rewrite::rename_prefix(
            self.store.as_ref(),
            &self.prefixed(&req.old),
            &self.prefixed(&req.new),
        )
        .await?;
        info!(old = req.old, new = req.new, moved, "renamed directory");
        Ok(())
    }

    pub async fn move_directory(&self, req: Move) -> FileResult<()> {
        let moved = rewrite::rename_prefix(
            self.store.as_ref(),
            &self.prefixed(&req.src),
            &self.prefixed(&req.dst),
        )
        .await?;
        info!(src = req.src, dst = req.dst, moved, "moved directory");
        Ok(())
    }

    /// Best-effort recursive removal; per-key failures are logged by the
    /// engine and do not fail the call.
    pub async fn remove_directory(&self, dir: &str) -> FileResult<()> {
        let outcome = rewrite::remove_prefix(self.store.as_ref(), &self.prefixed(dir)).await?;
        info!(
            dir,
            removed = outcome.applied,
            failed = outcome.failures.len(),
            "removed directory"
        );
        Ok(())
    }
}
