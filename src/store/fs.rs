//! Disk-backed object store.
//!
//! Payloads live under `base/{bucket}/data/{shard}/{shard}/{encoded-key}`
//! with a parallel `meta/` tree of JSON sidecars. Keys are percent-encoded
//! into a single path component, so slashes and trailing-`/` directory
//! markers are representable without giving the filesystem any say in the
//! simulated hierarchy. Two md5-derived shard levels keep per-directory
//! file counts down.

use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

use super::{
    collapse_to_first_level, ensure_key_safe, ObjectMeta, ObjectReader, ObjectStore, StoreError,
    StoreResult,
};

#[derive(Clone)]
pub struct FsStore {
    base_path: PathBuf,
    bucket: String,
}

impl FsStore {
    pub fn new(base_path: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            bucket: bucket.into(),
        }
    }

    fn bucket_root(&self) -> PathBuf {
        self.base_path.join(&self.bucket)
    }

    fn data_root(&self) -> PathBuf {
        self.bucket_root().join("data")
    }

    fn meta_root(&self) -> PathBuf {
        self.bucket_root().join("meta")
    }

    /// Two-level shard identifiers derived from md5(bucket/key).
    fn shards(&self, key: &str) -> (String, String) {
        let digest = md5::compute(format!("{}/{}", self.bucket, key));
        (format!("{:02x}", digest[0]), format!("{:02x}", digest[1]))
    }

    fn sharded(&self, root: PathBuf, key: &str) -> PathBuf {
        let (a, b) = self.shards(key);
        root.join(a).join(b).join(urlencoding::encode(key).as_ref())
    }

    fn data_path(&self, key: &str) -> PathBuf {
        self.sharded(self.data_root(), key)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.sharded(self.meta_root(), key)
    }

    async fn read_meta(&self, key: &str) -> StoreResult<ObjectMeta> {
        let raw = fs::read(self.meta_path(key)).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StoreError::NotFound(key.to_string())
            } else {
                StoreError::Io(err)
            }
        })?;
        Ok(serde_json::from_slice(&raw)?)
    }

    async fn write_meta(&self, key: &str, meta: &ObjectMeta) -> StoreResult<()> {
        let path = self.meta_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, serde_json::to_vec(meta)?).await?;
        Ok(())
    }

    /// Write bytes to a temp file, fsync, then rename into place.
    async fn write_payload(&self, path: &Path, data: &Bytes) -> StoreResult<()> {
        let parent = path
            .parent()
            .ok_or_else(|| {
                StoreError::Io(io::Error::other("object path missing parent directory"))
            })?
            .to_path_buf();
        fs::create_dir_all(&parent).await?;

        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;
        let write_res = async {
            file.write_all(data).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;
        if let Err(err) = write_res {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io(err));
        }

        if let Err(err) = fs::rename(&tmp_path, path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io(err));
        }
        Ok(())
    }

    /// Remove empty shard directories left behind by a delete, stopping at
    /// `stop` or at the first non-empty directory.
    async fn prune_empty_dirs(&self, start: &Path, stop: &Path) {
        let mut current = start.to_path_buf();
        while current.starts_with(stop) && current != stop {
            match fs::remove_dir(&current).await {
                Ok(_) => match current.parent() {
                    Some(parent) => current = parent.to_path_buf(),
                    None => break,
                },
                Err(err) if err.kind() == ErrorKind::NotFound => break,
                Err(err) if err.kind() == ErrorKind::DirectoryNotEmpty => break,
                Err(err) => {
                    debug!("failed to prune directory {}: {}", current.display(), err);
                    break;
                }
            }
        }
    }

    /// Walk the two shard levels under `data/` and decode every stored key.
    async fn all_keys(&self) -> StoreResult<Vec<String>> {
        let data_root = self.data_root();
        let mut keys = Vec::new();

        let mut level_a = match fs::read_dir(&data_root).await {
            Ok(rd) => rd,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(keys),
            Err(err) => return Err(StoreError::Io(err)),
        };
        while let Some(shard_a) = level_a.next_entry().await? {
            let mut level_b = fs::read_dir(shard_a.path()).await?;
            while let Some(shard_b) = level_b.next_entry().await? {
                let mut objects = fs::read_dir(shard_b.path()).await?;
                while let Some(entry) = objects.next_entry().await? {
                    let name = entry.file_name();
                    let Some(encoded) = name.to_str() else {
                        continue;
                    };
                    if encoded.starts_with(".tmp-") {
                        continue;
                    }
                    if let Ok(key) = urlencoding::decode(encoded) {
                        keys.push(key.into_owned());
                    }
                }
            }
        }
        Ok(keys)
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    async fn get(&self, key: &str) -> StoreResult<(ObjectMeta, ObjectReader)> {
        ensure_key_safe(key)?;
        let meta = self.read_meta(key).await?;
        let file = File::open(self.data_path(key)).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StoreError::NotFound(key.to_string())
            } else {
                StoreError::Io(err)
            }
        })?;
        Ok((meta, Box::new(file) as ObjectReader))
    }

    async fn put(&self, key: &str, content_type: &str, data: Bytes) -> StoreResult<()> {
        ensure_key_safe(key)?;
        let meta = ObjectMeta {
            size: data.len() as i64,
            content_type: content_type.to_string(),
            etag: format!("{:x}", md5::compute(&data)),
            last_modified: Utc::now(),
        };
        self.write_payload(&self.data_path(key), &data).await?;
        self.write_meta(key, &meta).await?;
        debug!(key, size = meta.size, "stored object");
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        ensure_key_safe(key)?;
        let data_path = self.data_path(key);
        match fs::remove_file(&data_path).await {
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(key.to_string()));
            }
            Err(err) => return Err(StoreError::Io(err)),
        }
        let meta_path = self.meta_path(key);
        if let Err(err) = fs::remove_file(&meta_path).await {
            if err.kind() != ErrorKind::NotFound {
                return Err(StoreError::Io(err));
            }
        }

        if let Some(parent) = data_path.parent() {
            self.prune_empty_dirs(parent, &self.data_root()).await;
        }
        if let Some(parent) = meta_path.parent() {
            self.prune_empty_dirs(parent, &self.meta_root()).await;
        }
        Ok(())
    }

    async fn copy(&self, src: &str, dst: &str) -> StoreResult<()> {
        ensure_key_safe(src)?;
        ensure_key_safe(dst)?;
        let mut meta = self.read_meta(src).await?;

        let dst_path = self.data_path(dst);
        if let Some(parent) = dst_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(self.data_path(src), &dst_path)
            .await
            .map_err(|err| {
                if err.kind() == ErrorKind::NotFound {
                    StoreError::NotFound(src.to_string())
                } else {
                    StoreError::Io(err)
                }
            })?;

        meta.last_modified = Utc::now();
        self.write_meta(dst, &meta).await
    }

    async fn list(&self, prefix: &str, recursive: bool) -> StoreResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .all_keys()
            .await?
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect();
        keys.sort();
        if recursive {
            Ok(keys)
        } else {
            Ok(collapse_to_first_level(keys, prefix))
        }
    }

    async fn bucket_exists(&self) -> StoreResult<bool> {
        Ok(fs::try_exists(self.bucket_root()).await?)
    }

    async fn create_bucket(&self) -> StoreResult<()> {
        fs::create_dir_all(self.data_root()).await?;
        fs::create_dir_all(self.meta_root()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    async fn store() -> (tempfile::TempDir, FsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path(), "static");
        store.create_bucket().await.unwrap();
        (dir, store)
    }

    async fn read_all(mut reader: ObjectReader) -> Vec<u8> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn put_get_roundtrip() {
        let (_dir, store) = store().await;
        store
            .put("docs/a.txt", "text/plain", Bytes::from_static(b"hello"))
            .await
            .unwrap();

        let (meta, reader) = store.get("docs/a.txt").await.unwrap();
        assert_eq!(meta.size, 5);
        assert_eq!(meta.content_type, "text/plain");
        assert_eq!(meta.etag, format!("{:x}", md5::compute(b"hello")));
        assert_eq!(read_all(reader).await, b"hello");
    }

    #[tokio::test]
    async fn overwrite_replaces_payload() {
        let (_dir, store) = store().await;
        store
            .put("a.txt", "text/plain", Bytes::from_static(b"one"))
            .await
            .unwrap();
        store
            .put("a.txt", "text/plain", Bytes::from_static(b"two"))
            .await
            .unwrap();

        let (meta, reader) = store.get("a.txt").await.unwrap();
        assert_eq!(meta.size, 3);
        assert_eq!(read_all(reader).await, b"two");
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let (_dir, store) = store().await;
        let err = store.get("nope.txt").await.err().unwrap();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_object() {
        let (_dir, store) = store().await;
        store
            .put("a.txt", "text/plain", Bytes::from_static(b"x"))
            .await
            .unwrap();
        store.delete("a.txt").await.unwrap();

        assert!(matches!(
            store.get("a.txt").await.err().unwrap(),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            store.delete("a.txt").await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn copy_duplicates_payload_and_meta() {
        let (_dir, store) = store().await;
        store
            .put("src.txt", "text/plain", Bytes::from_static(b"data"))
            .await
            .unwrap();
        store.copy("src.txt", "sub/dst.txt").await.unwrap();

        let (meta, reader) = store.get("sub/dst.txt").await.unwrap();
        assert_eq!(meta.content_type, "text/plain");
        assert_eq!(read_all(reader).await, b"data");
        // Source untouched.
        assert!(store.get("src.txt").await.is_ok());
    }

    #[tokio::test]
    async fn dotted_filenames_round_trip() {
        let (_dir, store) = store().await;
        store
            .put("docs/report..v2.txt", "text/plain", Bytes::from_static(b"v2"))
            .await
            .unwrap();

        let (_, reader) = store.get("docs/report..v2.txt").await.unwrap();
        assert_eq!(read_all(reader).await, b"v2");
    }

    #[tokio::test]
    async fn marker_keys_are_storable() {
        let (_dir, store) = store().await;
        store
            .put("backend/newdir/", "application/octet-stream", Bytes::new())
            .await
            .unwrap();

        let keys = store.list("backend/", true).await.unwrap();
        assert_eq!(keys, vec!["backend/newdir/"]);
    }

    #[tokio::test]
    async fn list_filters_and_sorts() {
        let (_dir, store) = store().await;
        for key in ["root/b/y.txt", "root/a.txt", "root/b/x.txt", "other/z.txt"] {
            store
                .put(key, "text/plain", Bytes::from_static(b"."))
                .await
                .unwrap();
        }

        let keys = store.list("root/", true).await.unwrap();
        assert_eq!(keys, vec!["root/a.txt", "root/b/x.txt", "root/b/y.txt"]);

        let collapsed = store.list("root/", false).await.unwrap();
        assert_eq!(collapsed, vec!["root/a.txt", "root/b/"]);
    }

    #[tokio::test]
    async fn bucket_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path(), "static");
        assert!(!store.bucket_exists().await.unwrap());
        store.create_bucket().await.unwrap();
        assert!(store.bucket_exists().await.unwrap());
    }
}
