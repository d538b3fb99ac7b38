//! In-memory object store used by tests. Supports injecting copy and
//! delete failures on chosen keys so partial-failure paths in the rewrite
//! engine are testable without a real backend.

use std::{
    collections::{BTreeMap, HashSet},
    io::{self, Cursor},
    sync::Mutex,
};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;

use super::{
    collapse_to_first_level, ensure_key_safe, ObjectMeta, ObjectReader, ObjectStore, StoreError,
    StoreResult,
};

#[derive(Default)]
struct State {
    objects: BTreeMap<String, (ObjectMeta, Bytes)>,
    bucket_created: bool,
    fail_copy_to: HashSet<String>,
    fail_delete_of: HashSet<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `copy` targeting `dst` fail with an I/O error.
    pub fn fail_copy_to(&self, dst: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_copy_to
            .insert(dst.to_string());
    }

    /// Make every `delete` of `key` fail with an I/O error.
    pub fn fail_delete_of(&self, key: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_delete_of
            .insert(key.to_string());
    }

    pub fn keys(&self) -> Vec<String> {
        self.state.lock().unwrap().objects.keys().cloned().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().unwrap().objects.contains_key(key)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<(ObjectMeta, ObjectReader)> {
        ensure_key_safe(key)?;
        let state = self.state.lock().unwrap();
        let (meta, data) = state
            .objects
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        let reader = Box::new(Cursor::new(data.to_vec())) as ObjectReader;
        Ok((meta.clone(), reader))
    }

    async fn put(&self, key: &str, content_type: &str, data: Bytes) -> StoreResult<()> {
        ensure_key_safe(key)?;
        let meta = ObjectMeta {
            size: data.len() as i64,
            content_type: content_type.to_string(),
            etag: format!("{:x}", md5::compute(&data)),
            last_modified: Utc::now(),
        };
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(key.to_string(), (meta, data));
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        ensure_key_safe(key)?;
        let mut state = self.state.lock().unwrap();
        if state.fail_delete_of.contains(key) {
            return Err(StoreError::Io(io::Error::other("injected delete failure")));
        }
        state
            .objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn copy(&self, src: &str, dst: &str) -> StoreResult<()> {
        ensure_key_safe(src)?;
        ensure_key_safe(dst)?;
        let mut state = self.state.lock().unwrap();
        if state.fail_copy_to.contains(dst) {
            return Err(StoreError::Io(io::Error::other("injected copy failure")));
        }
        let (mut meta, data) = state
            .objects
            .get(src)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(src.to_string()))?;
        meta.last_modified = Utc::now();
        state.objects.insert(dst.to_string(), (meta, data));
        Ok(())
    }

    async fn list(&self, prefix: &str, recursive: bool) -> StoreResult<Vec<String>> {
        let state = self.state.lock().unwrap();
        let keys: Vec<String> = state
            .objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        if recursive {
            Ok(keys)
        } else {
            Ok(collapse_to_first_level(keys, prefix))
        }
    }

    async fn bucket_exists(&self) -> StoreResult<bool> {
        Ok(self.state.lock().unwrap().bucket_created)
    }

    async fn create_bucket(&self) -> StoreResult<()> {
        self.state.lock().unwrap().bucket_created = true;
        Ok(())
    }
}
