//! Prefix-rewrite engine: directory rename, move, and delete simulated by
//! fanning out per-key store operations.
//!
//! The store has no directory primitive, so structural operations enumerate
//! every key under a prefix and rewrite each one individually. A rewrite is
//! a two-phase copy-then-delete; nothing here is atomic across keys, and a
//! failure partway through leaves the affected keys split between the old
//! and new prefixes. No rollback is attempted.
//!
//! Two failure policies exist and stay distinct:
//! [`FailurePolicy::AbortOnFirstError`] for rename/move and
//! [`FailurePolicy::CollectAndContinue`] for removal, where per-key errors
//! are logged and the overall call still succeeds.

use std::fmt;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, error};

use super::{ObjectStore, StoreError};

/// How a prefix fan-out reacts to a per-key failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failing key and surface its error. Keys already
    /// rewritten stay rewritten.
    AbortOnFirstError,
    /// Log each failing key and keep going. The overall call succeeds and
    /// reports the failures in its outcome.
    CollectAndContinue,
}

/// Phase of a single-key rewrite at the moment of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewritePhase {
    Copy,
    Delete,
}

impl fmt::Display for RewritePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewritePhase::Copy => f.write_str("copy"),
            RewritePhase::Delete => f.write_str("delete"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RewriteError {
    /// The initial prefix listing failed; nothing was touched.
    #[error("listing keys failed: {0}")]
    List(#[source] StoreError),
    /// A per-key operation failed. `phase` records how far the rewrite of
    /// that key got: a `Delete`-phase failure means the copy landed and the
    /// object now exists under both keys.
    #[error("{phase} of `{key}` failed: {source}")]
    Key {
        key: String,
        phase: RewritePhase,
        #[source]
        source: StoreError,
    },
}

/// Outcome of a prefix fan-out: how many keys were applied and, under
/// [`FailurePolicy::CollectAndContinue`], which ones failed.
#[derive(Debug, Default)]
pub struct PrefixOutcome {
    pub applied: usize,
    pub failures: Vec<RewriteError>,
}

enum PrefixOp<'a> {
    RenameTo(&'a str),
    Remove,
}

/// Rewrite one key: copy to the new location, then delete the original.
/// If the copy succeeds but the delete fails, the old key remains and the
/// object exists twice; that state is surfaced, not repaired.
pub async fn rename_key(
    store: &dyn ObjectStore,
    old: &str,
    new: &str,
) -> Result<(), RewriteError> {
    store.copy(old, new).await.map_err(|source| RewriteError::Key {
        key: old.to_string(),
        phase: RewritePhase::Copy,
        source,
    })?;
    store.delete(old).await.map_err(|source| RewriteError::Key {
        key: old.to_string(),
        phase: RewritePhase::Delete,
        source,
    })?;
    debug!(old, new, "rewrote key");
    Ok(())
}

/// Move every key under `old` to the same relative position under `new`.
/// Leaf segments and intermediate structure are preserved: `a/b/y.txt`
/// renamed from `a` to `c` lands at `c/b/y.txt`. Fail-fast.
pub async fn rename_prefix(
    store: &dyn ObjectStore,
    old: &str,
    new: &str,
) -> Result<usize, RewriteError> {
    let outcome =
        apply_prefix(store, old, PrefixOp::RenameTo(new), FailurePolicy::AbortOnFirstError)
            .await?;
    Ok(outcome.applied)
}

/// Delete every key under `prefix`, best-effort: per-key failures are
/// logged and collected, never fatal. Only a listing failure aborts.
pub async fn remove_prefix(
    store: &dyn ObjectStore,
    prefix: &str,
) -> Result<PrefixOutcome, RewriteError> {
    apply_prefix(store, prefix, PrefixOp::Remove, FailurePolicy::CollectAndContinue).await
}

/// Create an explicit empty-directory marker: a zero-byte object at `<dir>/`.
pub async fn create_marker(store: &dyn ObjectStore, dir: &str) -> Result<(), StoreError> {
    store
        .put(&format!("{}/", dir), "application/octet-stream", Bytes::new())
        .await
}

async fn apply_prefix(
    store: &dyn ObjectStore,
    prefix: &str,
    op: PrefixOp<'_>,
    policy: FailurePolicy,
) -> Result<PrefixOutcome, RewriteError> {
    let keys = store
        .list(prefix, true)
        .await
        .map_err(RewriteError::List)?;

    let mut outcome = PrefixOutcome::default();
    for key in keys {
        let result = match &op {
            PrefixOp::RenameTo(new) => {
                let dst = format!("{}{}", new, &key[prefix.len()..]);
                rename_key(store, &key, &dst).await
            }
            PrefixOp::Remove => store.delete(&key).await.map_err(|source| RewriteError::Key {
                key: key.clone(),
                phase: RewritePhase::Delete,
                source,
            }),
        };

        match result {
            Ok(()) => outcome.applied += 1,
            Err(err) => match policy {
                FailurePolicy::AbortOnFirstError => return Err(err),
                FailurePolicy::CollectAndContinue => {
                    error!(%err, "prefix fan-out key failure");
                    outcome.failures.push(err);
                }
            },
        }
    }
    Ok(outcome)
}
