//! Directory-tree synthesis over a flat key listing.
//!
//! Object keys are opaque strings; `/` separators are the only notion of
//! hierarchy the store has. This module turns a prefix-stripped, flat key
//! list into nested [`SubDir`] nodes, one level of grouping at a time:
//! keys are bucketed by their first segment, the remainder of each key is
//! percent-decoded and classified as a file leaf or a deeper relative path,
//! and the deeper paths are fed back through the same grouping.
//!
//! Decode failures drop the contribution rather than aborting the build.
//! That matches the listing contract this service has always had; the
//! `skipped` counter on [`TreeBuild`] exists so callers can observe how
//! much was dropped.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::warn;

use crate::models::tree::{Dir, SubDir};

/// Knobs for the tree builder. Defaults reproduce the reference behavior.
#[derive(Debug, Clone)]
pub struct TreeOptions {
    /// When true, an empty key list is a [`TreeError::NoData`] error instead
    /// of an empty tree. Callers that want "empty directory" semantics can
    /// flip this; the HTTP server runs with the default.
    pub empty_is_error: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            empty_is_error: true,
        }
    }
}

/// A finished build: the top-level nodes plus how many contributions were
/// dropped because a segment failed to percent-decode.
#[derive(Debug)]
pub struct TreeBuild {
    pub roots: Vec<SubDir>,
    pub skipped: usize,
}

#[derive(Debug, Error)]
pub enum TreeError {
    /// The listing matched no keys at all.
    #[error("no data")]
    NoData,
}

/// True iff `segment` looks like a bare filename: it contains a `.` and no
/// `/`. This is a naming heuristic, not a MIME check; a directory literally
/// named `a.b` will be misclassified as a file.
pub fn is_file(segment: &str) -> bool {
    segment.contains('.') && !segment.contains('/')
}

/// Percent-decode one path segment. Returns `None` when the decoded bytes
/// are not valid UTF-8; the caller drops that contribution and the build
/// carries on.
pub fn unescape_segment(raw: &str) -> Option<String> {
    match urlencoding::decode(raw) {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(err) => {
            warn!(segment = raw, %err, "skipping undecodable path segment");
            None
        }
    }
}

/// Strip the configured root prefix (including its trailing slash) and any
/// trailing `/` left by a directory marker key.
pub fn strip_root<'a>(key: &'a str, root_prefix: &str) -> &'a str {
    key.strip_prefix(root_prefix)
        .unwrap_or(key)
        .trim_end_matches('/')
}

/// Build the nested tree for a flat, prefix-stripped key list.
///
/// Every key lands in exactly one place: as a file leaf under its parent
/// chain, as a (possibly empty) directory node, or nowhere if a segment of
/// it failed to decode.
pub fn build_tree(keys: &[String], opts: &TreeOptions) -> Result<TreeBuild, TreeError> {
    let mut skipped = 0usize;
    let roots = group_level(keys, &mut skipped);

    if roots.is_empty() && opts.empty_is_error {
        return Err(TreeError::NoData);
    }

    Ok(TreeBuild { roots, skipped })
}

/// One grouping pass: bucket keys by first segment, classify remainders,
/// recurse into the accumulated deeper paths. File lists are taken as-is,
/// without further splitting.
fn group_level(keys: &[String], skipped: &mut usize) -> Vec<SubDir> {
    let mut groups: BTreeMap<String, Dir> = BTreeMap::new();

    for key in keys {
        match key.split_once('/') {
            Some((head, rest)) if !head.is_empty() => {
                let acc = groups.entry(head.to_string()).or_default();
                match unescape_segment(rest) {
                    Some(rest) if is_file(&rest) => acc.files.push(rest),
                    Some(rest) => acc.sub_dirs.push(rest),
                    None => *skipped += 1,
                }
            }
            // No separator: the key itself names a directory with no
            // further known children (e.g. an empty-directory marker).
            _ => {
                groups.entry(key.clone()).or_default();
            }
        }
    }

    let mut nodes: Vec<SubDir> = groups
        .into_iter()
        .map(|(name, acc)| SubDir {
            name,
            sub_dirs: group_level(&acc.sub_dirs, skipped),
            files: acc.files,
        })
        .collect();

    // Descending lexical order at every level.
    nodes.sort_by(|a, b| b.name.cmp(&a.name));
    nodes
}
