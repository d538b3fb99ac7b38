//! Directory-tree node types.
//!
//! The store is flat; directories only exist as `/` separators inside keys
//! and as zero-byte `<dir>/` marker objects. `SubDir` is the synthetic node
//! the tree builder materializes for each listing request. It is never
//! persisted and carries no identity beyond its name.

use serde::Serialize;

/// One simulated directory: its name, its child directories, and the names
/// of files directly inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubDir {
    pub name: String,
    pub sub_dirs: Vec<SubDir>,
    pub files: Vec<String>,
}

/// Per-group accumulator used while grouping keys by their first segment.
/// `sub_dirs` holds one-level-deeper relative paths still awaiting recursion;
/// `files` holds leaf names taken as-is.
#[derive(Debug, Default, Clone)]
pub struct Dir {
    pub sub_dirs: Vec<String>,
    pub files: Vec<String>,
}
