//! Upward marker search
//!
//! Several metadata fields (manifest path, project root) are derived
//! from a discovered file by walking parent segments upward until a
//! known directory-name marker appears. The walk is bounded: if the
//! marker is not found within `max_depth` parents the field is left
//! unresolved for the metadata resolver to decide on.

use std::path::{Path, PathBuf};

/// Walk up from `path`, returning the first ancestor (within
/// `max_depth` parent segments) whose directory name equals `marker`.
pub fn locate_marker(path: &Path, marker: &str, max_depth: usize) -> Option<PathBuf> {
    let mut current = path;
    for _ in 0..max_depth {
        current = current.parent()?;
        if current.file_name().is_some_and(|name| name == marker) {
            return Some(current.to_path_buf());
        }
    }
    None
}
