//! Artifact locator
//!
//! Given a root path (file or directory) and a platform kind, produces an
//! ordered list of [`ArtifactRecord`]s, resolving build-tool directory
//! conventions along the way. Each platform kind has its own locator
//! behind the same record shape:
//! - [`ndk`] — Android `merged_native_libs` shared objects
//! - [`dsym`] — dSYM debug bundles, including compressed archives
//! - [`dart`] — Flutter/Dart `*.symbols` files
//!
//! Scratch directories created during archive extraction are tracked in
//! [`ScratchDirs`], owned by the batch run and released exactly once at
//! finalize.

pub mod dart;
pub mod dsym;
pub mod marker;
pub mod ndk;

pub use marker::locate_marker;

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::console;
use crate::inspect::InspectError;

/// Closed set of artifact families, each with its own discovery
/// conventions, endpoint path, and file field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Android NDK shared-object symbols.
    NativeLibrary,
    /// dSYM debug bundles.
    DebugBundle,
    /// Dart/Flutter symbol files.
    SymbolFile,
}

/// One discovered artifact, ready for metadata resolution and upload.
#[derive(Debug, Clone)]
pub struct ArtifactRecord {
    /// File to upload (possibly a derived sibling, e.g. objcopy output).
    pub source: PathBuf,

    /// Platform family this artifact belongs to.
    pub kind: ArtifactKind,

    /// Opaque identifier used by the remote store for deduplication.
    pub build_id: String,

    /// Architecture, when the identifying format carries one.
    pub arch: Option<String>,

    /// Human-readable name for progress reporting.
    pub name: Option<String>,
}

impl ArtifactRecord {
    /// Display label used in progress and report lines.
    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.source
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| self.source.display().to_string())
        })
    }
}

/// Locator errors
#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    /// The expected build-output subtree is absent. Failing fast here is
    /// deliberate: scanning broadly would upload the wrong artifacts.
    #[error("unable to find {expected} in {root}")]
    ConventionNotFound { root: PathBuf, expected: String },

    /// The build variant could not be inferred and was not given.
    #[error("unable to determine the build variant in {dir}, please specify using `--variant`")]
    VariantUnresolved { dir: PathBuf },

    /// No uploadable artifacts were found at all.
    #[error("no {kind} files found in {path}")]
    NothingFound { kind: &'static str, path: PathBuf },

    #[error(transparent)]
    Inspect(#[from] InspectError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Scratch directories created during discovery.
///
/// Owned by the batch run; released exactly once at finalize regardless
/// of how the batch terminated. Dropping unreleased directories still
/// removes them, so an early panic cannot leak extraction output.
#[derive(Debug, Default)]
pub struct ScratchDirs {
    dirs: Vec<TempDir>,
}

impl ScratchDirs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh scratch directory and return its path. The handle
    /// stays here; callers never remove scratch paths themselves.
    pub fn create(&mut self, prefix: &str) -> io::Result<PathBuf> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        let path = dir.path().to_path_buf();
        self.dirs.push(dir);
        Ok(path)
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Remove every scratch directory. Removal failures are reported as
    /// warnings; a leftover temp directory never fails the batch.
    pub fn release(self) {
        for dir in self.dirs {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                console::warn(&format!(
                    "could not remove scratch directory {}: {}",
                    path.display(),
                    e
                ));
            }
        }
    }
}

/// True when `path` names a file with the given dotted suffix.
pub(crate) fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().ends_with(suffix))
        .unwrap_or(false)
}
