//! Native-library discovery under the Gradle build layout
//!
//! Directory inputs are resolved through the fixed convention
//! `<root>/app/build/intermediates/merged_native_libs/<variant>/...`;
//! a single `.so` file input works backwards from its own path to find
//! the same layout. Files carrying the processed `.sym.so` marker are
//! derived artifacts and never re-processed as sources.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{has_suffix, locate_marker, LocateError};

/// Directory-name marker for the native-library convention subtree.
pub const NATIVE_LIB_MARKER: &str = "merged_native_libs";

/// Parent segments between a discovered `.so` and the marker directory:
/// `merged_native_libs/<variant>/out/lib/<abi>/lib.so`.
pub const MARKER_DEPTH: usize = 5;

/// Files already produced by an earlier keep-debug-info pass.
const PROCESSED_SUFFIX: &str = ".sym.so";

/// Discovery result for one input path.
#[derive(Debug, Clone, Default)]
pub struct NdkDiscovery {
    /// Native libraries to process, in path order.
    pub files: Vec<PathBuf>,

    /// Resolved build variant, when one was determined.
    pub variant: Option<String>,

    /// Derived manifest path; unresolved when the layout gave no hint.
    pub manifest_path: Option<PathBuf>,

    /// Derived project root; unresolved when the layout gave no hint.
    pub project_root: Option<PathBuf>,
}

/// True for uploadable native libraries: `.so` files that do not carry
/// the processed marker suffix.
pub fn is_native_library(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "so") && !has_suffix(path, PROCESSED_SUFFIX)
}

/// Locate the convention subtree under a project root, failing fast
/// when it is absent.
pub fn convention_path(root: &Path) -> Result<PathBuf, LocateError> {
    let merged = root
        .join("app")
        .join("build")
        .join("intermediates")
        .join(NATIVE_LIB_MARKER);

    if merged.is_dir() {
        Ok(merged)
    } else {
        Err(LocateError::ConventionNotFound {
            root: root.to_path_buf(),
            expected: NATIVE_LIB_MARKER.to_string(),
        })
    }
}

/// Infer the build variant by inspecting the subdirectories of the
/// convention path. Anything other than exactly one candidate needs
/// explicit input.
pub fn infer_variant(merged: &Path) -> Result<String, LocateError> {
    let mut candidates = Vec::new();
    for entry in fs::read_dir(merged)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            candidates.push(entry.file_name().to_string_lossy().to_string());
        }
    }

    if candidates.len() == 1 {
        Ok(candidates.remove(0))
    } else {
        Err(LocateError::VariantUnresolved {
            dir: merged.to_path_buf(),
        })
    }
}

/// Recursively list native libraries under a directory, in path order.
pub fn list_native_libraries(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_native_library(path))
        .collect();
    files.sort();
    files
}

/// Discover native libraries from a root path (project directory or a
/// single `.so` file), deriving manifest and project-root hints from
/// the layout where possible.
pub fn discover(root: &Path, explicit_variant: Option<&str>) -> Result<NdkDiscovery, LocateError> {
    if root.is_dir() {
        discover_in_project(root, explicit_variant)
    } else if is_native_library(root) {
        Ok(discover_from_file(root))
    } else {
        Err(LocateError::NothingFound {
            kind: "native library",
            path: root.to_path_buf(),
        })
    }
}

fn discover_in_project(
    root: &Path,
    explicit_variant: Option<&str>,
) -> Result<NdkDiscovery, LocateError> {
    let merged = convention_path(root)?;

    let variant = match explicit_variant {
        Some(v) => v.to_string(),
        None => infer_variant(&merged)?,
    };

    let files = list_native_libraries(&merged.join(&variant));

    let manifest_path = root
        .join("app")
        .join("build")
        .join("intermediates")
        .join("merged_manifests")
        .join(&variant)
        .join("AndroidManifest.xml");

    Ok(NdkDiscovery {
        files,
        variant: Some(variant),
        manifest_path: Some(manifest_path),
        project_root: Some(root.to_path_buf()),
    })
}

fn discover_from_file(file: &Path) -> NdkDiscovery {
    let mut discovery = NdkDiscovery {
        files: vec![file.to_path_buf()],
        ..Default::default()
    };

    // Work back up to the marker directory to recover the same hints a
    // directory scan would have produced. Not finding it leaves the
    // fields unresolved for the metadata resolver.
    let Some(merged) = locate_marker(file, NATIVE_LIB_MARKER, MARKER_DEPTH) else {
        return discovery;
    };

    if let Ok(variant) = infer_variant(&merged) {
        discovery.manifest_path = Some(
            merged
                .parent()
                .map(|intermediates| {
                    intermediates
                        .join("merged_manifests")
                        .join(&variant)
                        .join("AndroidManifest.xml")
                })
                .unwrap_or_default(),
        );
        discovery.variant = Some(variant);
    }

    // merged_native_libs sits four segments below the project root
    discovery.project_root = merged.ancestors().nth(4).map(Path::to_path_buf);

    discovery
}
