//! NDK objcopy transform
//!
//! Native libraries are not uploaded as-is: a debug-section-preserving
//! `llvm-objcopy` pass writes a sibling `.so.sym` file containing only
//! the debug info, and that derived file is what gets uploaded.

use std::env;
use std::path::{Path, PathBuf};

use crate::tools;

use super::InspectError;

/// Suffix of transform output files. Derived artifacts bearing this
/// suffix are never re-processed as sources.
pub const DEBUG_INFO_SUFFIX: &str = ".so.sym";

/// Resolve the NDK root from an explicit flag or `$ANDROID_NDK_ROOT`.
pub fn resolve_ndk_root(explicit: Option<&Path>) -> Result<PathBuf, InspectError> {
    if let Some(root) = explicit {
        return Ok(root.to_path_buf());
    }
    match env::var_os("ANDROID_NDK_ROOT") {
        Some(root) if !root.is_empty() => Ok(PathBuf::from(root)),
        _ => Err(InspectError::NdkRootMissing),
    }
}

/// Locate `llvm-objcopy` under an NDK installation.
///
/// The prebuilt toolchain lives at
/// `<ndk>/toolchains/llvm/prebuilt/<host>/bin/llvm-objcopy`, where the
/// host directory name varies by platform (e.g. `darwin-x86_64`,
/// `linux-x86_64`), so each prebuilt entry is probed.
pub fn ndk_objcopy_path(ndk_root: &Path) -> Result<PathBuf, InspectError> {
    let prebuilt = ndk_root.join("toolchains").join("llvm").join("prebuilt");

    let entries = std::fs::read_dir(&prebuilt)
        .map_err(|_| InspectError::ObjcopyNotFound(ndk_root.to_path_buf()))?;

    for entry in entries.flatten() {
        let candidate = entry.path().join("bin").join("llvm-objcopy");
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(InspectError::ObjcopyNotFound(ndk_root.to_path_buf()))
}

/// Derive the transform output path: same directory, trailing `.so`
/// replaced with `.so.sym`.
pub fn debug_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let out_name = match name.strip_suffix(".so") {
        Some(stem) => format!("{}{}", stem, DEBUG_INFO_SUFFIX),
        None => format!("{}{}", name, DEBUG_INFO_SUFFIX),
    };

    input.with_file_name(out_name)
}

/// Run the keep-debug-info transform on one native library, returning
/// the derived output path. Failure is a per-artifact error, not a
/// batch abort.
pub fn extract_debug_info(objcopy: &Path, input: &Path) -> Result<PathBuf, InspectError> {
    let output_path = debug_output_path(input);

    let input_arg = input.to_string_lossy().to_string();
    let output_arg = output_path.to_string_lossy().to_string();

    let output = tools::run(
        objcopy,
        &[
            "--compress-debug-sections=zlib",
            "--only-keep-debug",
            &input_arg,
            &output_arg,
        ],
        None,
    )
    .map_err(|e| InspectError::TransformFailed {
        file: input.to_path_buf(),
        detail: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(InspectError::TransformFailed {
            file: input.to_path_buf(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output_path)
}
