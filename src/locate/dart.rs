//! Dart/Flutter symbol-file discovery
//!
//! Flutter's `--split-debug-info` build emits files named like
//! `app.android-arm64.symbols` or `app.ios-arm64.symbols`; the platform
//! flavor and architecture are read from that name segment. iOS symbol
//! files are identified via the companion app binary, whose default
//! location is derived from the symbols path.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{has_suffix, LocateError};

/// Suffix of Dart symbol files.
pub const SYMBOLS_SUFFIX: &str = ".symbols";

/// Platform flavor embedded in a symbol file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DartPlatform {
    Android,
    Ios,
}

impl DartPlatform {
    /// Wire value for the `platform` upload field.
    pub fn as_str(&self) -> &'static str {
        match self {
            DartPlatform::Android => "android",
            DartPlatform::Ios => "ios",
        }
    }
}

/// Recursively collect `*.symbols` files under a root path, in path
/// order. A file input is accepted as-is when it has the right suffix.
pub fn discover_symbol_files(root: &Path) -> Result<Vec<PathBuf>, LocateError> {
    if root.is_file() {
        if has_suffix(root, SYMBOLS_SUFFIX) {
            return Ok(vec![root.to_path_buf()]);
        }
        return Err(LocateError::NothingFound {
            kind: "symbol",
            path: root.to_path_buf(),
        });
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_suffix(path, SYMBOLS_SUFFIX))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(LocateError::NothingFound {
            kind: "symbol",
            path: root.to_path_buf(),
        });
    }
    Ok(files)
}

/// Platform and architecture from a symbol file name
/// (`app.ios-arm64.symbols` → iOS, `arm64`).
pub fn platform_and_arch(path: &Path) -> Option<(DartPlatform, String)> {
    let name = path.file_name()?.to_string_lossy();
    let stem = name.strip_suffix(SYMBOLS_SUFFIX)?;
    let segment = stem.rsplit('.').next()?;
    let (platform, arch) = segment.split_once('-')?;

    let platform = match platform {
        "android" => DartPlatform::Android,
        "ios" => DartPlatform::Ios,
        _ => return None,
    };
    Some((platform, arch.to_string()))
}

/// Default location of the companion iOS app binary for a symbols file:
/// `<dart-root>/build/ios/iphoneos/<App>.app/Frameworks/App.framework/App`,
/// where `<dart-root>` is two parent segments above the symbols file.
pub fn default_ios_app_path(symbols: &Path) -> Option<PathBuf> {
    let dart_root = symbols.parent()?.parent()?;
    let iphoneos = dart_root.join("build").join("ios").join("iphoneos");

    for entry in fs::read_dir(&iphoneos).ok()?.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "app") {
            let app = path.join("Frameworks").join("App.framework").join("App");
            if app.is_file() {
                return Some(app);
            }
        }
    }
    None
}
