//! dSYM debug-bundle discovery
//!
//! Scans a directory one level deep for dSYM bundles, extracting
//! compressed archives (`.tar.gz`/`.tgz`) into scratch directories
//! first. Every candidate is identified through `dwarfdump`; entries
//! without an embedded UUID are skipped with a note since a build may
//! legitimately produce bundles without debug info.

use std::fs;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::console;
use crate::inspect::{dwarf, InspectError};

use super::{ArtifactKind, ArtifactRecord, LocateError, ScratchDirs};

/// Archive suffixes recognized as compressed bundle containers.
const ARCHIVE_SUFFIXES: [&str; 2] = [".tar.gz", ".tgz"];

/// True for compressed debug-bundle archives.
pub fn is_bundle_archive(path: &Path) -> bool {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
        return false;
    };
    ARCHIVE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Extract a compressed bundle archive into a fresh scratch directory.
///
/// The scratch directory is registered for cleanup before extraction
/// starts, so a partial extraction is still removed at finalize.
pub fn extract_archive(archive: &Path, scratch: &mut ScratchDirs) -> Result<PathBuf, LocateError> {
    let target = scratch.create("traceline-dsym")?;

    let file = fs::File::open(archive)?;
    let mut tarball = tar::Archive::new(GzDecoder::new(file));
    tarball.unpack(&target)?;

    Ok(target)
}

/// Discover debug bundles under a root path (directory, archive, or a
/// single bundle), producing one record per architecture slice.
pub fn discover(root: &Path, scratch: &mut ScratchDirs) -> Result<Vec<ArtifactRecord>, LocateError> {
    if !dwarf::dwarfdump_available() {
        return Err(InspectError::ToolMissing {
            tool: crate::tools::DWARFDUMP.to_string(),
        }
        .into());
    }

    let mut records = Vec::new();

    if root.is_dir() && !root.to_string_lossy().ends_with(".dSYM") {
        let mut entries: Vec<PathBuf> = fs::read_dir(root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .collect();
        entries.sort();

        if entries.is_empty() {
            return Err(LocateError::NothingFound {
                kind: "dSYM",
                path: root.to_path_buf(),
            });
        }

        for entry in entries {
            scan_entry(&entry, scratch, &mut records)?;
        }
    } else {
        scan_entry(root, scratch, &mut records)?;
    }

    Ok(records)
}

fn scan_entry(
    entry: &Path,
    scratch: &mut ScratchDirs,
    records: &mut Vec<ArtifactRecord>,
) -> Result<(), LocateError> {
    if is_bundle_archive(entry) {
        let name = entry
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        console::info(&format!("Extracting {} before uploading", name));

        match extract_archive(entry, scratch) {
            Ok(extracted) => {
                for inner in sorted_entries(&extracted)? {
                    append_bundle_records(&inner, records)?;
                }
            }
            Err(e) => {
                // Extraction failure skips the archive, not the batch;
                // the scratch directory is already scheduled for cleanup.
                console::warn(&format!("could not extract {}, skipping: {}", name, e));
            }
        }
        return Ok(());
    }

    append_bundle_records(entry, records)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, LocateError> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    entries.sort();
    Ok(entries)
}

fn append_bundle_records(
    candidate: &Path,
    records: &mut Vec<ArtifactRecord>,
) -> Result<(), LocateError> {
    let dir = candidate
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let name = candidate
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let infos = dwarf::dump_uuids(&dir, &name)?;
    if infos.is_empty() {
        console::info(&format!("Skipping file without UUID: {}", name));
        return Ok(());
    }

    for info in infos {
        records.push(ArtifactRecord {
            source: dir.join(&info.name),
            kind: ArtifactKind::DebugBundle,
            build_id: info.uuid,
            arch: Some(info.arch),
            name: Some(info.name),
        });
    }
    Ok(())
}
