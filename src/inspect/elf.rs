//! ELF build-id extraction
//!
//! Dart Android symbol files carry a GNU build id note that the remote
//! store uses for deduplication. Reading it needs no external tool.

use std::fs;
use std::path::Path;

use object::Object;

use super::InspectError;

/// Read the GNU build id from an ELF file, hex-encoded.
///
/// Returns `Ok(None)` when the file parses but carries no build id; the
/// caller skips such files with a note rather than failing the batch.
pub fn read_build_id(path: &Path) -> Result<Option<String>, InspectError> {
    let data = fs::read(path)?;
    let file = object::File::parse(&*data).map_err(|e| InspectError::Malformed {
        file: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let build_id = file.build_id().map_err(|e| InspectError::Malformed {
        file: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    Ok(build_id.map(hex::encode))
}
