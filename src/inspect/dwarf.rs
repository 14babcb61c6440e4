//! dwarfdump-based UUID extraction
//!
//! A dSYM container embeds one UUID per architecture slice. `dwarfdump -u`
//! prints them as lines of the form:
//!
//! ```text
//! UUID: E30C1BE5-DEB6-373C-98B4-52D827B7FF0D (arm64) MyApp.app.dSYM/Contents/Resources/DWARF/MyApp
//! ```
//!
//! Parsing strips the parentheses and tokenizes; anything that does not
//! produce exactly the four expected tokens is skipped rather than
//! reported, since dwarfdump interleaves diagnostics with its output.

use std::path::Path;

use crate::tools;

use super::InspectError;

/// One UUID line from dwarfdump output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DwarfInfo {
    /// Per-architecture debug identifier, used by the remote store for
    /// deduplication.
    pub uuid: String,

    /// Architecture of the slice (e.g. "arm64").
    pub arch: String,

    /// Name printed by dwarfdump, relative to the scan directory.
    pub name: String,
}

/// Parse `dwarfdump -u` output into triples, in input order.
///
/// Malformed lines never crash and never produce a partial triple.
pub fn parse_dwarfdump_output(output: &str) -> Vec<DwarfInfo> {
    let cleaned = output.trim_end_matches('\n').replace(['(', ')'], "");

    let mut infos = Vec::new();
    for line in cleaned.lines() {
        if !line.contains("UUID: ") {
            continue;
        }
        let tokens: Vec<&str> = line.split(' ').collect();
        if tokens.len() == 4 {
            infos.push(DwarfInfo {
                uuid: tokens[1].to_string(),
                arch: tokens[2].to_string(),
                name: tokens[3].to_string(),
            });
        }
    }
    infos
}

/// True when dwarfdump can be located on this system.
pub fn dwarfdump_available() -> bool {
    tools::locate(tools::DWARFDUMP).is_some()
}

/// Run `dwarfdump -u` on `file_name` inside `dir` and return the parsed
/// triples. An empty result means the container carries no embedded
/// identifier; callers treat that as a skip, not an error.
pub fn dump_uuids(dir: &Path, file_name: &str) -> Result<Vec<DwarfInfo>, InspectError> {
    let dwarfdump = tools::locate(tools::DWARFDUMP).ok_or_else(|| InspectError::ToolMissing {
        tool: tools::DWARFDUMP.to_string(),
    })?;

    let output = tools::run(&dwarfdump, &["-u", file_name], Some(dir))?;
    Ok(parse_dwarfdump_output(&String::from_utf8_lossy(&output.stdout)))
}

/// Return the UUID of the slice matching `arch` in `binary`, if any.
///
/// Used for Dart iOS symbol files, where the identifier lives in the
/// companion app binary rather than the symbols file itself.
pub fn uuid_for_arch(binary: &Path, arch: &str) -> Result<Option<String>, InspectError> {
    let dir = binary.parent().unwrap_or_else(|| Path::new("."));
    let name = binary
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let infos = dump_uuids(dir, &name)?;
    Ok(infos.into_iter().find(|i| i.arch == arch).map(|i| i.uuid))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
UUID: E30C1BE5-DEB6-373C-98B4-52D827B7FF0D (armv7) MyApp.app.dSYM/Contents/Resources/DWARF/MyApp
UUID: 14C8D09E-6B86-3F97-A532-9EC17B8D0AA4 (arm64) MyApp.app.dSYM/Contents/Resources/DWARF/MyApp
";

    #[test]
    fn test_parse_two_slices_in_order() {
        let infos = parse_dwarfdump_output(SAMPLE);
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].uuid, "E30C1BE5-DEB6-373C-98B4-52D827B7FF0D");
        assert_eq!(infos[0].arch, "armv7");
        assert_eq!(infos[1].uuid, "14C8D09E-6B86-3F97-A532-9EC17B8D0AA4");
        assert_eq!(infos[1].arch, "arm64");
        assert_eq!(
            infos[1].name,
            "MyApp.app.dSYM/Contents/Resources/DWARF/MyApp"
        );
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let output = "\
error: no architectures found
UUID: AAAA-BBBB (arm64) App
UUID: truncated-line
some unrelated diagnostic
";
        let infos = parse_dwarfdump_output(output);
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].uuid, "AAAA-BBBB");
        assert_eq!(infos[0].arch, "arm64");
        assert_eq!(infos[0].name, "App");
    }

    #[test]
    fn test_empty_output_yields_no_triples() {
        assert!(parse_dwarfdump_output("").is_empty());
        assert!(parse_dwarfdump_output("\n\n").is_empty());
    }

    #[test]
    fn test_name_with_spaces_is_rejected_whole() {
        // A name containing spaces produces more than four tokens; the
        // line is dropped rather than partially populated.
        let output = "UUID: AAAA (arm64) My App";
        assert!(parse_dwarfdump_output(output).is_empty());
    }
}
