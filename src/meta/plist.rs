//! Info.plist api-key extraction
//!
//! The iOS side declares the api key in a `traceline` dictionary inside
//! the app's Info.plist. As with the manifest, a targeted pattern match
//! is enough; nothing else is read from the plist.

use std::fs;
use std::path::Path;

use regex_lite::Regex;

use super::MetadataError;

/// Read the api key from the plist at `path`, when one is declared.
pub fn parse_plist_api_key(path: &Path) -> Result<Option<String>, MetadataError> {
    let content = fs::read_to_string(path).map_err(|source| MetadataError::PlistRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(api_key_from_content(&content))
}

fn api_key_from_content(content: &str) -> Option<String> {
    // Narrow to the traceline dictionary first so an apiKey entry
    // belonging to another framework is not picked up.
    let section = Regex::new(r"(?s)<key>\s*traceline\s*</key>\s*<dict>(.*?)</dict>")
        .ok()?
        .captures(content)?
        .get(1)?
        .as_str()
        .to_string();

    Regex::new(r"<key>\s*apiKey\s*</key>\s*<string>([^<]*)</string>")
        .ok()?
        .captures(&section)
        .map(|captures| captures[1].trim().to_string())
        .filter(|value| !value.is_empty())
}
