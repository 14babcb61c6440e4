//! AndroidManifest.xml attribute extraction
//!
//! Only four values are needed from the merged manifest: the package
//! name, the two version attributes, and the api key carried in a
//! `<meta-data>` element. Rather than a full XML parse, targeted
//! attribute patterns are matched, which also tolerates the slightly
//! irregular output some merge steps produce.

use std::fs;
use std::path::Path;

use regex_lite::Regex;

use super::MetadataError;

/// `<meta-data>` name under which the api key is declared.
pub const API_KEY_META_NAME: &str = "io.traceline.android.API_KEY";

/// Values parsed from a merged manifest. Absent attributes stay `None`;
/// the resolver decides which are required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestData {
    pub application_id: Option<String>,
    pub version_code: Option<String>,
    pub version_name: Option<String>,
    pub api_key: Option<String>,
}

/// Parse the manifest at `path`.
pub fn parse_manifest(path: &Path) -> Result<ManifestData, MetadataError> {
    let content = fs::read_to_string(path).map_err(|source| MetadataError::ManifestRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_manifest_content(&content))
}

fn parse_manifest_content(content: &str) -> ManifestData {
    ManifestData {
        application_id: attribute(content, "package"),
        version_code: attribute(content, "android:versionCode"),
        version_name: attribute(content, "android:versionName"),
        api_key: meta_data_value(content, API_KEY_META_NAME),
    }
}

fn attribute(content: &str, name: &str) -> Option<String> {
    let pattern = format!(r#"{}="([^"]*)""#, regex_escape(name));
    let re = Regex::new(&pattern).ok()?;
    re.captures(content)
        .map(|captures| captures[1].to_string())
        .filter(|value| !value.is_empty())
}

/// Extract `android:value` from the `<meta-data>` element with the
/// given `android:name`, tolerating either attribute order.
fn meta_data_value(content: &str, name: &str) -> Option<String> {
    let escaped = regex_escape(name);

    let name_first = format!(
        r#"<meta-data[^>]*android:name="{}"[^>]*android:value="([^"]*)""#,
        escaped
    );
    let value_first = format!(
        r#"<meta-data[^>]*android:value="([^"]*)"[^>]*android:name="{}""#,
        escaped
    );

    for pattern in [name_first, value_first] {
        if let Some(captures) = Regex::new(&pattern).ok()?.captures(content) {
            let value = captures[1].to_string();
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

fn regex_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            escaped.push(c);
        } else {
            escaped.push('\\');
            escaped.push(c);
        }
    }
    escaped
}
