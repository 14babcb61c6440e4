//! Metadata resolver
//!
//! Fills the required upload fields from explicit input, falling back to
//! values parsed out of the Android manifest. The precedence is strict:
//! a present explicit value is never overwritten by a parsed one, and
//! identity fields (api key, application id, versions) are never
//! defaulted — only structural fields like the project root may fall
//! back to the discovery root.

pub mod manifest;
pub mod options;
pub mod plist;
pub mod repo;

pub use manifest::{parse_manifest, ManifestData};
pub use plist::parse_plist_api_key;

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

/// Metadata resolution errors. Each missing required field gets its own
/// variant so diagnostics can name the flag to pass.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("missing api key, please specify using `--api-key`")]
    MissingApiKey,

    #[error("missing application id, please specify using `--application-id`")]
    MissingApplicationId,

    #[error("missing version code, please specify using `--version-code`")]
    MissingVersionCode,

    #[error("missing version name, please specify using `--version-name`")]
    MissingVersionName,

    #[error("missing app version, please specify using `--app-version`")]
    MissingAppVersion,

    #[error("failed to read manifest {path}: {source}")]
    ManifestRead { path: PathBuf, source: io::Error },

    #[error("failed to read plist {path}: {source}")]
    PlistRead { path: PathBuf, source: io::Error },
}

/// Ordered field-name → value mapping sent as the text parts of an
/// upload request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadMetadata {
    fields: BTreeMap<String, String>,
}

impl UploadMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.fields.insert(field.to_string(), value.into());
    }

    /// Set the overwrite flag. Serialized as `"true"` when set and
    /// omitted entirely otherwise, never `"false"`.
    pub fn set_overwrite(&mut self, overwrite: bool) {
        if overwrite {
            self.set("overwrite", "true");
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Application identity fields shared by the Android upload paths.
///
/// Starts from explicit CLI values; gaps are filled from the manifest
/// via [`AppFields::absorb_manifest`].
#[derive(Debug, Clone, Default)]
pub struct AppFields {
    pub api_key: Option<String>,
    pub application_id: Option<String>,
    pub version_code: Option<String>,
    pub version_name: Option<String>,
}

impl AppFields {
    /// True when at least one field still needs a manifest lookup.
    pub fn needs_manifest(&self) -> bool {
        self.api_key.is_none()
            || self.application_id.is_none()
            || self.version_code.is_none()
            || self.version_name.is_none()
    }

    /// Fill unresolved fields from parsed manifest data. Explicit values
    /// always win; a present field is never overwritten.
    pub fn absorb_manifest(&mut self, data: &ManifestData) {
        if self.api_key.is_none() {
            self.api_key = data.api_key.clone();
        }
        if self.application_id.is_none() {
            self.application_id = data.application_id.clone();
        }
        if self.version_code.is_none() {
            self.version_code = data.version_code.clone();
        }
        if self.version_name.is_none() {
            self.version_name = data.version_name.clone();
        }
    }
}
