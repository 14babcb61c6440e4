//! Build reporting
//!
//! `create-build` announces a release to the build API so uploaded
//! symbols can be associated with it: one JSON POST carrying the app
//! version, builder identity, optional free-form metadata, and
//! best-effort source-control provenance.

use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::console;
use crate::meta::repo::{self, RepoInfo};
use crate::meta::MetadataError;
use crate::net::UploadError;

/// Marker the build API includes in a response body when the report
/// carried no source-control details. Worth a note either way, but only
/// the status code decides success.
const SOURCE_CONTROL_MISSING: &str = "Source control provider is missing";

/// Inputs for one build report.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub api_key: Option<String>,
    pub app_version: Option<String>,
    pub app_version_code: Option<String>,
    pub app_bundle_version: Option<String>,
    pub builder_name: Option<String>,
    pub release_stage: Option<String>,
    /// Free-form `key=value` pairs forwarded under `metadata`.
    pub metadata: Vec<(String, String)>,
    pub provider: Option<String>,
    pub repository: Option<String>,
    pub revision: Option<String>,
}

/// JSON body of a build report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPayload {
    api_key: String,
    app_version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    app_version_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    app_bundle_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    builder_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    release_stage: Option<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "SourceControl::is_empty")]
    source_control: SourceControl,
}

#[derive(Debug, Default, Serialize)]
struct SourceControl {
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    repository: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    revision: Option<String>,
}

impl SourceControl {
    fn is_empty(&self) -> bool {
        self.provider.is_none() && self.repository.is_none() && self.revision.is_none()
    }
}

impl From<RepoInfo> for SourceControl {
    fn from(info: RepoInfo) -> Self {
        Self {
            provider: info.provider,
            repository: info.repository,
            revision: info.revision,
        }
    }
}

/// How the build API acknowledged the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Report stored with full details.
    Sent,

    /// Report stored, but the provenance could not be recorded.
    SentWithoutSourceControl,
}

/// Builder identity fallback: the local username.
pub fn default_builder_name() -> Option<String> {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .ok()
        .filter(|name| !name.is_empty())
}

/// Assemble the report body, resolving provenance from `dir` when no
/// explicit values were given.
pub fn build_payload(opts: &BuildOptions, dir: &Path) -> Result<BuildPayload, MetadataError> {
    let api_key = opts.api_key.clone().ok_or(MetadataError::MissingApiKey)?;
    let app_version = opts
        .app_version
        .clone()
        .ok_or(MetadataError::MissingAppVersion)?;

    let source_control = repo::repo_info(
        dir,
        opts.provider.as_deref(),
        opts.repository.as_deref(),
        opts.revision.as_deref(),
    );

    Ok(BuildPayload {
        api_key,
        app_version,
        app_version_code: opts.app_version_code.clone(),
        app_bundle_version: opts.app_bundle_version.clone(),
        builder_name: opts.builder_name.clone().or_else(default_builder_name),
        release_stage: opts.release_stage.clone(),
        metadata: opts.metadata.iter().cloned().collect(),
        source_control: source_control.into(),
    })
}

/// Map a build API response onto an outcome. Only 200 counts as stored;
/// a missing-provenance note in a 200 body downgrades the outcome, and
/// any other status is an error even when its body carries the note.
pub fn classify_build_response(status: u16, body: &str) -> Result<BuildOutcome, UploadError> {
    if status == 200 {
        if body.contains(SOURCE_CONTROL_MISSING) {
            return Ok(BuildOutcome::SentWithoutSourceControl);
        }
        return Ok(BuildOutcome::Sent);
    }
    Err(UploadError::Server {
        status,
        body: body.to_string(),
    })
}

/// Send one build report to `endpoint`. Dry runs skip the POST
/// entirely.
pub fn send_build_report(
    endpoint: &str,
    payload: &BuildPayload,
    timeout: Duration,
    dry_run: bool,
) -> Result<BuildOutcome, UploadError> {
    if dry_run {
        return Ok(BuildOutcome::Sent);
    }

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| UploadError::Request(e.to_string()))?;

    let response = client
        .post(endpoint)
        .json(payload)
        .send()
        .map_err(|e| UploadError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let body = response.text().unwrap_or_default();

    // The note is informational and logged whenever the server mentions
    // it, including alongside a fatal status.
    if body.contains(SOURCE_CONTROL_MISSING) {
        console::info("The source control provider could not be recorded for this build");
    }

    classify_build_response(status, &body)
}
