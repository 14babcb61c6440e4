//! Batch orchestrator
//!
//! Drives one upload run end to end: discover artifacts, resolve their
//! metadata, upload each in discovery order, and finalize. Per-artifact
//! failures are downgraded to warnings unless the strict policy is in
//! force; setup failures (missing tools, unresolvable conventions,
//! missing required fields) abort before any upload starts.
//!
//! Scratch directories created during discovery are owned here and
//! released exactly once at finalize, regardless of how the run ended.

use std::path::{Path, PathBuf};

use crate::console;
use crate::inspect::{self, InspectError};
use crate::locate::dart::{self, DartPlatform};
use crate::locate::{dsym, ndk, ArtifactKind, ArtifactRecord, LocateError, ScratchDirs};
use crate::meta::{self, options, AppFields, MetadataError};
use crate::net::{
    self, UploadError, UploadReceipt, UploadRequest, Uploader, DART_SYMBOL_PATH, DSYM_PATH,
    NDK_SYMBOL_PATH,
};

/// Failure policy for a batch run.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchPolicy {
    /// Abort the whole run on the first per-artifact failure. Without
    /// this, failures are logged and the remaining artifacts still
    /// upload.
    pub abort_on_first_fatal: bool,
}

/// Outcome of one artifact within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Accepted by the remote store.
    Uploaded,

    /// Deliberately not sent (already present remotely, or carries no
    /// usable identifier).
    Skipped(String),

    /// Failed and the run continued under the lenient policy.
    Failed(String),
}

/// One line of the end-of-run accounting.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub label: String,
    pub outcome: UploadOutcome,
}

/// End-of-run accounting for a batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn uploaded(&self) -> usize {
        self.count(|o| matches!(o, UploadOutcome::Uploaded))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, UploadOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, UploadOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&UploadOutcome) -> bool) -> usize {
        self.items.iter().filter(|item| pred(&item.outcome)).count()
    }

    fn record(&mut self, label: &str, outcome: UploadOutcome) {
        self.items.push(BatchItem {
            label: label.to_string(),
            outcome,
        });
    }
}

/// Batch-aborting errors. Anything here means the run stopped before
/// completing the artifact list.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error(transparent)]
    Inspect(#[from] InspectError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("failed to upload {label}: {detail}")]
    Aborted { label: String, detail: String },
}

/// Inputs for a native-library (NDK) run.
#[derive(Debug, Clone, Default)]
pub struct NdkOptions {
    /// Project directory or a single `.so` file.
    pub path: PathBuf,
    pub variant: Option<String>,
    pub android_ndk_root: Option<PathBuf>,
    /// Explicit identity fields; gaps are filled from the manifest.
    pub app: AppFields,
    /// Merged manifest override; derived from the layout when absent.
    pub manifest_path: Option<PathBuf>,
    pub project_root: Option<String>,
    pub overwrite: bool,
}

/// Inputs for a dSYM run.
#[derive(Debug, Clone, Default)]
pub struct DsymOptions {
    /// Directory, archive, or a single bundle.
    pub path: PathBuf,
    pub api_key: Option<String>,
    /// Info.plist consulted for the api key when none is given.
    pub plist: Option<PathBuf>,
    pub project_root: Option<String>,
    pub overwrite: bool,
}

/// Inputs for a Dart symbol-file run.
#[derive(Debug, Clone, Default)]
pub struct DartOptions {
    /// Directory or a single `.symbols` file.
    pub path: PathBuf,
    pub api_key: Option<String>,
    /// Companion iOS app binary; derived from the symbols path when
    /// absent.
    pub ios_app_path: Option<PathBuf>,
    pub app_version: Option<String>,
    pub app_version_code: Option<String>,
    pub app_bundle_version: Option<String>,
    pub overwrite: bool,
}

/// Process Android native libraries: objcopy transform, manifest-backed
/// metadata, one upload per library.
pub fn process_android_ndk(
    opts: &NdkOptions,
    uploader: &dyn Uploader,
    endpoint_root: &str,
    policy: BatchPolicy,
) -> Result<BatchReport, BatchError> {
    let discovery = ndk::discover(&opts.path, opts.variant.as_deref())?;
    if discovery.files.is_empty() {
        // A valid layout with nothing in it is a no-op, not a failure
        console::info("No native libraries found to process");
        return Ok(BatchReport::default());
    }

    let ndk_root = inspect::resolve_ndk_root(opts.android_ndk_root.as_deref())?;
    let objcopy = inspect::ndk_objcopy_path(&ndk_root)?;

    let manifest_path = opts.manifest_path.clone().or(discovery.manifest_path);
    let app = resolve_app_fields(&opts.app, manifest_path.as_deref());
    let project_root = opts.project_root.clone().or_else(|| {
        discovery
            .project_root
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    });

    let endpoint = format!("{}{}", endpoint_root, NDK_SYMBOL_PATH);
    let mut report = BatchReport::default();

    for file in &discovery.files {
        let name = file_label(file);
        console::info(&format!("Uploading debug information for {}", name));

        let symbol_file = match inspect::extract_debug_info(&objcopy, file) {
            Ok(path) => path,
            Err(e) => {
                settle_failure(&mut report, policy, &name, &e.to_string())?;
                continue;
            }
        };

        let record = ArtifactRecord {
            source: symbol_file,
            kind: ArtifactKind::NativeLibrary,
            build_id: name.clone(),
            arch: None,
            name: Some(name.clone()),
        };

        let fields = options::android_ndk_fields(
            &app,
            project_root.as_deref(),
            &record.build_id,
            opts.overwrite,
        )?;

        let request = UploadRequest {
            endpoint: endpoint.clone(),
            fields,
            file_field: "soFile".to_string(),
            file_path: record.source.clone(),
        };

        let result = uploader.upload(&request);
        settle_upload(&mut report, policy, &record.label(), result)?;
    }

    Ok(report)
}

/// Process dSYM bundles: dwarfdump identification (extracting archives
/// into scratch space first), one upload per architecture slice.
pub fn process_dsym(
    opts: &DsymOptions,
    uploader: &dyn Uploader,
    endpoint_root: &str,
    policy: BatchPolicy,
) -> Result<BatchReport, BatchError> {
    with_scratch(|scratch| run_dsym(opts, uploader, endpoint_root, policy, scratch))
}

/// Run a batch stage that may create scratch directories, releasing
/// them exactly once after it returns, whatever the outcome.
fn with_scratch<T>(
    run: impl FnOnce(&mut ScratchDirs) -> Result<T, BatchError>,
) -> Result<T, BatchError> {
    let mut scratch = ScratchDirs::new();
    let result = run(&mut scratch);
    scratch.release();
    result
}

fn run_dsym(
    opts: &DsymOptions,
    uploader: &dyn Uploader,
    endpoint_root: &str,
    policy: BatchPolicy,
    scratch: &mut ScratchDirs,
) -> Result<BatchReport, BatchError> {
    let records = dsym::discover(&opts.path, scratch)?;
    if records.is_empty() {
        return Err(LocateError::NothingFound {
            kind: "dSYM",
            path: opts.path.clone(),
        }
        .into());
    }

    let api_key = resolve_dsym_api_key(opts)?;
    let fields = options::dsym_fields(
        api_key.as_deref(),
        opts.project_root.as_deref(),
        opts.overwrite,
    )?;

    let endpoint = format!("{}{}", endpoint_root, DSYM_PATH);
    let mut report = BatchReport::default();

    for record in &records {
        let label = match &record.arch {
            Some(arch) => format!("{} ({})", record.label(), arch),
            None => record.label(),
        };
        console::info(&format!("Uploading debug information for {}", label));

        let request = UploadRequest {
            endpoint: endpoint.clone(),
            fields: fields.clone(),
            file_field: "dsym".to_string(),
            file_path: record.source.clone(),
        };

        let result = net::upload_with_dsym_fallback(uploader, &request, endpoint_root);
        settle_upload(&mut report, policy, &label, result)?;
    }

    Ok(report)
}

/// Explicit api key, with an Info.plist fallback mirroring the manifest
/// fallback on the Android path.
fn resolve_dsym_api_key(opts: &DsymOptions) -> Result<Option<String>, BatchError> {
    if opts.api_key.is_some() {
        return Ok(opts.api_key.clone());
    }
    let Some(plist) = &opts.plist else {
        return Ok(None);
    };

    let key = meta::parse_plist_api_key(plist)?;
    if key.is_some() {
        console::info(&format!("Using api key from {}", plist.display()));
    }
    Ok(key)
}

/// Process Dart symbol files: build id from the ELF note (Android) or
/// the companion app binary (iOS), one upload per file.
pub fn process_dart(
    opts: &DartOptions,
    uploader: &dyn Uploader,
    endpoint_root: &str,
    policy: BatchPolicy,
) -> Result<BatchReport, BatchError> {
    let files = dart::discover_symbol_files(&opts.path)?;

    let endpoint = format!("{}{}", endpoint_root, DART_SYMBOL_PATH);
    let mut report = BatchReport::default();

    for file in &files {
        let label = file_label(file);

        let Some((platform, arch)) = dart::platform_and_arch(file) else {
            console::info(&format!(
                "Skipping file without a recognizable platform segment: {}",
                label
            ));
            report.record(&label, UploadOutcome::Skipped("unknown platform".to_string()));
            continue;
        };

        let build_id = match dart_build_id(file, platform, &arch, opts.ios_app_path.as_deref()) {
            Ok(Some(id)) => id,
            Ok(None) => {
                console::info(&format!("Skipping file without a build id: {}", label));
                report.record(&label, UploadOutcome::Skipped("no build id".to_string()));
                continue;
            }
            Err(e) => {
                settle_failure(&mut report, policy, &label, &e.to_string())?;
                continue;
            }
        };

        let record = ArtifactRecord {
            source: file.clone(),
            kind: ArtifactKind::SymbolFile,
            build_id,
            arch: Some(arch.clone()),
            name: Some(label.clone()),
        };

        console::info(&format!("Uploading debug information for {}", label));

        let extra_version = match platform {
            DartPlatform::Android => opts.app_version_code.as_deref(),
            DartPlatform::Ios => opts.app_bundle_version.as_deref(),
        };
        let fields = options::dart_fields(
            opts.api_key.as_deref(),
            &record.build_id,
            platform,
            opts.app_version.as_deref(),
            extra_version,
            opts.overwrite,
        )?;

        let request = UploadRequest {
            endpoint: endpoint.clone(),
            fields,
            file_field: "symbolFile".to_string(),
            file_path: record.source.clone(),
        };

        let result = uploader.upload(&request);
        settle_upload(&mut report, policy, &record.label(), result)?;
    }

    Ok(report)
}

/// Resolve the build identifier for one Dart symbol file.
fn dart_build_id(
    file: &Path,
    platform: DartPlatform,
    arch: &str,
    ios_app_path: Option<&Path>,
) -> Result<Option<String>, BatchError> {
    match platform {
        DartPlatform::Android => Ok(inspect::read_build_id(file)?),
        DartPlatform::Ios => {
            let app = match ios_app_path {
                Some(path) => path.to_path_buf(),
                None => dart::default_ios_app_path(file).ok_or_else(|| BatchError::Aborted {
                    label: file_label(file),
                    detail: "unable to locate the companion app binary, please specify using `--ios-app-path`"
                        .to_string(),
                })?,
            };
            Ok(inspect::dwarf::uuid_for_arch(&app, arch)?)
        }
    }
}

/// Fill unresolved identity fields from the merged manifest, when one
/// is present. A missing or unreadable manifest is not an error here;
/// the field builders report whatever is still missing.
fn resolve_app_fields(explicit: &AppFields, manifest_path: Option<&Path>) -> AppFields {
    let mut app = explicit.clone();
    if !app.needs_manifest() {
        return app;
    }

    let Some(path) = manifest_path.filter(|p| p.is_file()) else {
        return app;
    };

    match meta::parse_manifest(path) {
        Ok(data) => app.absorb_manifest(&data),
        Err(e) => console::warn(&e.to_string()),
    }
    app
}

/// Record the server's answer for one artifact, applying the failure
/// policy to errors.
fn settle_upload(
    report: &mut BatchReport,
    policy: BatchPolicy,
    label: &str,
    result: Result<UploadReceipt, UploadError>,
) -> Result<(), BatchError> {
    match result {
        Ok(UploadReceipt::Accepted) => {
            console::success(&format!("Uploaded {}", label));
            report.record(label, UploadOutcome::Uploaded);
            Ok(())
        }
        Ok(UploadReceipt::Duplicate) => {
            console::info(&format!("{} is already uploaded, skipping", label));
            report.record(label, UploadOutcome::Skipped("duplicate".to_string()));
            Ok(())
        }
        Err(e) => settle_failure(report, policy, label, &e.to_string()),
    }
}

/// Apply the failure policy to one per-artifact failure: the strict
/// policy aborts the run, the lenient policy logs and records it.
fn settle_failure(
    report: &mut BatchReport,
    policy: BatchPolicy,
    label: &str,
    detail: &str,
) -> Result<(), BatchError> {
    if policy.abort_on_first_fatal {
        return Err(BatchError::Aborted {
            label: label.to_string(),
            detail: detail.to_string(),
        });
    }

    console::warn(&format!("failed to upload {}: {}", label, detail));
    report.record(label, UploadOutcome::Failed(detail.to_string()));
    Ok(())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
