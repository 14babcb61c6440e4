//! Android NDK pipeline integration tests
//!
//! Exercises the full native-library path against an on-disk Gradle
//! layout fixture: discovery, manifest-backed metadata resolution, the
//! objcopy transform (via a stand-in script), and upload dispatch
//! through a stub uploader.

use std::cell::RefCell;
use std::fs;

use traceline_cli::batch::{self, BatchPolicy, NdkOptions};
use traceline_cli::locate::ndk;
use traceline_cli::meta::{self, AppFields};
use traceline_cli::net::{UploadError, UploadReceipt, UploadRequest, Uploader};

struct StubUploader {
    responses: RefCell<Vec<Result<UploadReceipt, UploadError>>>,
    requests: RefCell<Vec<UploadRequest>>,
}

impl StubUploader {
    fn new(responses: Vec<Result<UploadReceipt, UploadError>>) -> Self {
        Self {
            responses: RefCell::new(responses),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl Uploader for StubUploader {
    fn upload(&self, request: &UploadRequest) -> Result<UploadReceipt, UploadError> {
        self.requests.borrow_mut().push(request.clone());
        self.responses.borrow_mut().remove(0)
    }
}

const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="com.example.photosnap"
    android:versionCode="42"
    android:versionName="3.1.4">
    <application>
        <meta-data
            android:name="io.traceline.android.API_KEY"
            android:value="abcdef0123456789" />
    </application>
</manifest>
"#;

/// Lay out a Gradle project with merged native libs and a merged
/// manifest for one release variant.
fn gradle_project(libs: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let intermediates = dir.path().join("app/build/intermediates");

    let abi = intermediates.join("merged_native_libs/release/out/lib/arm64-v8a");
    fs::create_dir_all(&abi).unwrap();
    for lib in libs {
        fs::write(abi.join(lib), b"\x7fELF fake").unwrap();
    }

    let manifest_dir = intermediates.join("merged_manifests/release");
    fs::create_dir_all(&manifest_dir).unwrap();
    fs::write(manifest_dir.join("AndroidManifest.xml"), MANIFEST).unwrap();

    dir
}

/// Fake NDK whose llvm-objcopy just copies input to output.
#[cfg(unix)]
fn fake_ndk() -> tempfile::TempDir {
    use std::os::unix::fs::PermissionsExt;

    let ndk = tempfile::tempdir().unwrap();
    let bin = ndk.path().join("toolchains/llvm/prebuilt/linux-x86_64/bin");
    fs::create_dir_all(&bin).unwrap();

    let objcopy = bin.join("llvm-objcopy");
    fs::write(&objcopy, "#!/bin/sh\ncp \"$3\" \"$4\"\n").unwrap();
    fs::set_permissions(&objcopy, fs::Permissions::from_mode(0o755)).unwrap();

    ndk
}

#[test]
fn test_discovery_finds_manifest_for_inferred_variant() {
    let project = gradle_project(&["libapp.so"]);

    let discovery = ndk::discover(project.path(), None).unwrap();
    assert_eq!(discovery.variant.as_deref(), Some("release"));
    assert_eq!(discovery.files.len(), 1);

    let manifest = meta::parse_manifest(&discovery.manifest_path.unwrap()).unwrap();
    assert_eq!(manifest.application_id.as_deref(), Some("com.example.photosnap"));
    assert_eq!(manifest.api_key.as_deref(), Some("abcdef0123456789"));
}

#[test]
fn test_file_input_recovers_manifest_through_layout() {
    let project = gradle_project(&["libapp.so"]);
    let so = project
        .path()
        .join("app/build/intermediates/merged_native_libs/release/out/lib/arm64-v8a/libapp.so");

    let discovery = ndk::discover(&so, None).unwrap();
    let manifest_path = discovery.manifest_path.unwrap();
    assert!(manifest_path.is_file());

    let manifest = meta::parse_manifest(&manifest_path).unwrap();
    assert_eq!(manifest.version_code.as_deref(), Some("42"));
}

#[cfg(unix)]
#[test]
fn test_ndk_batch_uploads_transformed_libraries() {
    let project = gradle_project(&["libapp.so", "libother.so"]);
    let ndk = fake_ndk();
    let uploader = StubUploader::new(vec![
        Ok(UploadReceipt::Accepted),
        Ok(UploadReceipt::Accepted),
    ]);

    let opts = NdkOptions {
        path: project.path().to_path_buf(),
        android_ndk_root: Some(ndk.path().to_path_buf()),
        app: AppFields::default(),
        ..Default::default()
    };

    let report = batch::process_android_ndk(
        &opts,
        &uploader,
        "https://upload.example.com",
        BatchPolicy::default(),
    )
    .unwrap();

    assert_eq!(report.uploaded(), 2);

    let requests = uploader.requests.borrow();
    assert_eq!(requests.len(), 2);
    for request in requests.iter() {
        assert_eq!(request.endpoint, "https://upload.example.com/ndk-symbol");
        assert_eq!(request.file_field, "soFile");
        // The transform output, not the original library, is sent
        assert!(request.file_path.to_string_lossy().ends_with(".so.sym"));
        assert!(request.file_path.is_file());

        // Identity fields came from the merged manifest
        assert_eq!(request.fields.get("apiKey"), Some("abcdef0123456789"));
        assert_eq!(request.fields.get("appId"), Some("com.example.photosnap"));
        assert_eq!(request.fields.get("versionCode"), Some("42"));
        assert_eq!(request.fields.get("versionName"), Some("3.1.4"));
        assert!(request.fields.get("overwrite").is_none());
    }

    // Uploads happen in path order with per-file shared object names
    assert_eq!(requests[0].fields.get("sharedObjectName"), Some("libapp.so"));
    assert_eq!(requests[1].fields.get("sharedObjectName"), Some("libother.so"));
}

#[cfg(unix)]
#[test]
fn test_explicit_fields_override_manifest() {
    let project = gradle_project(&["libapp.so"]);
    let ndk = fake_ndk();
    let uploader = StubUploader::new(vec![Ok(UploadReceipt::Accepted)]);

    let opts = NdkOptions {
        path: project.path().to_path_buf(),
        android_ndk_root: Some(ndk.path().to_path_buf()),
        app: AppFields {
            api_key: Some("explicit-key".to_string()),
            version_code: Some("7".to_string()),
            ..Default::default()
        },
        overwrite: true,
        ..Default::default()
    };

    batch::process_android_ndk(
        &opts,
        &uploader,
        "https://upload.example.com",
        BatchPolicy::default(),
    )
    .unwrap();

    let requests = uploader.requests.borrow();
    assert_eq!(requests[0].fields.get("apiKey"), Some("explicit-key"));
    assert_eq!(requests[0].fields.get("versionCode"), Some("7"));
    // Gaps still filled from the manifest
    assert_eq!(requests[0].fields.get("appId"), Some("com.example.photosnap"));
    assert_eq!(requests[0].fields.get("overwrite"), Some("true"));
}

#[test]
fn test_valid_layout_without_libraries_is_a_no_op() {
    // The convention resolves but holds no shared objects; that is an
    // empty successful run, not an error.
    let project = gradle_project(&[]);
    let uploader = StubUploader::new(vec![]);

    let opts = NdkOptions {
        path: project.path().to_path_buf(),
        ..Default::default()
    };

    let report = batch::process_android_ndk(
        &opts,
        &uploader,
        "https://upload.example.com",
        BatchPolicy::default(),
    )
    .unwrap();

    assert!(report.items.is_empty());
    assert!(uploader.requests.borrow().is_empty());
}

#[test]
fn test_missing_convention_fails_before_any_upload() {
    let dir = tempfile::tempdir().unwrap();
    let uploader = StubUploader::new(vec![]);

    let opts = NdkOptions {
        path: dir.path().to_path_buf(),
        ..Default::default()
    };

    let result = batch::process_android_ndk(
        &opts,
        &uploader,
        "https://upload.example.com",
        BatchPolicy::default(),
    );

    assert!(result.is_err());
    assert!(uploader.requests.borrow().is_empty());
}

#[test]
fn test_project_root_defaults_to_discovery_root() {
    let project = gradle_project(&["libapp.so"]);
    let discovery = ndk::discover(project.path(), None).unwrap();
    assert_eq!(discovery.project_root.as_deref(), Some(project.path()));
}
