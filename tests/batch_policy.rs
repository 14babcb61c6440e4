//! Batch failure-policy integration tests
//!
//! Runs Dart symbol-file batches end to end against a stub uploader,
//! using small ELF fixtures that carry real GNU build-id notes. Covers
//! the lenient/strict failure policies, duplicate handling, and the
//! metadata checks that abort a run before anything is sent.

use std::cell::RefCell;
use std::fs;
use std::path::Path;

use object::write::Object as ElfBuilder;
use object::{Architecture, BinaryFormat, Endianness, SectionKind};

use traceline_cli::batch::{self, BatchError, BatchPolicy, DartOptions, UploadOutcome};
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

fn server_error(status: u16) -> Result<UploadReceipt, UploadError> {
    Err(UploadError::Server {
        status,
        body: "boom".to_string(),
    })
}

/// Write an ELF file carrying a GNU build-id note with the given bytes.
fn write_elf_with_build_id(path: &Path, build_id: &[u8]) {
    let mut note = Vec::new();
    note.extend_from_slice(&4u32.to_le_bytes()); // namesz ("GNU\0")
    note.extend_from_slice(&(build_id.len() as u32).to_le_bytes());
    note.extend_from_slice(&3u32.to_le_bytes()); // NT_GNU_BUILD_ID
    note.extend_from_slice(b"GNU\0");
    note.extend_from_slice(build_id);

    let mut obj = ElfBuilder::new(BinaryFormat::Elf, Architecture::Aarch64, Endianness::Little);
    let section = obj.add_section(vec![], b".note.gnu.build-id".to_vec(), SectionKind::Note);
    obj.append_section_data(section, &note, 4);

    fs::write(path, obj.write().unwrap()).unwrap();
}

fn dart_options(dir: &Path) -> DartOptions {
    DartOptions {
        path: dir.to_path_buf(),
        api_key: Some("key".to_string()),
        app_version: Some("1.2.3".to_string()),
        ..Default::default()
    }
}

#[test]
fn test_dart_batch_uploads_each_symbol_file() {
    let dir = tempfile::tempdir().unwrap();
    write_elf_with_build_id(&dir.path().join("app.android-arm64.symbols"), &[0xAA; 20]);
    write_elf_with_build_id(&dir.path().join("app.android-x64.symbols"), &[0xBB; 20]);

    let uploader = StubUploader::new(vec![
        Ok(UploadReceipt::Accepted),
        Ok(UploadReceipt::Accepted),
    ]);

    let report = batch::process_dart(
        &dart_options(dir.path()),
        &uploader,
        "https://upload.example.com",
        BatchPolicy::default(),
    )
    .unwrap();

    assert_eq!(report.uploaded(), 2);

    let requests = uploader.requests.borrow();
    assert_eq!(requests.len(), 2);
    for request in requests.iter() {
        assert_eq!(request.endpoint, "https://upload.example.com/dart-symbol");
        assert_eq!(request.file_field, "symbolFile");
        assert_eq!(request.fields.get("platform"), Some("android"));
        assert_eq!(request.fields.get("apiKey"), Some("key"));
        assert_eq!(request.fields.get("appVersion"), Some("1.2.3"));
    }

    // Build ids are read from the ELF notes, hex-encoded, in path order
    assert_eq!(requests[0].fields.get("buildId"), Some("aa".repeat(20).as_str()));
    assert_eq!(requests[1].fields.get("buildId"), Some("bb".repeat(20).as_str()));
}

#[test]
fn test_duplicate_is_skipped_not_failed() {
    let dir = tempfile::tempdir().unwrap();
    write_elf_with_build_id(&dir.path().join("app.android-arm64.symbols"), &[0xAA; 20]);
    write_elf_with_build_id(&dir.path().join("app.android-x64.symbols"), &[0xBB; 20]);

    let uploader = StubUploader::new(vec![
        Ok(UploadReceipt::Duplicate),
        Ok(UploadReceipt::Accepted),
    ]);

    let report = batch::process_dart(
        &dart_options(dir.path()),
        &uploader,
        "https://upload.example.com",
        BatchPolicy::default(),
    )
    .unwrap();

    assert_eq!(report.uploaded(), 1);
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.failed(), 0);
}

#[test]
fn test_lenient_policy_continues_past_server_error() {
    let dir = tempfile::tempdir().unwrap();
    write_elf_with_build_id(&dir.path().join("app.android-arm64.symbols"), &[0xAA; 20]);
    write_elf_with_build_id(&dir.path().join("app.android-x64.symbols"), &[0xBB; 20]);

    let uploader = StubUploader::new(vec![server_error(500), Ok(UploadReceipt::Accepted)]);

    let report = batch::process_dart(
        &dart_options(dir.path()),
        &uploader,
        "https://upload.example.com",
        BatchPolicy {
            abort_on_first_fatal: false,
        },
    )
    .unwrap();

    assert_eq!(report.failed(), 1);
    assert_eq!(report.uploaded(), 1);
    assert_eq!(uploader.requests.borrow().len(), 2);
}

#[test]
fn test_strict_policy_aborts_on_first_failure() {
    let dir = tempfile::tempdir().unwrap();
    write_elf_with_build_id(&dir.path().join("app.android-arm64.symbols"), &[0xAA; 20]);
    write_elf_with_build_id(&dir.path().join("app.android-x64.symbols"), &[0xBB; 20]);

    let uploader = StubUploader::new(vec![server_error(500)]);

    let result = batch::process_dart(
        &dart_options(dir.path()),
        &uploader,
        "https://upload.example.com",
        BatchPolicy {
            abort_on_first_fatal: true,
        },
    );

    assert!(matches!(result, Err(BatchError::Aborted { .. })));
    // The second file was never attempted
    assert_eq!(uploader.requests.borrow().len(), 1);
}

#[test]
fn test_single_file_failure_is_downgraded_when_lenient() {
    let dir = tempfile::tempdir().unwrap();
    write_elf_with_build_id(&dir.path().join("app.android-arm64.symbols"), &[0xAA; 20]);

    let uploader = StubUploader::new(vec![server_error(500)]);

    // The lenient policy applies whether one artifact or many were found
    let report = batch::process_dart(
        &dart_options(dir.path()),
        &uploader,
        "https://upload.example.com",
        BatchPolicy {
            abort_on_first_fatal: false,
        },
    )
    .unwrap();

    assert_eq!(report.failed(), 1);
    assert_eq!(report.uploaded(), 0);
}

#[test]
fn test_single_file_failure_aborts_when_strict() {
    let dir = tempfile::tempdir().unwrap();
    write_elf_with_build_id(&dir.path().join("app.android-arm64.symbols"), &[0xAA; 20]);

    let uploader = StubUploader::new(vec![server_error(500)]);

    let result = batch::process_dart(
        &dart_options(dir.path()),
        &uploader,
        "https://upload.example.com",
        BatchPolicy {
            abort_on_first_fatal: true,
        },
    );

    assert!(matches!(result, Err(BatchError::Aborted { .. })));
}

#[test]
fn test_unparseable_symbol_file_counts_against_policy() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("app.android-arm64.symbols"), b"not an ELF").unwrap();
    write_elf_with_build_id(&dir.path().join("app.android-x64.symbols"), &[0xBB; 20]);

    let uploader = StubUploader::new(vec![Ok(UploadReceipt::Accepted)]);

    let report = batch::process_dart(
        &dart_options(dir.path()),
        &uploader,
        "https://upload.example.com",
        BatchPolicy {
            abort_on_first_fatal: false,
        },
    )
    .unwrap();

    assert_eq!(report.failed(), 1);
    assert_eq!(report.uploaded(), 1);
    // Only the readable file reached the uploader
    assert_eq!(uploader.requests.borrow().len(), 1);
}

#[test]
fn test_file_without_build_id_is_skipped_with_note() {
    let dir = tempfile::tempdir().unwrap();
    // A valid ELF with no build-id note at all
    let mut obj = ElfBuilder::new(BinaryFormat::Elf, Architecture::Aarch64, Endianness::Little);
    let section = obj.add_section(vec![], b".text".to_vec(), SectionKind::Text);
    obj.append_section_data(section, &[0; 4], 4);
    fs::write(dir.path().join("app.android-arm64.symbols"), obj.write().unwrap()).unwrap();

    write_elf_with_build_id(&dir.path().join("app.android-x64.symbols"), &[0xBB; 20]);

    let uploader = StubUploader::new(vec![Ok(UploadReceipt::Accepted)]);

    let report = batch::process_dart(
        &dart_options(dir.path()),
        &uploader,
        "https://upload.example.com",
        BatchPolicy::default(),
    )
    .unwrap();

    assert_eq!(report.skipped(), 1);
    assert_eq!(report.uploaded(), 1);
    assert!(report
        .items
        .iter()
        .any(|item| matches!(item.outcome, UploadOutcome::Skipped(ref r) if r == "no build id")));
}

#[test]
fn test_missing_api_key_aborts_before_any_upload() {
    let dir = tempfile::tempdir().unwrap();
    write_elf_with_build_id(&dir.path().join("app.android-arm64.symbols"), &[0xAA; 20]);

    let uploader = StubUploader::new(vec![]);
    let mut opts = dart_options(dir.path());
    opts.api_key = None;

    let result = batch::process_dart(
        &opts,
        &uploader,
        "https://upload.example.com",
        BatchPolicy::default(),
    );

    assert!(matches!(result, Err(BatchError::Metadata(_))));
    assert!(uploader.requests.borrow().is_empty());
}

#[test]
fn test_empty_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let uploader = StubUploader::new(vec![]);

    let result = batch::process_dart(
        &dart_options(dir.path()),
        &uploader,
        "https://upload.example.com",
        BatchPolicy::default(),
    );

    assert!(matches!(result, Err(BatchError::Locate(_))));
}
