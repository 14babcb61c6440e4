//! Traceline CLI - debug-symbol discovery and upload
//!
//! This crate implements the Traceline command-line tool: it discovers
//! mobile debug-symbol artifacts in build output (Android NDK shared
//! objects, dSYM bundles, Dart symbol files), resolves the metadata the
//! remote store needs, and uploads each artifact with resilient error
//! handling.

pub mod batch;
pub mod build;
pub mod console;
pub mod inspect;
pub mod locate;
pub mod meta;
pub mod net;
pub mod tools;

pub use batch::{BatchError, BatchPolicy, BatchReport, UploadOutcome};
pub use locate::{ArtifactKind, ArtifactRecord, ScratchDirs};
pub use meta::UploadMetadata;
pub use net::{HttpUploader, UploadError, UploadReceipt, UploadRequest, Uploader};
