//! Upload client
//!
//! One multipart POST per artifact: a single binary file part plus one
//! text part per metadata entry. The [`Uploader`] trait is the seam
//! between the orchestrator and the wire so batches can be exercised
//! against an in-process stub; [`client::HttpUploader`] is the real
//! implementation.

pub mod client;

pub use client::HttpUploader;

use std::path::PathBuf;

use crate::meta::UploadMetadata;

/// Endpoint sub-path for native-library symbols.
pub const NDK_SYMBOL_PATH: &str = "/ndk-symbol";

/// Endpoint sub-path for dSYM bundles.
pub const DSYM_PATH: &str = "/dsym";

/// Endpoint sub-path for Dart symbol files.
pub const DART_SYMBOL_PATH: &str = "/dart-symbol";

/// Build the upload endpoint root from a base URL and optional port.
/// A zero port leaves the URL untouched.
pub fn endpoint_url(base: &str, port: u16) -> String {
    if port == 0 {
        base.to_string()
    } else {
        format!("{}:{}", base, port)
    }
}

/// One upload request: where to send it and what to send.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Full endpoint URL including any family sub-path.
    pub endpoint: String,

    /// Text parts.
    pub fields: UploadMetadata,

    /// Form field name for the file part (family-specific).
    pub file_field: String,

    /// File to attach.
    pub file_path: PathBuf,
}

/// Server acknowledgement of a single upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadReceipt {
    /// The artifact was accepted.
    Accepted,

    /// The remote store already holds this build identifier. Not an
    /// error; the artifact is reported as skipped.
    Duplicate,
}

/// Upload client errors
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The request could not be constructed (unreadable file, bad URL).
    #[error("error building upload request: {0}")]
    Request(String),

    /// Transport-level failure (connection error or timeout). Eligible
    /// for retry up to the configured budget.
    #[error("error sending upload request: {0}")]
    Transport(String),

    /// A well-formed error response. Definitive; never retried.
    #[error("{status} : {body}")]
    Server { status: u16, body: String },
}

/// Seam between the batch orchestrator and the network.
pub trait Uploader {
    fn upload(&self, request: &UploadRequest) -> Result<UploadReceipt, UploadError>;
}

/// Marker the remote store includes in a 409 body when the build
/// identifier is already present.
const DUPLICATE_MARKER: &str = "duplicate";

/// Map a response status and body onto an upload outcome.
///
/// 202 is the expected success for binary uploads. A 409 whose body
/// mentions a duplicate build identifier is a skip, not a failure.
/// Anything else is surfaced verbatim for diagnostics.
pub fn classify_response(status: u16, body: &str) -> Result<UploadReceipt, UploadError> {
    match status {
        202 => Ok(UploadReceipt::Accepted),
        409 if body.contains(DUPLICATE_MARKER) => Ok(UploadReceipt::Duplicate),
        _ => Err(UploadError::Server {
            status,
            body: body.to_string(),
        }),
    }
}

/// Upload with the legacy dSYM fallback: a 404 from the family
/// sub-endpoint triggers exactly one retry against the family root.
/// Deliberately scoped to this one family.
pub fn upload_with_dsym_fallback(
    uploader: &dyn Uploader,
    request: &UploadRequest,
    fallback_endpoint: &str,
) -> Result<UploadReceipt, UploadError> {
    match uploader.upload(request) {
        Err(UploadError::Server { status: 404, .. }) => {
            let mut retry = request.clone();
            retry.endpoint = fallback_endpoint.to_string();
            uploader.upload(&retry)
        }
        other => other,
    }
}
