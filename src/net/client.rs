//! Blocking HTTP implementation of the upload seam
//!
//! One client instance serves a whole batch. The request timeout covers
//! the full round trip; the retry budget re-attempts transport-level
//! failures only, with a fixed one-second delay between attempts. A
//! well-formed error response is a definitive server decision and is
//! never retried.

use std::thread;
use std::time::Duration;

use reqwest::blocking::multipart::Form;
use reqwest::blocking::Client;

use super::{classify_response, UploadError, UploadReceipt, UploadRequest, Uploader};

/// Delay between retry attempts.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// One attempt's failure, split by whether the retry budget applies.
enum SendFailure {
    /// Transport-level failure (connect, timeout); eligible for retry.
    Retryable(String),

    /// Definitive failure; retrying cannot change the outcome.
    Final(UploadError),
}

/// Multipart upload client.
pub struct HttpUploader {
    client: Client,
    retries: u32,
    dry_run: bool,
}

impl HttpUploader {
    /// Create a client with a whole-round-trip timeout and a retry
    /// budget. `dry_run` short-circuits every upload to success without
    /// any network I/O.
    pub fn new(timeout: Duration, retries: u32, dry_run: bool) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UploadError::Request(e.to_string()))?;

        Ok(Self {
            client,
            retries,
            dry_run,
        })
    }

    fn build_form(&self, request: &UploadRequest) -> Result<Form, SendFailure> {
        let mut form = Form::new();
        for (field, value) in request.fields.iter() {
            form = form.text(field.to_string(), value.to_string());
        }
        form.file(request.file_field.clone(), &request.file_path)
            .map_err(|e| {
                SendFailure::Final(UploadError::Request(format!(
                    "could not attach {}: {}",
                    request.file_path.display(),
                    e
                )))
            })
    }

    fn send_once(&self, request: &UploadRequest) -> Result<UploadReceipt, SendFailure> {
        // The form holds an open file handle, so it is rebuilt per
        // attempt rather than cloned.
        let form = self.build_form(request)?;

        match self.client.post(&request.endpoint).multipart(form).send() {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().unwrap_or_default();
                classify_response(status, &body).map_err(SendFailure::Final)
            }
            Err(e) if is_transport_failure(&e) => Err(SendFailure::Retryable(e.to_string())),
            Err(e) => Err(SendFailure::Final(UploadError::Transport(e.to_string()))),
        }
    }
}

impl Uploader for HttpUploader {
    fn upload(&self, request: &UploadRequest) -> Result<UploadReceipt, UploadError> {
        if self.dry_run {
            return Ok(UploadReceipt::Accepted);
        }

        with_retries(self.retries, RETRY_DELAY, || self.send_once(request))
    }
}

/// Run `attempt` up to `retries + 1` times, sleeping `delay` between
/// attempts. Only [`SendFailure::Retryable`] consumes the budget; a
/// final failure returns immediately, and an exhausted budget surfaces
/// the last transport error.
fn with_retries<T>(
    retries: u32,
    delay: Duration,
    mut attempt: impl FnMut() -> Result<T, SendFailure>,
) -> Result<T, UploadError> {
    let mut remaining = retries;
    loop {
        match attempt() {
            Ok(value) => return Ok(value),
            Err(SendFailure::Final(e)) => return Err(e),
            Err(SendFailure::Retryable(detail)) => {
                if remaining == 0 {
                    return Err(UploadError::Transport(detail));
                }
                remaining -= 1;
                thread::sleep(delay);
            }
        }
    }
}

/// Connection errors and timeouts are retryable; anything else (request
/// construction, body decoding) is not.
fn is_transport_failure(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout()
}
