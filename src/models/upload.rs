use std::collections::BTreeMap;
use std::fmt;

use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::services::permission::AuthorizedCapture;

/// MIME type of every image part. Captures are normalized to JPEG before upload.
pub const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Form field name carrying the image part.
pub const IMAGE_FIELD: &str = "image";

pub const DEFAULT_FILENAME: &str = "ecg.jpg";

/// A single capture ready to be sent. Built once per capture and consumed by one exchange.
#[derive(Debug, Clone, Validate)]
pub struct UploadRequest {
    #[garde(skip)]
    endpoint: String,

    #[garde(length(min = 1))]
    image: Vec<u8>,

    #[garde(length(min = 1), custom(header_safe_filename))]
    filename: String,

    #[garde(custom(header_safe_field_names))]
    fields: BTreeMap<String, String>,
}

impl UploadRequest {
    pub fn builder(endpoint: impl Into<String>, image: impl Into<Vec<u8>>) -> UploadRequestBuilder {
        UploadRequestBuilder {
            endpoint: endpoint.into(),
            image: image.into(),
            filename: DEFAULT_FILENAME.to_string(),
            fields: BTreeMap::new(),
        }
    }

    /// Build a request from a live camera capture, using the configured
    /// endpoint, filename and extra fields.
    pub fn from_capture(
        _authorized: &AuthorizedCapture,
        jpeg: Vec<u8>,
        config: &ClientConfig,
    ) -> Result<Self, RequestError> {
        let mut builder = Self::builder(&config.endpoint, jpeg).filename(&config.filename);
        for (name, value) in config.extra_fields() {
            builder = builder.field(name, value);
        }
        builder.build()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn image(&self) -> &[u8] {
        &self.image
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_type(&self) -> &'static str {
        IMAGE_CONTENT_TYPE
    }

    /// Extra metadata fields in the order they are encoded.
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}

pub struct UploadRequestBuilder {
    endpoint: String,
    image: Vec<u8>,
    filename: String,
    fields: BTreeMap<String, String>,
}

impl UploadRequestBuilder {
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Add an extra form field. A repeated name replaces the earlier value.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> Result<UploadRequest, RequestError> {
        let request = UploadRequest {
            endpoint: self.endpoint,
            image: self.image,
            filename: self.filename,
            fields: self.fields,
        };
        request.validate()?;
        Ok(request)
    }
}

fn is_header_safe(value: &str) -> bool {
    !value.contains(['"', '\r', '\n'])
}

fn header_safe_filename(value: &String, _: &()) -> garde::Result {
    if is_header_safe(value) {
        Ok(())
    } else {
        Err(garde::Error::new("filename must not contain quotes or line breaks"))
    }
}

fn header_safe_field_names(value: &BTreeMap<String, String>, _: &()) -> garde::Result {
    for name in value.keys() {
        if name.is_empty() {
            return Err(garde::Error::new("field names must not be empty"));
        }
        if name == IMAGE_FIELD {
            return Err(garde::Error::new("field name `image` is reserved for the image part"));
        }
        if !is_header_safe(name) {
            return Err(garde::Error::new(format!(
                "field name `{}` must not contain quotes or line breaks",
                name.escape_debug()
            )));
        }
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Invalid upload request: {0}")]
    Invalid(#[from] garde::Report),
}

/// Body returned by the digitization service on any 2xx status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DigitizeResponse {
    pub status: String,
    pub job_id: String,
    pub message: String,
    pub output_files: Vec<String>,
    #[serde(default)]
    pub stdout: Option<String>,
}

/// Body returned by the digitization service on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub stderr: Option<String>,
}

/// Outcome of a completed exchange. A server-reported error is a normal
/// `Failure`, never a transport error.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UploadResult {
    Success {
        job_id: String,
        message: String,
        output_files: Vec<String>,
        stdout_log: Option<String>,
    },
    Failure {
        http_status: u16,
        error_message: String,
        stderr_log: Option<String>,
    },
}

impl UploadResult {
    pub fn failure(http_status: u16, body: ErrorResponse) -> Self {
        Self::Failure {
            http_status,
            error_message: body.error,
            stderr_log: body.stderr,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl From<DigitizeResponse> for UploadResult {
    fn from(body: DigitizeResponse) -> Self {
        Self::Success {
            job_id: body.job_id,
            message: body.message,
            output_files: body.output_files,
            stdout_log: body.stdout,
        }
    }
}

impl fmt::Display for UploadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success {
                job_id,
                message,
                output_files,
                ..
            } => write!(
                f,
                "Job {job_id}: {message} ({} output file{})",
                output_files.len(),
                if output_files.len() == 1 { "" } else { "s" }
            ),
            Self::Failure {
                http_status,
                error_message,
                ..
            } => write!(f, "Server error {http_status}: {error_message}"),
        }
    }
}
