use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use uuid::Uuid;

use crate::models::upload::{UploadRequest, IMAGE_FIELD};

const CRLF: &[u8] = b"\r\n";

/// Per-request multipart delimiter token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary(String);

impl Boundary {
    /// Random boundary guaranteed not to occur in any part of the request.
    pub fn generate_for(request: &UploadRequest) -> Self {
        loop {
            let candidate = Self(format!("Boundary-{}", Uuid::new_v4().simple()));
            if !candidate.occurs_in(request) {
                return candidate;
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.0)
    }

    fn occurs_in(&self, request: &UploadRequest) -> bool {
        let needle = self.0.as_bytes();
        contains(request.image(), needle)
            || request
                .fields()
                .values()
                .any(|value| contains(value.as_bytes(), needle))
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && haystack.windows(needle.len()).any(|w| w == needle)
}

/// Encode the request as a multipart/form-data body: the image part first,
/// then each extra field in name order, then the closing delimiter.
pub fn encode(request: &UploadRequest, boundary: &Boundary) -> Bytes {
    let delimiter = format!("--{boundary}\r\n");
    let field_bytes: usize = request
        .fields()
        .iter()
        .map(|(name, value)| name.len() + value.len() + delimiter.len() + 64)
        .sum();
    let mut body =
        BytesMut::with_capacity(request.image().len() + field_bytes + delimiter.len() * 2 + 160);

    body.put_slice(delimiter.as_bytes());
    body.put_slice(
        format!(
            "Content-Disposition: form-data; name=\"{IMAGE_FIELD}\"; filename=\"{}\"\r\n",
            request.filename()
        )
        .as_bytes(),
    );
    body.put_slice(format!("Content-Type: {}\r\n", request.content_type()).as_bytes());
    body.put_slice(CRLF);
    body.put_slice(request.image());
    body.put_slice(CRLF);

    for (name, value) in request.fields() {
        body.put_slice(delimiter.as_bytes());
        body.put_slice(format!("Content-Disposition: form-data; name=\"{name}\"\r\n").as_bytes());
        body.put_slice(CRLF);
        body.put_slice(value.as_bytes());
        body.put_slice(CRLF);
    }

    body.put_slice(format!("--{boundary}--\r\n").as_bytes());
    body.freeze()
}
