use std::time::Instant;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use tokio_util::sync::CancellationToken;

use crate::models::upload::{DigitizeResponse, ErrorResponse, UploadRequest, UploadResult};
use crate::services::multipart::{self, Boundary};

/// Client for the remote ECG digitization service.
///
/// Holds no per-request state; concurrent `submit` calls are independent.
#[derive(Clone)]
pub struct UploadClient {
    http: Client,
}

impl UploadClient {
    pub fn new(user_agent: &str) -> Result<Self, TransportError> {
        let http = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(TransportError::Network)?;
        Ok(Self { http })
    }

    /// Wrap an existing reqwest client (shared connection pool, custom TLS).
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    /// Upload one capture and interpret the service's answer.
    ///
    /// Dropping the returned future aborts the in-flight request.
    pub async fn submit(&self, request: UploadRequest) -> Result<UploadResult, TransportError> {
        let url = parse_endpoint(request.endpoint())?;
        let boundary = Boundary::generate_for(&request);
        let body = multipart::encode(&request, &boundary);

        tracing::info!(
            endpoint = %url,
            image_bytes = request.image().len(),
            fields = request.fields().len(),
            boundary = %boundary,
            "Uploading capture for digitization"
        );
        metrics::counter!("digitize_uploads_total").increment(1);
        let start = Instant::now();

        let outcome = self.exchange(url, &boundary, body).await;
        metrics::histogram!("digitize_upload_seconds").record(start.elapsed().as_secs_f64());

        match &outcome {
            Ok(result) if result.is_success() => {
                tracing::info!(result = %result, "Digitization accepted");
            }
            Ok(result) => {
                metrics::counter!("digitize_uploads_failed", "reason" => "server").increment(1);
                tracing::warn!(result = %result, "Digitization rejected by server");
            }
            Err(e) => {
                metrics::counter!("digitize_uploads_failed", "reason" => e.kind()).increment(1);
                tracing::error!(error = %e, "Upload exchange failed");
            }
        }

        outcome
    }

    /// Like [`submit`](Self::submit), but gives up as soon as `cancel` fires.
    /// A cancelled exchange yields `None`: neither a result nor an error.
    pub async fn submit_until_cancelled(
        &self,
        request: UploadRequest,
        cancel: &CancellationToken,
    ) -> Option<Result<UploadResult, TransportError>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Upload cancelled before completion");
                None
            }
            outcome = self.submit(request) => Some(outcome),
        }
    }

    async fn exchange(
        &self,
        url: Url,
        boundary: &Boundary,
        body: bytes::Bytes,
    ) -> Result<UploadResult, TransportError> {
        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, boundary.content_type())
            .body(body)
            .send()
            .await
            .map_err(TransportError::Network)?;

        let status = response.status();
        let payload = response.bytes().await.map_err(TransportError::Network)?;

        tracing::debug!(
            http_status = status.as_u16(),
            response_bytes = payload.len(),
            "Received digitization response"
        );

        if status.is_success() {
            let body: DigitizeResponse =
                serde_json::from_slice(&payload).map_err(|source| {
                    TransportError::MalformedResponse {
                        http_status: status.as_u16(),
                        source,
                    }
                })?;
            Ok(body.into())
        } else {
            let body: ErrorResponse = serde_json::from_slice(&payload).map_err(|source| {
                TransportError::MalformedResponse {
                    http_status: status.as_u16(),
                    source,
                }
            })?;
            Ok(UploadResult::failure(status.as_u16(), body))
        }
    }
}

/// Accept only absolute http(s) URLs.
fn parse_endpoint(endpoint: &str) -> Result<Url, TransportError> {
    let url = Url::parse(endpoint).map_err(|e| TransportError::BadUrl {
        url: endpoint.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        scheme => Err(TransportError::BadUrl {
            url: endpoint.to_string(),
            reason: format!("unsupported scheme `{scheme}` or missing host"),
        }),
    }
}

/// The exchange produced no interpretable result.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid endpoint URL `{url}`: {reason}")]
    BadUrl { url: String, reason: String },

    #[error("HTTP exchange failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Malformed response body (HTTP {http_status}): {source}")]
    MalformedResponse {
        http_status: u16,
        #[source]
        source: serde_json::Error,
    },
}

impl TransportError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadUrl { .. } => "bad_url",
            Self::Network(_) => "network",
            Self::MalformedResponse { .. } => "malformed_response",
        }
    }
}
