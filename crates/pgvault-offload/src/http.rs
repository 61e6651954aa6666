//! The HTTP PUT boundary between upload logic and the network.
//!
//! Upload targets describe one request as a [`PutRequest`] value and hand it
//! to an [`HttpPutClient`]. The production client streams the file body over
//! HTTPS with `reqwest`; tests substitute a recording client, so signing and
//! traversal logic is exercised without a network.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::error::{OffloadError, OffloadResult};

/// Maximum number of response-body bytes kept for diagnostics.
const SNIPPET_MAX: usize = 512;

/// One object PUT, fully described and signed.
#[derive(Debug, Clone)]
pub struct PutRequest {
    /// Request host, e.g. `bucket.s3.region.amazonaws.com`.
    pub host: String,
    /// Request path, including the leading slash.
    pub resource_path: String,
    /// Headers to send verbatim, authorization included.
    pub headers: Vec<(String, String)>,
    /// Local file whose contents form the body.
    pub body: PathBuf,
    /// Body length in bytes.
    pub content_length: u64,
}

/// The parts of a PUT response the upload path cares about.
#[derive(Debug, Clone)]
pub struct PutResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, truncated to a diagnostic snippet.
    pub snippet: String,
}

impl PutResponse {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends signed PUT requests.
#[async_trait]
pub trait HttpPutClient: Send + Sync {
    /// Send one PUT and return the response status and body snippet.
    async fn put(&self, req: &PutRequest) -> OffloadResult<PutResponse>;
}

/// Production client streaming file bodies over HTTPS.
#[derive(Debug, Default, Clone)]
pub struct ReqwestPutClient {
    client: reqwest::Client,
}

impl ReqwestPutClient {
    /// Create a client with default connection settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpPutClient for ReqwestPutClient {
    async fn put(&self, req: &PutRequest) -> OffloadResult<PutResponse> {
        let file = tokio::fs::File::open(&req.body)
            .await
            .map_err(|e| OffloadError::LocalIo {
                path: req.body.clone(),
                source: e,
            })?;

        let url = format!("https://{}{}", req.host, req.resource_path);
        debug!(url = %url, length = req.content_length, "sending PUT");

        let mut builder = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_LENGTH, req.content_length);
        for (name, value) in &req.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .body(reqwest::Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    OffloadError::Connect {
                        host: req.host.clone(),
                        source: e,
                    }
                } else {
                    OffloadError::Protocol {
                        host: req.host.clone(),
                        source: e,
                    }
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        Ok(PutResponse {
            status,
            snippet: truncate_snippet(&body),
        })
    }
}

/// Truncate a response body to [`SNIPPET_MAX`] bytes on a char boundary.
fn truncate_snippet(body: &str) -> String {
    if body.len() <= SNIPPET_MAX {
        return body.to_owned();
    }
    let mut end = SNIPPET_MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_keep_short_snippets_intact() {
        assert_eq!(truncate_snippet("access denied"), "access denied");
    }

    #[test]
    fn test_should_truncate_long_snippets() {
        let body = "x".repeat(SNIPPET_MAX * 2);
        assert_eq!(truncate_snippet(&body).len(), SNIPPET_MAX);
    }

    #[test]
    fn test_should_truncate_on_char_boundary() {
        // Multi-byte characters straddling the cut point must not split.
        let body = "é".repeat(SNIPPET_MAX);
        let snippet = truncate_snippet(&body);
        assert!(snippet.len() <= SNIPPET_MAX);
        assert!(snippet.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_should_classify_2xx_as_success() {
        let ok = PutResponse {
            status: 200,
            snippet: String::new(),
        };
        let forbidden = PutResponse {
            status: 403,
            snippet: String::new(),
        };
        assert!(ok.is_success());
        assert!(!forbidden.is_success());
    }
}
