// # HTTP Response Sender
//
// Delivers the response envelope to the presigned `ResponseURL` the
// orchestrator put in the request.
//
// ## Wire format
//
// - Method: `PUT`
// - Body: the envelope as JSON
// - `Content-Type` is sent **empty**. The URL is presigned over the
//   content type, and it was signed with none.
//
// ## Failure handling
//
// One attempt per request. Transport errors, timeouts (30 seconds) and
// non-2xx statuses are returned as [`Error::Callback`]; the daemon exits
// non-zero and the orchestrator eventually times the resource out.

use async_trait::async_trait;
use cfn_core::{Error, ResponseEnvelope, ResponseSender, Result};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, info};

/// Default HTTP timeout for delivery (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// PUTs response envelopes to presigned URLs
#[derive(Debug, Clone)]
pub struct HttpResponseSender {
    client: reqwest::Client,
}

impl HttpResponseSender {
    /// Create a sender with the default timeout
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a sender with a custom timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

impl Default for HttpResponseSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseSender for HttpResponseSender {
    async fn send(&self, response_url: &str, envelope: &ResponseEnvelope) -> Result<()> {
        let body = envelope.to_json()?;
        debug!("PUT {} bytes to response URL", body.len());

        let response = self
            .client
            .put(response_url)
            .header(CONTENT_TYPE, "")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::callback(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::callback(format!(
                "HTTP {}: {}",
                status,
                detail.trim()
            )));
        }

        info!("Response accepted with HTTP {}", status);
        Ok(())
    }

    fn sender_name(&self) -> &'static str {
        "http"
    }
}
