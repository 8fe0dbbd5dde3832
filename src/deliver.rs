//! Outbound payload delivery.
//!
//! One POST per share operation. Success is a 2xx status with a
//! JSON-parseable body; anything else fails the share attempt. There is no
//! retry, queueing, or backoff.

use crate::types::{ShareError, SharePayload};
use tracing::debug;

/// HTTP client for the configured ingest endpoint.
pub struct ShareClient {
    endpoint: String,
    http: reqwest::Client,
}

impl ShareClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            http: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Deliver one payload.
    pub async fn send(&self, payload: &SharePayload) -> Result<(), ShareError> {
        debug!(
            "Sending {} tab snapshot(s) to {}",
            payload.tabs_data.len(),
            self.endpoint
        );

        let response = self
            .http
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| ShareError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ShareError::EndpointStatus(status.as_u16()));
        }

        // The body content is unused, but it must parse as JSON
        let body = response
            .text()
            .await
            .map_err(|e| ShareError::Transport(e.to_string()))?;
        serde_json::from_str::<serde_json::Value>(&body)
            .map_err(|e| ShareError::InvalidBody(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TabSnapshot;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> SharePayload {
        SharePayload {
            tabs_data: vec![TabSnapshot {
                title: "Example".to_string(),
                url: "https://example.com/".to_string(),
                content: crate::extract::extract_content(
                    "<html><head><title>Example</title></head><body>hi</body></html>",
                    "https://example.com/",
                ),
            }],
        }
    }

    #[tokio::test]
    async fn test_send_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/active_tab"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ShareClient::new(format!("{}/active_tab", server.uri()));
        assert!(client.send(&payload()).await.is_ok());
    }

    #[tokio::test]
    async fn test_non_2xx_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ShareClient::new(format!("{}/active_tab", server.uri()));
        match client.send(&payload()).await {
            Err(ShareError::EndpointStatus(500)) => {}
            other => panic!("expected status failure, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = ShareClient::new(format!("{}/active_tab", server.uri()));
        assert!(matches!(
            client.send(&payload()).await,
            Err(ShareError::InvalidBody(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_failure() {
        // Nothing listens on this port
        let client = ShareClient::new("http://127.0.0.1:1/active_tab".to_string());
        assert!(matches!(
            client.send(&payload()).await,
            Err(ShareError::Transport(_))
        ));
    }
}
