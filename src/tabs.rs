//! Browser tab access via the Chrome DevTools Protocol.
//!
//! Tabs are enumerated through the browser's `/json/list` endpoint and page
//! DOM snapshots are fetched by evaluating an expression over each target's
//! WebSocket debugger connection. The [`TabProvider`] trait is the seam the
//! coordinator depends on, so tests can substitute scripted tab sets.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace};

/// URL schemes reserved for the browser's internal pages. Tabs on these
/// schemes are never extracted.
pub const PRIVILEGED_SCHEMES: &[&str] = &[
    "chrome:",
    "chrome-extension:",
    "chrome-untrusted:",
    "devtools:",
    "about:",
    "view-source:",
    "edge:",
    "brave:",
];

/// Check whether a URL belongs to a privileged browser-internal scheme.
pub fn is_privileged_url(url: &str) -> bool {
    PRIVILEGED_SCHEMES
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

/// A target reported by the browser's `/json/list` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabTarget {
    pub id: String,
    #[serde(rename = "type")]
    pub target_type: String,
    pub title: String,
    pub url: String,
    pub web_socket_debugger_url: Option<String>,
}

impl TabTarget {
    /// Whether this target is an ordinary page (not a worker or devtools UI).
    pub fn is_page(&self) -> bool {
        self.target_type == "page"
    }
}

/// Browser version info from `/json/version`.
///
/// Note: Chrome returns PascalCase field names for this endpoint.
#[derive(Debug, Clone, Deserialize)]
struct BrowserVersion {
    #[serde(rename = "Browser")]
    browser: String,
}

/// Errors from tab enumeration and page evaluation.
#[derive(Debug, thiserror::Error)]
pub enum TabError {
    #[error("Browser not available at {0}: {1}")]
    NotAvailable(String, String),

    #[error("Target list request failed: {0}")]
    Discovery(String),

    #[error("Target has no debugger endpoint")]
    NoDebuggerUrl,

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Evaluation failed: {0}")]
    Evaluate(String),
}

/// Source of open tabs and page DOM snapshots.
#[async_trait]
pub trait TabProvider: Send + Sync {
    /// List the browser's open page targets.
    async fn list_tabs(&self) -> Result<Vec<TabTarget>, TabError>;

    /// Fetch the page's outer HTML.
    async fn page_html(&self, target: &TabTarget) -> Result<String, TabError>;
}

/// DevTools protocol request message.
#[derive(Debug, Serialize)]
struct CdpRequest {
    id: u64,
    method: String,
    params: Value,
}

/// DevTools protocol response message.
#[derive(Debug, Deserialize)]
struct CdpResponse {
    id: Option<u64>,
    result: Option<Value>,
    error: Option<CdpErrorResponse>,
}

#[derive(Debug, Deserialize)]
struct CdpErrorResponse {
    code: i64,
    message: String,
}

/// Tab provider backed by a running browser's remote debugging endpoint.
pub struct CdpTabs {
    endpoint: String,
    http: reqwest::Client,
}

impl CdpTabs {
    /// Connect to the browser at `endpoint` (e.g. "http://localhost:9222"),
    /// verifying the debugging interface is reachable.
    pub async fn connect(endpoint: &str) -> Result<Self, TabError> {
        let endpoint = endpoint.trim_end_matches('/').to_string();
        let http = reqwest::Client::new();

        let version_url = format!("{}/json/version", endpoint);
        let version: BrowserVersion = http
            .get(&version_url)
            .send()
            .await
            .map_err(|e| TabError::NotAvailable(endpoint.clone(), e.to_string()))?
            .json()
            .await
            .map_err(|e| TabError::NotAvailable(endpoint.clone(), e.to_string()))?;

        debug!("Connected to browser: {}", version.browser);

        Ok(Self { endpoint, http })
    }

    /// Evaluate a JavaScript expression over a target's debugger WebSocket
    /// and return its value.
    async fn evaluate(&self, ws_url: &str, expression: &str) -> Result<Value, TabError> {
        let (mut stream, _) = tokio_tungstenite::connect_async(ws_url)
            .await
            .map_err(|e| TabError::WebSocket(e.to_string()))?;

        let request = CdpRequest {
            id: 1,
            method: "Runtime.evaluate".to_string(),
            params: json!({
                "expression": expression,
                "returnByValue": true,
            }),
        };
        let payload =
            serde_json::to_string(&request).map_err(|e| TabError::Evaluate(e.to_string()))?;
        trace!("CDP send: {}", payload);

        stream
            .send(Message::Text(payload.into()))
            .await
            .map_err(|e| TabError::WebSocket(e.to_string()))?;

        while let Some(msg) = stream.next().await {
            let msg = msg.map_err(|e| TabError::WebSocket(e.to_string()))?;
            let text = match msg {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };
            trace!("CDP recv: {}", text);

            let response: CdpResponse = match serde_json::from_str(&text) {
                Ok(response) => response,
                // Events and other traffic on the same socket are skipped
                Err(_) => continue,
            };

            if response.id != Some(request.id) {
                continue;
            }

            let _ = stream.close(None).await;

            if let Some(error) = response.error {
                return Err(TabError::Evaluate(format!(
                    "{} (code {})",
                    error.message, error.code
                )));
            }

            let result = response.result.unwrap_or(Value::Null);
            if let Some(details) = result.get("exceptionDetails") {
                return Err(TabError::Evaluate(
                    details["text"].as_str().unwrap_or("page exception").to_string(),
                ));
            }

            return Ok(result["result"]["value"].clone());
        }

        Err(TabError::WebSocket("connection closed before response".to_string()))
    }
}

#[async_trait]
impl TabProvider for CdpTabs {
    async fn list_tabs(&self) -> Result<Vec<TabTarget>, TabError> {
        let url = format!("{}/json/list", self.endpoint);
        let targets: Vec<TabTarget> = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| TabError::Discovery(e.to_string()))?
            .json()
            .await
            .map_err(|e| TabError::Discovery(e.to_string()))?;

        Ok(targets.into_iter().filter(TabTarget::is_page).collect())
    }

    async fn page_html(&self, target: &TabTarget) -> Result<String, TabError> {
        let ws_url = target
            .web_socket_debugger_url
            .as_deref()
            .ok_or(TabError::NoDebuggerUrl)?;

        let value = self
            .evaluate(ws_url, "document.documentElement.outerHTML")
            .await?;

        Ok(value.as_str().unwrap_or_default().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privileged_schemes() {
        assert!(is_privileged_url("chrome://settings"));
        assert!(is_privileged_url("chrome-extension://abcdef/popup.html"));
        assert!(is_privileged_url("devtools://devtools/bundled/inspector.html"));
        assert!(is_privileged_url("about:blank"));
        assert!(!is_privileged_url("https://example.com/"));
        assert!(!is_privileged_url("http://chrome.com/"));
    }

    #[test]
    fn test_target_deserialization() {
        let json = r#"[{
            "id": "A1B2",
            "type": "page",
            "title": "Example",
            "url": "https://example.com/",
            "webSocketDebuggerUrl": "ws://localhost:9222/devtools/page/A1B2"
        }, {
            "id": "C3D4",
            "type": "service_worker",
            "title": "sw",
            "url": "https://example.com/sw.js"
        }]"#;

        let targets: Vec<TabTarget> = serde_json::from_str(json).unwrap();
        assert_eq!(targets.len(), 2);
        assert!(targets[0].is_page());
        assert!(!targets[1].is_page());
        assert!(targets[1].web_socket_debugger_url.is_none());
    }
}
