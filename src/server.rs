//! Unix socket server for control requests.
//!
//! Each connection carries newline-delimited JSON: one request per line,
//! answered with one JSON response line. Requests are forwarded to the
//! coordinator, which resolves every reply.

use crate::coordinator::CoordinatorHandle;
use crate::protocol::{
    AutoShareStatusResponse, ControlRequest, PageInfoResponse, SetAutoShareResponse, ShareResponse,
};
use crate::types::ShareTrigger;
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, warn};

/// Control server listening on a Unix socket.
pub struct ControlServer {
    socket_path: PathBuf,
    handle: CoordinatorHandle,
}

impl ControlServer {
    pub fn new(socket_path: PathBuf, handle: CoordinatorHandle) -> Self {
        Self {
            socket_path,
            handle,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Bind the socket and serve connections until the task is dropped.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // Remove existing socket file if present
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        debug!("Control server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let handle = self.handle.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, handle).await {
                            error!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    stream: UnixStream,
    handle: CoordinatorHandle,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    while reader.read_line(&mut line).await? > 0 {
        let response = match serde_json::from_str::<ControlRequest>(&line) {
            Ok(request) => {
                debug!("Control request: {:?}", request);
                dispatch(&handle, request).await
            }
            Err(e) => {
                warn!("Failed to parse control request: {}", e);
                json!({ "success": false, "message": format!("Parse error: {}", e) })
            }
        };

        let response_json = serde_json::to_string(&response)?;
        writer.write_all(response_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;

        line.clear();
    }

    Ok(())
}

/// Map one request to its response value.
async fn dispatch(handle: &CoordinatorHandle, request: ControlRequest) -> serde_json::Value {
    match request {
        ControlRequest::ShareAllTabs | ControlRequest::ShareActiveTab => {
            let outcome = handle.share(ShareTrigger::Manual).await;
            serde_json::to_value(ShareResponse::from(outcome)).unwrap_or_default()
        }
        ControlRequest::SetAutoShare { enabled } => {
            let flag = handle.set_auto_share(enabled).await;
            serde_json::to_value(SetAutoShareResponse {
                success: true,
                auto_share_enabled: flag,
            })
            .unwrap_or_default()
        }
        ControlRequest::GetAutoShareStatus => {
            let flag = handle.auto_share_status().await;
            serde_json::to_value(AutoShareStatusResponse {
                auto_share_enabled: flag,
            })
            .unwrap_or_default()
        }
        ControlRequest::GetPageInfo => {
            let response = match handle.page_info().await {
                Ok(info) => PageInfoResponse::Info(info),
                Err(message) => PageInfoResponse::failed(message),
            };
            serde_json::to_value(response).unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::Coordinator;
    use crate::deliver::ShareClient;
    use crate::prefs::PrefStore;
    use crate::tabs::{TabError, TabProvider, TabTarget};
    use async_trait::async_trait;
    use std::sync::Arc;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct OneTab;

    #[async_trait]
    impl TabProvider for OneTab {
        async fn list_tabs(&self) -> Result<Vec<TabTarget>, TabError> {
            Ok(vec![serde_json::from_value(serde_json::json!({
                "id": "a",
                "type": "page",
                "title": "Example",
                "url": "https://example.com/",
            }))
            .unwrap()])
        }

        async fn page_html(&self, _target: &TabTarget) -> Result<String, TabError> {
            Ok("<html><head><title>Example</title></head><body>hello</body></html>".to_string())
        }
    }

    async fn start_server(dir: &tempfile::TempDir) -> (MockServer, PathBuf) {
        let endpoint = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok"
            })))
            .mount(&endpoint)
            .await;

        let prefs = PrefStore::open(dir.path().join("preferences.json"));
        let client = ShareClient::new(format!("{}/active_tab", endpoint.uri()));
        let handle = Coordinator::new(Arc::new(OneTab), client, prefs).spawn();

        let socket_path = dir.path().join("ctl.sock");
        let server = ControlServer::new(socket_path.clone(), handle);
        tokio::spawn(async move {
            let _ = server.run().await;
        });

        // Wait for the socket to appear
        for _ in 0..50 {
            if socket_path.exists() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        (endpoint, socket_path)
    }

    async fn request(socket_path: &Path, body: &str) -> serde_json::Value {
        let stream = UnixStream::connect(socket_path).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        writer.write_all(body.as_bytes()).await.unwrap();
        writer.write_all(b"\n").await.unwrap();
        writer.flush().await.unwrap();

        let mut reader = BufReader::new(reader);
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        serde_json::from_str(&line).unwrap()
    }

    #[tokio::test]
    async fn test_share_request_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let (_endpoint, socket) = start_server(&dir).await;

        let response = request(&socket, r#"{"action": "shareAllTabs"}"#).await;
        assert_eq!(response["success"], true);
        assert_eq!(response["message"], "Tabs shared successfully");
    }

    #[tokio::test]
    async fn test_auto_share_toggle_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let (_endpoint, socket) = start_server(&dir).await;

        let response = request(&socket, r#"{"action": "getAutoShareStatus"}"#).await;
        assert_eq!(response["autoShareEnabled"], false);

        let response = request(&socket, r#"{"action": "setAutoShare", "enabled": true}"#).await;
        assert_eq!(response["success"], true);
        assert_eq!(response["autoShareEnabled"], true);

        let response = request(&socket, r#"{"action": "getAutoShareStatus"}"#).await;
        assert_eq!(response["autoShareEnabled"], true);
    }

    #[tokio::test]
    async fn test_malformed_request_gets_error_response() {
        let dir = tempfile::tempdir().unwrap();
        let (_endpoint, socket) = start_server(&dir).await;

        let response = request(&socket, r#"{"action": "unknown"}"#).await;
        assert_eq!(response["success"], false);
        assert!(response["message"]
            .as_str()
            .unwrap()
            .starts_with("Parse error"));
    }

    #[tokio::test]
    async fn test_page_info_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let (_endpoint, socket) = start_server(&dir).await;

        let response = request(&socket, r#"{"action": "getPageInfo"}"#).await;
        assert_eq!(response["title"], "Example");
        assert_eq!(response["url"], "https://example.com/");
        assert_eq!(response["textContent"], "hello");
    }
}
