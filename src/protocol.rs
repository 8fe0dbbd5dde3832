//! Control wire protocol.
//!
//! The control surface (and any other collaborator) speaks JSON per line
//! over the daemon's Unix socket: one request, one response. Requests are
//! tagged by their `action` field; each action has its own response shape.

use crate::types::{PageInfo, ShareOutcome};
use serde::{Deserialize, Serialize};

/// Inbound control request, tagged by action.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "action")]
pub enum ControlRequest {
    /// Share every qualifying tab in the window
    #[serde(rename = "shareAllTabs")]
    ShareAllTabs,

    /// Accepted alias: dispatched identically to `shareAllTabs`
    #[serde(rename = "shareActiveTab")]
    ShareActiveTab,

    /// Enable or disable auto-share
    #[serde(rename = "setAutoShare")]
    SetAutoShare { enabled: bool },

    /// Read the current auto-share flag
    #[serde(rename = "getAutoShareStatus")]
    GetAutoShareStatus,

    /// Lightweight foreground-page summary
    #[serde(rename = "getPageInfo")]
    GetPageInfo,
}

/// Response to a share request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareResponse {
    pub success: bool,
    pub message: String,
}

impl From<ShareOutcome> for ShareResponse {
    fn from(outcome: ShareOutcome) -> Self {
        Self {
            success: outcome.success,
            message: outcome.message,
        }
    }
}

/// Response to `setAutoShare`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAutoShareResponse {
    pub success: bool,
    pub auto_share_enabled: bool,
}

/// Response to `getAutoShareStatus`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoShareStatusResponse {
    pub auto_share_enabled: bool,
}

/// Response to `getPageInfo`: the page summary, or a failure message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageInfoResponse {
    Info(PageInfo),
    Failed { success: bool, message: String },
}

impl PageInfoResponse {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parsing() {
        let req: ControlRequest = serde_json::from_str(r#"{"action": "shareAllTabs"}"#).unwrap();
        assert_eq!(req, ControlRequest::ShareAllTabs);

        let req: ControlRequest = serde_json::from_str(r#"{"action": "shareActiveTab"}"#).unwrap();
        assert_eq!(req, ControlRequest::ShareActiveTab);

        let req: ControlRequest =
            serde_json::from_str(r#"{"action": "setAutoShare", "enabled": true}"#).unwrap();
        assert_eq!(req, ControlRequest::SetAutoShare { enabled: true });

        let req: ControlRequest =
            serde_json::from_str(r#"{"action": "getAutoShareStatus"}"#).unwrap();
        assert_eq!(req, ControlRequest::GetAutoShareStatus);
    }

    #[test]
    fn test_unknown_action_rejected() {
        assert!(serde_json::from_str::<ControlRequest>(r#"{"action": "explode"}"#).is_err());
        assert!(serde_json::from_str::<ControlRequest>(r#"{}"#).is_err());
    }

    #[test]
    fn test_response_wire_keys() {
        let response = SetAutoShareResponse {
            success: true,
            auto_share_enabled: true,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["autoShareEnabled"], true);
        assert_eq!(json["success"], true);

        let status = AutoShareStatusResponse {
            auto_share_enabled: false,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["autoShareEnabled"], false);
    }

    #[test]
    fn test_page_info_response_shapes() {
        let ok = PageInfoResponse::Info(PageInfo {
            title: "T".to_string(),
            url: "https://example.com/".to_string(),
            text_content: "body".to_string(),
        });
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["textContent"], "body");

        let failed = PageInfoResponse::failed("no tabs");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["success"], false);
    }
}
