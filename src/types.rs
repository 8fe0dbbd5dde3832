//! Core types for tab snapshots, share payloads, and share results.
//!
//! Wire names are camelCase so the receiving endpoint sees the same JSON
//! shape the browser-side sender produced (`tabsData`, `metaDescription`).

use serde::{Deserialize, Serialize};

/// A single heading extracted from a page, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Tag name, lowercased ("h1", "h2", "h3")
    pub level: String,
    /// Trimmed heading text, never empty
    pub text: String,
}

/// A link extracted from a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    /// Trimmed anchor text, never empty
    pub text: String,
    /// Absolute URL, resolved against the page URL
    pub url: String,
}

/// An image reference extracted from a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Alt text, possibly empty
    pub alt: String,
    /// Absolute source URL, never empty
    pub src: String,
}

/// Readable content scraped from one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedContent {
    /// Document title
    pub title: String,
    /// Content of the first `meta[name="description"]`, or empty
    pub meta_description: String,
    /// h1/h2/h3 headings in document order
    pub headings: Vec<Heading>,
    /// Main content text, truncated to [`MAX_TEXT_CHARS`](crate::extract::MAX_TEXT_CHARS)
    pub text_content: String,
    /// First links with non-empty text
    pub links: Vec<LinkRef>,
    /// First images with a non-empty source
    pub images: Vec<ImageRef>,
    /// Extraction time, RFC 3339
    pub timestamp: String,
}

/// Snapshot of one tab at extraction time. Sent once, never retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabSnapshot {
    /// Tab title as reported by the browser
    pub title: String,
    /// Tab URL
    pub url: String,
    /// Extracted page content
    pub content: ExtractedContent,
}

/// Payload for one share operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePayload {
    pub tabs_data: Vec<TabSnapshot>,
}

/// Lightweight page summary for the companion `getPageInfo` query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub title: String,
    pub url: String,
    /// Body text, truncated to [`PAGE_INFO_TEXT_CHARS`](crate::extract::PAGE_INFO_TEXT_CHARS)
    pub text_content: String,
}

/// What caused a share operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareTrigger {
    /// Explicit request from the control surface
    Manual,
    /// Tab navigation/activation event or auto-share enable
    Automatic,
}

impl ShareTrigger {
    pub fn is_automatic(&self) -> bool {
        matches!(self, ShareTrigger::Automatic)
    }
}

/// Result of one share operation. Failures never propagate past the
/// coordinator; they are folded into this record instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareOutcome {
    pub success: bool,
    pub message: String,
    /// Set on failed automatic shares so the control surface may suppress
    /// the error from user-facing output.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub silent: bool,
}

impl ShareOutcome {
    pub fn succeeded(trigger: ShareTrigger) -> Self {
        let message = match trigger {
            ShareTrigger::Automatic => "Tabs shared automatically",
            ShareTrigger::Manual => "Tabs shared successfully",
        };
        Self {
            success: true,
            message: message.to_string(),
            silent: false,
        }
    }

    pub fn failed(trigger: ShareTrigger, error: &ShareError) -> Self {
        Self {
            success: false,
            message: format!("Error: {}", error),
            silent: trigger.is_automatic(),
        }
    }
}

/// Errors that can occur during a share operation.
#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("No valid tab data to send")]
    NoContent,

    #[error("Browser unavailable: {0}")]
    Browser(String),

    #[error("Server responded with status: {0}")]
    EndpointStatus(u16),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Server returned a non-JSON body: {0}")]
    InvalidBody(String),
}

/// Tab lifecycle events observed from the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabEvent {
    /// The foreground tab finished navigating to a new URL
    ForegroundNavigated { url: String },
    /// A different tab became the foreground tab
    ForegroundSwitched { target_id: String },
}
