//! Tabshare - shares open browser tab content with a local assistant endpoint
//!
//! This crate watches a running browser through its DevTools debugging
//! endpoint, extracts readable content from open tabs, and POSTs the
//! aggregate payload to a local HTTP endpoint, either on demand or
//! automatically on tab navigation and activation.
//!
//! # Architecture
//!
//! The daemon polls the browser's target list, diffs snapshots into tab
//! events, and hands debounced share triggers to the coordinator. A Unix
//! socket carries the control protocol used by `tabshare-ctl` (and any other
//! collaborator) for manual shares, the auto-share toggle, and status reads.

pub mod config;
pub mod coordinator;
pub mod debounce;
pub mod deliver;
pub mod extract;
pub mod prefs;
pub mod protocol;
pub mod server;
pub mod tabs;
pub mod timefmt;
pub mod tracker;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::{Coordinator, CoordinatorHandle};
pub use debounce::Debouncer;
pub use deliver::ShareClient;
pub use prefs::{PrefStore, Preferences};
pub use server::ControlServer;
pub use tabs::{is_privileged_url, CdpTabs, TabProvider, TabTarget};
pub use tracker::TabTracker;
pub use types::{
    ExtractedContent, Heading, ImageRef, LinkRef, PageInfo, ShareError, ShareOutcome,
    SharePayload, ShareTrigger, TabEvent, TabSnapshot,
};
