//! Share orchestration.
//!
//! The coordinator owns the preference store and the auto-share flag, and
//! runs every share operation end to end: enumerate tabs, drop privileged
//! ones, extract the rest concurrently with per-tab failure isolation, POST
//! the aggregate payload, and record the share time. Every failure is folded
//! into a [`ShareOutcome`]; nothing is thrown past this boundary.

use crate::deliver::ShareClient;
use crate::extract;
use crate::prefs::{PrefStore, Preferences};
use crate::tabs::{is_privileged_url, TabProvider, TabTarget};
use crate::types::{PageInfo, ShareError, ShareOutcome, SharePayload, ShareTrigger, TabSnapshot};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

/// Requests the coordinator accepts. Each carries a reply channel; the
/// coordinator always resolves it, so no caller is left hanging.
#[derive(Debug)]
pub enum Command {
    Share {
        trigger: ShareTrigger,
        reply: oneshot::Sender<ShareOutcome>,
    },
    SetAutoShare {
        enabled: bool,
        reply: oneshot::Sender<bool>,
    },
    GetAutoShareStatus {
        reply: oneshot::Sender<bool>,
    },
    GetPageInfo {
        reply: oneshot::Sender<Result<PageInfo, String>>,
    },
}

/// Cloneable handle for submitting requests to a running coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<Command>,
}

impl CoordinatorHandle {
    pub async fn share(&self, trigger: ShareTrigger) -> ShareOutcome {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::Share { trigger, reply }).await.is_err() {
            return ShareOutcome {
                success: false,
                message: "Error: coordinator stopped".to_string(),
                silent: trigger.is_automatic(),
            };
        }
        rx.await.unwrap_or(ShareOutcome {
            success: false,
            message: "Error: coordinator stopped".to_string(),
            silent: trigger.is_automatic(),
        })
    }

    pub async fn set_auto_share(&self, enabled: bool) -> bool {
        let (reply, rx) = oneshot::channel();
        if self
            .tx
            .send(Command::SetAutoShare { enabled, reply })
            .await
            .is_err()
        {
            return enabled;
        }
        rx.await.unwrap_or(enabled)
    }

    pub async fn auto_share_status(&self) -> bool {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::GetAutoShareStatus { reply }).await.is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    pub async fn page_info(&self) -> Result<PageInfo, String> {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::GetPageInfo { reply }).await.is_err() {
            return Err("coordinator stopped".to_string());
        }
        rx.await.unwrap_or_else(|_| Err("coordinator stopped".to_string()))
    }
}

/// Orchestrates share operations and owns the durable preferences.
pub struct Coordinator {
    tabs: Arc<dyn TabProvider>,
    client: ShareClient,
    prefs: PrefStore,
    /// Auto-share flag mirrored from the store via its change subscription
    prefs_rx: watch::Receiver<Preferences>,
}

impl Coordinator {
    pub fn new(tabs: Arc<dyn TabProvider>, client: ShareClient, prefs: PrefStore) -> Self {
        let prefs_rx = prefs.subscribe();
        Self {
            tabs,
            client,
            prefs,
            prefs_rx,
        }
    }

    /// Current auto-share flag, read through the store subscription.
    pub fn auto_share_enabled(&self) -> bool {
        self.prefs_rx.borrow().auto_share_enabled
    }

    /// Create the command channel and a handle, then consume the coordinator
    /// into its dispatch task. Requests are processed one at a time on the
    /// cooperative loop.
    pub fn spawn(self) -> CoordinatorHandle {
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(self.run(rx));
        CoordinatorHandle { tx }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        while let Some(command) = rx.recv().await {
            match command {
                Command::Share { trigger, reply } => {
                    let outcome = self.share_all_tabs(trigger).await;
                    let _ = reply.send(outcome);
                }
                Command::SetAutoShare { enabled, reply } => {
                    let flag = self.set_auto_share(enabled).await;
                    let _ = reply.send(flag);
                }
                Command::GetAutoShareStatus { reply } => {
                    let _ = reply.send(self.auto_share_enabled());
                }
                Command::GetPageInfo { reply } => {
                    let _ = reply.send(self.page_info().await);
                }
            }
        }
    }

    /// Update the auto-share flag. A disabled→enabled transition triggers an
    /// immediate full share before returning. Returns the resulting flag.
    pub async fn set_auto_share(&mut self, enabled: bool) -> bool {
        let was_enabled = self.auto_share_enabled();
        self.prefs.set_auto_share(enabled);
        info!("Auto-share {}", if enabled { "enabled" } else { "disabled" });

        if enabled && !was_enabled {
            let outcome = self.share_all_tabs(ShareTrigger::Automatic).await;
            if !outcome.success {
                debug!("Initial auto-share attempt failed: {}", outcome.message);
            }
        }

        self.auto_share_enabled()
    }

    /// Run one share operation. Never returns an error: failures become a
    /// failed outcome.
    pub async fn share_all_tabs(&mut self, trigger: ShareTrigger) -> ShareOutcome {
        let started = Utc::now();
        match self.try_share().await {
            Ok(count) => {
                info!(
                    "Shared {} tab(s) to {} in {} ms",
                    count,
                    self.client.endpoint(),
                    (Utc::now() - started).num_milliseconds()
                );
                ShareOutcome::succeeded(trigger)
            }
            Err(e) => {
                warn!("Share failed: {}", e);
                ShareOutcome::failed(trigger, &e)
            }
        }
    }

    async fn try_share(&mut self) -> Result<usize, ShareError> {
        let tabs = self
            .tabs
            .list_tabs()
            .await
            .map_err(|e| ShareError::Browser(e.to_string()))?;

        let valid: Vec<TabTarget> = tabs
            .into_iter()
            .filter(|tab| !is_privileged_url(&tab.url))
            .collect();
        debug!("Extracting {} tab(s)", valid.len());

        // Concurrent fan-out; one tab's failure never aborts the batch
        let extractions = valid.iter().map(|tab| {
            let tabs = Arc::clone(&self.tabs);
            async move { Self::snapshot_tab(tabs.as_ref(), tab).await }
        });
        let snapshots: Vec<TabSnapshot> = futures::future::join_all(extractions)
            .await
            .into_iter()
            .flatten()
            .collect();

        if snapshots.is_empty() {
            return Err(ShareError::NoContent);
        }

        let count = snapshots.len();
        self.client
            .send(&SharePayload {
                tabs_data: snapshots,
            })
            .await?;

        self.prefs
            .set_last_shared(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

        Ok(count)
    }

    /// Extract one tab, mapping every failure to `None`.
    async fn snapshot_tab(tabs: &dyn TabProvider, tab: &TabTarget) -> Option<TabSnapshot> {
        let html = match tabs.page_html(tab).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Error extracting content for tab {}: {}", tab.url, e);
                return None;
            }
        };
        if html.trim().is_empty() {
            warn!("No content extracted for tab {}", tab.url);
            return None;
        }

        Some(TabSnapshot {
            title: tab.title.clone(),
            url: tab.url.clone(),
            content: extract::extract_content(&html, &tab.url),
        })
    }

    /// Lightweight summary of the foreground tab.
    pub async fn page_info(&self) -> Result<PageInfo, String> {
        let tabs = self.tabs.list_tabs().await.map_err(|e| e.to_string())?;
        let tab = tabs
            .iter()
            .find(|tab| !is_privileged_url(&tab.url))
            .ok_or_else(|| "no shareable tab open".to_string())?;

        let html = self.tabs.page_html(tab).await.map_err(|e| e.to_string())?;
        Ok(extract::page_info(&html, &tab.url))
    }

    /// The preference record (for status rendering and tests).
    pub fn preferences(&self) -> &Preferences {
        self.prefs.preferences()
    }
}
