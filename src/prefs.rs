//! Durable preference store.
//!
//! Holds the auto-share flag and the last successful share timestamp in a
//! JSON file under the user config directory. Only the coordinator mutates
//! the store; readers observe changes through a watch subscription instead
//! of ambient globals.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{info, warn};

/// The durable preference record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preferences {
    /// Whether shares are triggered automatically by tab events
    #[serde(rename = "autoShareEnabled", default)]
    pub auto_share_enabled: bool,

    /// RFC 3339 timestamp of the last successful share
    #[serde(
        rename = "lastShared",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_shared: Option<String>,
}

impl Preferences {
    /// Load preferences from a file, falling back to defaults when the file
    /// is missing or unreadable.
    pub fn load_from_path(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(prefs) => prefs,
                Err(e) => {
                    warn!("Failed to parse preference file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Parse the last-shared timestamp, if present and well formed.
    pub fn last_shared_time(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.last_shared
            .as_deref()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&chrono::Utc))
    }
}

/// Preference store owned by the coordinator.
pub struct PrefStore {
    path: PathBuf,
    current: Preferences,
    tx: watch::Sender<Preferences>,
}

impl PrefStore {
    /// Open the store at a specific path, loading any existing record.
    pub fn open(path: PathBuf) -> Self {
        let current = Preferences::load_from_path(&path);
        info!(
            "Preferences loaded from {:?} (auto-share: {})",
            path, current.auto_share_enabled
        );
        let (tx, _) = watch::channel(current.clone());
        Self { path, current, tx }
    }

    /// Open the store at the default location.
    pub fn open_default() -> Self {
        Self::open(Self::default_path())
    }

    /// Default preference file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tabshare")
            .join("preferences.json")
    }

    /// Current record.
    pub fn preferences(&self) -> &Preferences {
        &self.current
    }

    /// Subscribe to preference changes.
    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.tx.subscribe()
    }

    /// Set the auto-share flag, persist, and notify subscribers.
    pub fn set_auto_share(&mut self, enabled: bool) {
        self.current.auto_share_enabled = enabled;
        self.commit();
    }

    /// Record the time of a successful share, persist, and notify.
    pub fn set_last_shared(&mut self, timestamp: String) {
        self.current.last_shared = Some(timestamp);
        self.commit();
    }

    /// Notify subscribers and write the record out. Write failures are
    /// logged, not surfaced.
    fn commit(&mut self) {
        self.tx.send_replace(self.current.clone());

        if let Err(e) = self.save() {
            warn!("Failed to persist preferences to {:?}: {}", self.path, e);
        }
    }

    fn save(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.current)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(&self.path, contents)
    }
}
