//! Daemon configuration.
//!
//! Loads configuration from a TOML file and provides runtime defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub sharing: SharingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Control socket path
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            socket_path: default_socket_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chrome DevTools debugging endpoint
    #[serde(default = "default_debug_endpoint")]
    pub debug_endpoint: String,

    /// Interval between target-list polls, in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_endpoint: default_debug_endpoint(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharingConfig {
    /// Endpoint receiving share payloads
    #[serde(default = "default_ingest_endpoint")]
    pub ingest_endpoint: String,

    /// Delay between a tab event and the automatic share it schedules,
    /// in milliseconds, letting dynamic page content finish rendering
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            ingest_endpoint: default_ingest_endpoint(),
            settle_delay_ms: default_settle_delay(),
        }
    }
}

// Default value functions for serde
fn default_log_level() -> String {
    "info".to_string()
}

fn default_socket_path() -> PathBuf {
    PathBuf::from("/tmp/tabshare-ctl.sock")
}

fn default_debug_endpoint() -> String {
    "http://localhost:9222".to_string()
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_ingest_endpoint() -> String {
    "http://localhost:5000/active_tab".to_string()
}

fn default_settle_delay() -> u64 {
    1000
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Self {
        Self::load_from_path(Self::default_config_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: PathBuf) -> Self {
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file found at {:?}, using defaults", path);
                Self::default()
            }
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tabshare")
            .join("config.toml")
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: PathBuf) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

        std::fs::write(&path, contents)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sharing.ingest_endpoint, "http://localhost:5000/active_tab");
        assert_eq!(config.browser.debug_endpoint, "http://localhost:9222");
        assert_eq!(config.sharing.settle_delay_ms, 1000);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[general]
log_level = "debug"

[browser]
debug_endpoint = "http://localhost:9333"

[sharing]
ingest_endpoint = "http://localhost:8080/tabs"
settle_delay_ms = 250
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.browser.debug_endpoint, "http://localhost:9333");
        assert_eq!(config.sharing.ingest_endpoint, "http://localhost:8080/tabs");
        assert_eq!(config.sharing.settle_delay_ms, 250);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.sharing.settle_delay_ms = 2500;
        config.save_to_path(path.clone()).unwrap();

        let reloaded = Config::load_from_path(path);
        assert_eq!(reloaded.sharing.settle_delay_ms, 2500);
    }
}
