//! Configuration data model.
//!
//! All structs derive `Serialize`/`Deserialize` for TOML persistence.
//! Every field has a default so the client starts without a config file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::username::generate_username;
use crate::client::loopback::DEFAULT_MAX_PAYLOAD;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name attached to every outgoing message.
    #[serde(default = "generate_username")]
    pub username: String,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            username: generate_username(),
            ui: UiConfig::default(),
            logging: LoggingConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

/// UI appearance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// `chrono` format string for the sent/received stamps.
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
    /// Transcript entries kept per channel; 0 keeps everything.
    #[serde(default)]
    pub max_transcript: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            timestamp_format: default_timestamp_format(),
            max_transcript: 0,
        }
    }
}

/// Transcript logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_dir: default_log_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Largest wire payload the transport accepts.
    #[serde(default = "default_max_payload_size")]
    pub max_payload_size: usize,
    /// Where joined channels are remembered between runs.
    #[serde(default = "default_state_file")]
    pub state_file: Option<PathBuf>,
    #[serde(default)]
    pub admin_key: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_payload_size: default_max_payload_size(),
            state_file: default_state_file(),
            admin_key: None,
        }
    }
}

fn default_timestamp_format() -> String {
    "%-I:%M:%S %P".to_string()
}
fn default_log_dir() -> String {
    "~/.local/share/bcastchat/logs".to_string()
}
fn default_state_file() -> Option<PathBuf> {
    Some(
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bcastchat")
            .join("channels.txt"),
    )
}
fn default_max_payload_size() -> usize {
    DEFAULT_MAX_PAYLOAD
}
