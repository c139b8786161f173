//! Diagnostic tracing and transcript logging to disk.
//!
//! The terminal belongs to the UI, so diagnostics go to a file or nowhere.
//! Transcripts, when enabled, are written to daily files per channel named
//! `<channel>_<date>.log` in the configured directory
//! (default: `~/.local/share/bcastchat/logs/`).

use crate::config::LoggingConfig;
use crate::session::TranscriptEntry;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Install the global subscriber. Without a path nothing is recorded.
/// `RUST_LOG` takes precedence over `verbosity`.
pub fn init_tracing(log_path: Option<&Path>, verbosity: u8) -> Result<()> {
    let Some(path) = log_path else {
        return Ok(());
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;
    Ok(())
}

fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Writes transcript entries to per-channel daily log files.
///
/// File handles are cached for the lifetime of the logger. A file that cannot
/// be opened is reported once and its entries are skipped.
pub struct ChatLogger {
    enabled: bool,
    log_dir: PathBuf,
    file_handles: HashMap<String, Option<fs::File>>,
}

impl ChatLogger {
    pub fn new(config: &LoggingConfig) -> Self {
        Self {
            enabled: config.enabled,
            log_dir: expand_home(&config.log_dir),
            file_handles: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The line [`log_line`](Self::log_line) expects for `entry`.
    pub fn format_line(entry: &TranscriptEntry) -> String {
        entry.plain_line(LOG_TIMESTAMP_FORMAT)
    }

    /// Append one line to the channel's file for today. No-op when disabled.
    pub fn log_line(&mut self, channel: &str, line: &str) {
        if !self.enabled {
            return;
        }

        let date = chrono::Local::now().format("%Y-%m-%d").to_string();
        let filename = format!("{}_{}.log", sanitize(channel), date);
        let log_dir = &self.log_dir;

        let handle = self.file_handles.entry(filename).or_insert_with_key(|filename| {
            let path = log_dir.join(filename);
            let opened = fs::create_dir_all(log_dir).and_then(|_| {
                OpenOptions::new().create(true).append(true).open(&path)
            });
            match opened {
                Ok(file) => Some(file),
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "cannot open transcript log");
                    None
                }
            }
        });

        if let Some(file) = handle {
            if let Err(e) = writeln!(file, "{}", line) {
                tracing::warn!(channel, error = %e, "transcript log write failed");
            }
        }
    }
}

/// Keep only characters that are safe in a file name.
fn sanitize(target: &str) -> String {
    target
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn expand_home(dir: &str) -> PathBuf {
    match dir.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(dir)),
        None => PathBuf::from(dir),
    }
}
