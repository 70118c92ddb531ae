//! Configuration file watcher for hot reload.
//!
//! Editors often truncate a file before writing it, and one save can raise
//! several events. An empty file and text identical to the last applied
//! config are both skipped, so each real edit is pushed at most once.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::parse_config;
use crate::config::schema::RelayConfig;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RelayConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RelayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();
        // The text the running server was started from.
        let mut applied = fs::read_to_string(&path).ok();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    if let Some(config) = reload(&path, &mut applied) {
                        if tx.send(config).is_err() {
                            tracing::debug!("Config receiver dropped, update discarded");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Re-read `path` and return the new config if it is valid and changed.
///
/// `applied` holds the text of the last config handed out and is updated
/// only when a new one is returned.
fn reload(path: &Path, applied: &mut Option<String>) -> Option<RelayConfig> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "Config file unreadable, keeping current configuration");
            return None;
        }
    };

    if text.trim().is_empty() {
        tracing::debug!("Config file empty, waiting for the write to finish");
        return None;
    }
    if applied.as_deref() == Some(text.as_str()) {
        return None;
    }

    match parse_config(&text) {
        Ok(config) => {
            tracing::info!(
                automatic_disable = config.channel_health.automatic_disable,
                automatic_enable = config.channel_health.automatic_enable,
                channels = config.channels.len(),
                "Config file change detected"
            );
            *applied = Some(text);
            Some(config)
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                "Failed to reload config. Keeping current configuration."
            );
            None
        }
    }
}
