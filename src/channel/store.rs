//! Channel state store and snapshot persistence.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::channel::record::{ChannelRecord, ChannelStatus};
use crate::config::schema::ChannelConfig;

/// Errors returned by a channel store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("channel #{0} not found")]
    NotFound(i64),

    #[error("snapshot IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// Persistence boundary for channel records.
///
/// Status writes must be idempotent: writing the current status again is
/// allowed and has no further effect.
pub trait ChannelStore: Send + Sync {
    /// Fetch a channel by id.
    fn get(&self, id: i64) -> Option<ChannelRecord>;

    /// All channels, ordered by id.
    fn list(&self) -> Vec<ChannelRecord>;

    /// Set the status of a channel.
    fn update_channel_status(&self, id: i64, status: ChannelStatus) -> Result<(), StoreError>;
}

/// A thread-safe in-process channel store.
#[derive(Clone, Default)]
pub struct InMemoryChannelStore {
    inner: Arc<DashMap<i64, ChannelRecord>>,
    snapshot_path: Option<String>,
}

impl InMemoryChannelStore {
    /// Create a new empty store.
    pub fn new(snapshot_path: Option<String>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            snapshot_path,
        }
    }

    /// Seed the store from configured channels.
    ///
    /// When a snapshot file exists, its statuses override the configured
    /// ones for channels that are still configured.
    pub fn from_config(
        channels: &[ChannelConfig],
        snapshot_path: Option<String>,
    ) -> Result<Self, StoreError> {
        let store = Self::new(snapshot_path);
        for channel in channels {
            store.insert(ChannelRecord::from(channel));
        }

        if let Some(path) = &store.snapshot_path {
            if Path::new(path).exists() {
                let file = File::open(path)?;
                let statuses: HashMap<i64, ChannelStatus> =
                    serde_json::from_reader(BufReader::new(file))?;

                let mut restored = 0;
                for (id, status) in statuses {
                    if let Some(mut record) = store.inner.get_mut(&id) {
                        record.status = status;
                        restored += 1;
                    }
                }
                tracing::info!(path = %path, restored, "Restored channel statuses from snapshot");
            }
        }

        tracing::info!(channels = store.inner.len(), "Channel store ready");
        Ok(store)
    }

    /// Insert or replace a channel record.
    pub fn insert(&self, record: ChannelRecord) {
        self.inner.insert(record.id, record);
    }

    /// Save channel statuses to the snapshot file, if configured.
    pub fn save_to_file(&self) -> Result<(), StoreError> {
        if let Some(path) = &self.snapshot_path {
            let file = File::create(path)?;
            let writer = BufWriter::new(file);

            let statuses: HashMap<i64, ChannelStatus> = self
                .inner
                .iter()
                .map(|r| (*r.key(), r.value().status))
                .collect();

            serde_json::to_writer(writer, &statuses)?;
            tracing::info!(path = %path, channels = statuses.len(), "Saved channel snapshot");
        }
        Ok(())
    }

    /// Count channels per status: (enabled, auto_disabled, manually_disabled).
    pub fn summary(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for r in self.inner.iter() {
            match r.value().status {
                ChannelStatus::Enabled => counts.0 += 1,
                ChannelStatus::AutoDisabled => counts.1 += 1,
                ChannelStatus::ManuallyDisabled => counts.2 += 1,
            }
        }
        counts
    }
}

impl ChannelStore for InMemoryChannelStore {
    fn get(&self, id: i64) -> Option<ChannelRecord> {
        self.inner.get(&id).map(|r| r.value().clone())
    }

    fn list(&self) -> Vec<ChannelRecord> {
        let mut channels: Vec<_> = self.inner.iter().map(|r| r.value().clone()).collect();
        channels.sort_by_key(|c| c.id);
        channels
    }

    fn update_channel_status(&self, id: i64, status: ChannelStatus) -> Result<(), StoreError> {
        let mut record = self.inner.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if record.status != status {
            tracing::debug!(channel_id = id, from = record.status.as_str(), to = status.as_str(), "Channel status updated");
            record.status = status;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::record::ChannelType;

    fn configs() -> Vec<ChannelConfig> {
        vec![
            ChannelConfig {
                id: 2,
                name: "backup".into(),
                channel_type: ChannelType::Anthropic,
                status: ChannelStatus::Enabled,
            },
            ChannelConfig {
                id: 1,
                name: "primary".into(),
                channel_type: ChannelType::OpenAi,
                status: ChannelStatus::Enabled,
            },
        ]
    }

    #[test]
    fn test_store_operations() {
        let store = InMemoryChannelStore::from_config(&configs(), None).unwrap();

        let ids: Vec<_> = store.list().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);

        store.update_channel_status(1, ChannelStatus::AutoDisabled).unwrap();
        assert_eq!(store.get(1).unwrap().status, ChannelStatus::AutoDisabled);

        // Writing the same status again is a no-op, not an error
        store.update_channel_status(1, ChannelStatus::AutoDisabled).unwrap();
        assert_eq!(store.summary(), (1, 1, 0));
    }

    #[test]
    fn test_unknown_channel() {
        let store = InMemoryChannelStore::new(None);
        let err = store.update_channel_status(42, ChannelStatus::Enabled).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(42)));
        assert!(store.get(42).is_none());
    }

    #[test]
    fn test_snapshot_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channels.json").to_string_lossy().to_string();

        let store = InMemoryChannelStore::from_config(&configs(), Some(path.clone())).unwrap();
        store.update_channel_status(2, ChannelStatus::ManuallyDisabled).unwrap();
        store.save_to_file().unwrap();

        // Load new instance; snapshot wins over configured status
        let loaded = InMemoryChannelStore::from_config(&configs(), Some(path)).unwrap();
        assert_eq!(loaded.get(2).unwrap().status, ChannelStatus::ManuallyDisabled);
        assert_eq!(loaded.get(1).unwrap().status, ChannelStatus::Enabled);
    }

    #[test]
    fn test_snapshot_ignores_unconfigured_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channels.json");
        std::fs::write(&path, r#"{"1":"auto_disabled","99":"auto_disabled"}"#).unwrap();

        let store = InMemoryChannelStore::from_config(
            &configs(),
            Some(path.to_string_lossy().to_string()),
        )
        .unwrap();
        assert_eq!(store.get(1).unwrap().status, ChannelStatus::AutoDisabled);
        assert!(store.get(99).is_none());
    }
}
