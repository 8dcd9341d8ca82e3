//! Full ladder snapshots, one timestamped file per cycle.

use std::path::PathBuf;

use chrono::{DateTime, Local};

use crate::error::Result;
use crate::models::LadderEntry;
use crate::storage::LocalStorage;

/// Writes every parsed entry of a cycle to `ladder_data_<timestamp>.json`.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    storage: LocalStorage,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            storage: LocalStorage::new(dir),
        }
    }

    /// Write a snapshot taken now. Returns the full path written.
    pub async fn write(&self, entries: &[LadderEntry]) -> Result<PathBuf> {
        self.write_at(entries, Local::now()).await
    }

    pub async fn write_at(
        &self,
        entries: &[LadderEntry],
        taken_at: DateTime<Local>,
    ) -> Result<PathBuf> {
        let key = format!("ladder_data_{}.json", taken_at.format("%Y%m%d_%H%M%S"));
        self.storage.write_json(&key, entries).await?;
        Ok(self.storage.path(&key))
    }
}
