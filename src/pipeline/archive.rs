// src/pipeline/archive.rs

//! Write-once records for newly discovered characters.

use std::io;

use chrono::{DateTime, Local};

use crate::error::{AppError, Result};
use crate::models::LadderEntry;
use crate::storage::LocalStorage;
use crate::utils::sanitize_segment;

/// File holding the entry inside each record directory.
pub const ENTRY_FILE: &str = "character.json";

/// Prefix shared by every record directory.
pub const RECORD_PREFIX: &str = "new_character";

/// Give up after this many same-second collisions.
const MAX_DISAMBIGUATION: u32 = 1000;

/// Archiver for new ladder entries.
#[derive(Debug, Clone)]
pub struct EntryArchiver {
    storage: LocalStorage,
}

impl EntryArchiver {
    /// Archiver writing record directories under `archive_dir`.
    pub fn new(archive_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            storage: LocalStorage::new(archive_dir),
        }
    }

    /// Archive an entry discovered now. Returns the record identifier.
    pub async fn archive(&self, entry: &LadderEntry) -> Result<String> {
        self.archive_at(entry, Local::now()).await
    }

    /// Archive an entry discovered at `discovered_at`.
    ///
    /// An existing record with the same name is never reused: a numeric suffix
    /// is appended until a fresh directory can be claimed.
    pub async fn archive_at(
        &self,
        entry: &LadderEntry,
        discovered_at: DateTime<Local>,
    ) -> Result<String> {
        let base = record_name(entry, &discovered_at.format("%Y%m%d%H%M%S").to_string());

        let mut name = base.clone();
        let mut suffix = 0;
        while !self.storage.create_dir_new(&name).await? {
            suffix += 1;
            if suffix > MAX_DISAMBIGUATION {
                return Err(AppError::Io(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("no free record name for {base}"),
                )));
            }
            name = format!("{base}_{suffix}");
        }

        let key = format!("{name}/{ENTRY_FILE}");
        if let Err(e) = self.storage.write_json(&key, entry).await {
            // Leave no empty record behind.
            let _ = tokio::fs::remove_dir(self.storage.path(&name)).await;
            return Err(e);
        }

        log::info!("New character saved: {}", name);
        Ok(name)
    }

    /// Read back an archived entry.
    pub async fn load(&self, name: &str) -> Result<Option<LadderEntry>> {
        self.storage.read_json(&format!("{name}/{ENTRY_FILE}")).await
    }

    /// Identifiers of all archived records.
    pub async fn records(&self) -> Result<Vec<String>> {
        Ok(self
            .storage
            .list()
            .await?
            .into_iter()
            .filter(|n| n.starts_with(RECORD_PREFIX))
            .collect())
    }
}

/// Directory name for an entry discovered at `timestamp`.
pub fn record_name(entry: &LadderEntry, timestamp: &str) -> String {
    let fields = [
        entry.rank.as_str(),
        entry.account_name.as_str(),
        entry.character_name.as_str(),
        entry.character_class.as_str(),
        entry.level.as_str(),
        entry.status(),
        timestamp,
    ];

    let mut name = String::from(RECORD_PREFIX);
    for field in fields {
        name.push('_');
        name.push_str(&sanitize_segment(field));
    }
    name
}
