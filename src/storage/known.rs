//! Known-state: every character identity archived so far.
//!
//! The durable form is a JSON array of [`LadderEntry`] objects. Only
//! `account_name` and `character_name` matter for identity; the other fields
//! are the values seen when the character was first archived.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::Result;
use crate::models::{Identity, LadderEntry};
use crate::storage::LocalStorage;

/// In-memory known-set.
#[derive(Debug, Clone, Default)]
pub struct KnownState {
    entries: Vec<LadderEntry>,
    index: HashSet<Identity>,
}

impl KnownState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored records. Later duplicates of an identity are dropped.
    pub fn from_entries(entries: impl IntoIterator<Item = LadderEntry>) -> Self {
        let mut state = Self::new();
        for entry in entries {
            state.record(&entry);
        }
        state
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.index.contains(identity)
    }

    /// Register an entry. Returns `false` if its identity was already known.
    pub fn record(&mut self, entry: &LadderEntry) -> bool {
        if !self.index.insert(entry.identity()) {
            return false;
        }
        self.entries.push(entry.clone());
        true
    }

    /// Remove an identity so it is detected again on the next cycle.
    pub fn forget(&mut self, identity: &Identity) -> bool {
        if !self.index.remove(identity) {
            return false;
        }
        self.entries.retain(|e| e.identity() != *identity);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored records in discovery order.
    pub fn entries(&self) -> &[LadderEntry] {
        &self.entries
    }
}

/// Durable home of the [`KnownState`].
#[derive(Debug, Clone)]
pub struct KnownStateStore {
    storage: LocalStorage,
    key: String,
}

impl KnownStateStore {
    /// Store backed by the JSON file at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let key = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "characters.json".to_string());

        Self {
            storage: LocalStorage::new(root),
            key,
        }
    }

    /// Full path of the backing file.
    pub fn path(&self) -> PathBuf {
        self.storage.path(&self.key)
    }

    /// Load the known-state.
    ///
    /// A missing file is created empty. An unreadable or corrupt file yields an
    /// empty state; a corrupt file is moved aside first.
    pub async fn load(&self) -> KnownState {
        let bytes = match self.storage.read_bytes(&self.key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::info!("{} not found. Creating a new one.", self.path().display());
                let state = KnownState::new();
                if let Err(e) = self.flush(&state).await {
                    log::error!(
                        "Failed to create {}: {}. Continuing in memory.",
                        self.path().display(),
                        e
                    );
                }
                return state;
            }
            Err(e) => {
                log::error!(
                    "Failed to read {}: {}. Starting with an empty state.",
                    self.path().display(),
                    e
                );
                return KnownState::new();
            }
        };

        match serde_json::from_slice::<Vec<LadderEntry>>(&bytes) {
            Ok(entries) => {
                let state = KnownState::from_entries(entries);
                log::info!(
                    "Loaded {} known characters from {}",
                    state.len(),
                    self.path().display()
                );
                state
            }
            Err(e) => {
                log::error!(
                    "Error decoding {}: {}. Starting with an empty state.",
                    self.path().display(),
                    e
                );
                self.preserve_corrupt().await;
                KnownState::new()
            }
        }
    }

    /// Read the known-state as is, without creating or repairing anything.
    pub async fn read(&self) -> Result<Option<KnownState>> {
        Ok(self
            .storage
            .read_json::<Vec<LadderEntry>>(&self.key)
            .await?
            .map(KnownState::from_entries))
    }

    /// Rewrite the whole known-set.
    pub async fn flush(&self, state: &KnownState) -> Result<()> {
        self.storage.write_json(&self.key, state.entries()).await
    }

    /// Move a corrupt file aside so the next flush does not destroy it.
    async fn preserve_corrupt(&self) {
        let backup = format!(
            "{}.corrupt-{}",
            self.key,
            Local::now().format("%Y%m%d%H%M%S")
        );
        match self.storage.rename(&self.key, &backup).await {
            Ok(()) => log::warn!(
                "Corrupt known-state kept as {}",
                self.storage.path(&backup).display()
            ),
            Err(e) => log::warn!("Could not keep corrupt known-state: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_entry(account: &str, character: &str) -> LadderEntry {
        LadderEntry {
            rank: "1".into(),
            account_name: account.into(),
            character_name: character.into(),
            character_class: "Witch".into(),
            level: "90".into(),
            experience: "1.0e9".into(),
            is_dead: false,
        }
    }

    #[test]
    fn test_record_is_idempotent() {
        let mut state = KnownState::new();
        assert!(state.record(&make_entry("Foo", "Bar")));
        assert!(!state.record(&make_entry("Foo", "Bar")));
        assert_eq!(state.len(), 1);
        assert!(state.contains(&Identity::new("Foo", "Bar")));
    }

    #[test]
    fn test_from_entries_dedupes() {
        let state = KnownState::from_entries(vec![
            make_entry("Foo", "Bar"),
            make_entry("Foo", "Baz"),
            make_entry("Foo", "Bar"),
        ]);
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_forget() {
        let mut state = KnownState::from_entries(vec![make_entry("Foo", "Bar")]);
        assert!(state.forget(&Identity::new("Foo", "Bar")));
        assert!(!state.forget(&Identity::new("Foo", "Bar")));
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_creates_empty_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("characters.json");
        let store = KnownStateStore::new(&path);

        let state = store.load().await;
        assert!(state.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "[]");
    }

    #[tokio::test]
    async fn test_flush_then_load() {
        let tmp = TempDir::new().unwrap();
        let store = KnownStateStore::new(tmp.path().join("characters.json"));

        let mut state = KnownState::new();
        state.record(&make_entry("Foo", "Bar"));
        store.flush(&state).await.unwrap();

        let loaded = store.load().await;
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains(&Identity::new("Foo", "Bar")));
    }

    #[tokio::test]
    async fn test_file_is_json_array_of_objects() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("characters.json");
        let store = KnownStateStore::new(&path);

        let state = KnownState::from_entries(vec![make_entry("Foo", "Bar")]);
        store.flush(&state).await.unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["account_name"], "Foo");
        assert_eq!(records[0]["character_name"], "Bar");
    }

    #[tokio::test]
    async fn test_corrupt_file_resets_and_is_preserved() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("characters.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = KnownStateStore::new(&path);

        let state = store.load().await;
        assert!(state.is_empty());
        assert!(!path.exists());

        let backups: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_string_lossy()
                    .starts_with("characters.json.corrupt-")
            })
            .collect();
        assert_eq!(backups.len(), 1);
    }

    #[tokio::test]
    async fn test_read_has_no_side_effects() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("characters.json");
        let store = KnownStateStore::new(&path);

        assert!(store.read().await.unwrap().is_none());
        assert!(!path.exists());

        std::fs::write(&path, "garbage").unwrap();
        assert!(store.read().await.is_err());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_loads_records_from_older_format() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("characters.json");
        std::fs::write(
            &path,
            r#"[{"rank":"3","account_name":"Foo","character_name":"Bar","class":"Witch","level":"90","experience":"1","status":"alive"}]"#,
        )
        .unwrap();

        let state = KnownStateStore::new(&path).load().await;
        assert!(state.contains(&Identity::new("Foo", "Bar")));
    }

    #[test]
    fn test_relative_file_name_uses_current_dir() {
        let store = KnownStateStore::new("characters.json");
        assert_eq!(store.path(), PathBuf::from("./characters.json"));
    }
}
