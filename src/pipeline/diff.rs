//! Diff calculation against the known-state.
//!
//! An entry is new when its `(account_name, character_name)` identity has
//! never been recorded. New identities are recorded as soon as they are seen,
//! so a character listed twice in one snapshot is reported once.

use crate::models::LadderEntry;
use crate::storage::KnownState;

/// Computes which entries of a snapshot are new.
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    /// Lowercased account filter
    target_account: Option<String>,
}

impl DiffEngine {
    /// Diff engine with an optional account filter.
    pub fn new(target_account: Option<&str>) -> Self {
        Self {
            target_account: target_account.map(str::to_lowercase),
        }
    }

    /// Diff engine that archives the whole ladder.
    pub fn full_ladder() -> Self {
        Self::new(None)
    }

    /// Diff engine that only looks at one account.
    pub fn for_account(account: &str) -> Self {
        Self::new(Some(account))
    }

    /// Whether the entry passes the account filter.
    pub fn matches(&self, entry: &LadderEntry) -> bool {
        match &self.target_account {
            Some(target) => entry.account_name.to_lowercase() == *target,
            None => true,
        }
    }

    /// Return the new entries in input order and record them in `known`.
    pub fn diff(&self, current: &[LadderEntry], known: &mut KnownState) -> Vec<LadderEntry> {
        current
            .iter()
            .filter(|entry| self.matches(entry))
            .filter(|entry| known.record(entry))
            .cloned()
            .collect()
    }
}

/// Convenience function to diff a snapshot.
pub fn diff_entries(
    current: &[LadderEntry],
    known: &mut KnownState,
    target_account: Option<&str>,
) -> Vec<LadderEntry> {
    DiffEngine::new(target_account).diff(current, known)
}
