//! Storage for watcher state.
//!
//! ## Directory Structure
//!
//! ```text
//! characters.json                 # Known-state: every archived identity
//! new_characters/                 # One immutable record per new character
//! └── new_character_<rank>_<account>_<character>_<class>_<level>_<status>_<ts>/
//!     └── character.json
//! ladder_data/                    # Optional full ladder snapshots
//! └── ladder_data_<YYYYmmdd_HHMMSS>.json
//! ```

pub mod known;
pub mod local;

// Re-export for convenience
pub use known::{KnownState, KnownStateStore};
pub use local::LocalStorage;
