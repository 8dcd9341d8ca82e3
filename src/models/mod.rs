// src/models/mod.rs

//! Domain models for the ladder watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod entry;
mod selectors;

// Re-export all public types
pub use config::{Config, ParserConfig, PathsConfig, SourceConfig, WatchConfig};
pub use entry::{Identity, LadderEntry, RawCell, RawRow};
pub use selectors::TableSelectors;
