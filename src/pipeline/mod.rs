//! The observe → parse → diff → persist cycle.
//!
//! - `parse`: Raw table rows into ladder entries
//! - `diff`: New entries relative to the known-state
//! - `archive`: Write-once records for new entries
//! - `snapshot`: Optional full ladder snapshots
//! - `watch`: The poll scheduler tying it together

pub mod archive;
pub mod diff;
pub mod parse;
pub mod snapshot;
pub mod watch;

pub use archive::{EntryArchiver, record_name};
pub use diff::{DiffEngine, diff_entries};
pub use parse::{ParseFailure, RowParser, parse_row};
pub use snapshot::SnapshotWriter;
pub use watch::{CycleOutcome, CycleReport, WatchState, WatchSummary, Watcher};
