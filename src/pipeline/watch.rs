// src/pipeline/watch.rs

//! Poll scheduler.
//!
//! One cycle is fetch → parse → diff → archive → persist, followed by a sleep.
//!
//! - A fetch failure abandons the cycle: nothing is diffed or persisted.
//! - A row that fails to parse is skipped; the rest of the cycle continues.
//! - Archive and flush failures are logged; the in-memory known-state carries
//!   forward to the next cycle.
//!
//! The page source is owned by the [`Watcher`] and closed exactly once when it
//! stops, whether by interrupt or by reaching the cycle limit.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{Config, RawRow, WatchConfig};
use crate::pipeline::{DiffEngine, EntryArchiver, RowParser, SnapshotWriter};
use crate::services::{LadderSource, build_source};
use crate::storage::{KnownState, KnownStateStore};

/// Where the watcher currently is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Fetching,
    Parsing,
    Diffing,
    Archiving,
    Persisting,
    Sleeping,
    Stopped,
}

/// Counters for one completed cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Rows returned by the page source
    pub rows: usize,
    /// Rows parsed into entries
    pub parsed: usize,
    /// Rows skipped because they failed to parse
    pub parse_failures: usize,
    /// Entries passing the account filter
    pub matched: usize,
    /// Entries whose identity was not known before this cycle
    pub new_entries: usize,
    /// New entries written to the archive
    pub archived: usize,
    /// New entries that could not be archived
    pub archive_failures: usize,
    /// Known-state size after the cycle
    pub known_count: usize,
    /// Whether the known-state was written to disk
    pub flushed: bool,
    /// Full ladder snapshot written this cycle
    pub snapshot: Option<PathBuf>,
}

/// Result of one cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    Completed(CycleReport),
    FetchFailed(AppError),
}

/// Totals over a whole watch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub cycles: u64,
    pub failed_fetches: u64,
    pub archived: usize,
    pub known_count: usize,
}

impl WatchSummary {
    fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles += 1;
        match outcome {
            CycleOutcome::Completed(report) => self.archived += report.archived,
            CycleOutcome::FetchFailed(_) => self.failed_fetches += 1,
        }
    }
}

/// Drives the observe → parse → diff → persist cycle.
pub struct Watcher {
    config: WatchConfig,
    source: Box<dyn LadderSource>,
    parser: RowParser,
    diff: DiffEngine,
    store: KnownStateStore,
    known: KnownState,
    archiver: EntryArchiver,
    snapshots: Option<SnapshotWriter>,
    state: WatchState,
    consecutive_failures: u32,
    closed: bool,
}

impl Watcher {
    /// Build the page source from configuration and load the known-state.
    ///
    /// Fails only if the page source cannot be constructed.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let source = build_source(&config.source)?;
        Ok(Self::new(config, source).await)
    }

    /// Create a watcher around an existing page source.
    pub async fn new(config: &Config, source: Box<dyn LadderSource>) -> Self {
        let store = KnownStateStore::new(&config.paths.known_file);
        let known = store.load().await;

        Self {
            config: config.watch.clone(),
            source,
            parser: RowParser::new(config.parser.clone()),
            diff: DiffEngine::new(config.watch.target_account.as_deref()),
            store,
            known,
            archiver: EntryArchiver::new(&config.paths.archive_dir),
            snapshots: config.paths.snapshot_dir.as_ref().map(SnapshotWriter::new),
            state: WatchState::Idle,
            consecutive_failures: 0,
            closed: false,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn known(&self) -> &KnownState {
        &self.known
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Delay before the next cycle.
    pub fn sleep_duration(&self) -> Duration {
        self.config.sleep_duration(self.consecutive_failures)
    }

    /// Run a single cycle.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let fetched = self.fetch().await;
        self.complete_cycle(fetched).await
    }

    /// Fetch the current rows. The only cancellable step of a cycle.
    async fn fetch(&mut self) -> Result<Vec<RawRow>> {
        self.state = WatchState::Fetching;
        self.source.fetch_rows().await
    }

    /// Parse, diff, archive and persist fetched rows.
    ///
    /// Runs to completion once started so an archived entry is always flushed
    /// to the known-state in the same cycle.
    async fn complete_cycle(&mut self, fetched: Result<Vec<RawRow>>) -> CycleOutcome {
        let rows = match fetched {
            Ok(rows) => rows,
            Err(e) => {
                log::error!(
                    "Failed to fetch the ladder from {}: {}",
                    self.source.describe(),
                    e
                );
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                self.state = WatchState::Sleeping;
                return CycleOutcome::FetchFailed(e);
            }
        };
        self.consecutive_failures = 0;
        log::info!("Found {} rows in the ladder.", rows.len());

        self.state = WatchState::Parsing;
        let mut report = CycleReport {
            rows: rows.len(),
            ..CycleReport::default()
        };
        let mut entries = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            match self.parser.parse(row) {
                Ok(entry) => entries.push(entry),
                Err(failure) => {
                    report.parse_failures += 1;
                    log::warn!(
                        "Skipping row {} [{}]: {}",
                        index + 1,
                        failure.reason(),
                        failure
                    );
                }
            }
        }
        report.parsed = entries.len();

        for entry in entries.iter().filter(|e| self.diff.matches(e)) {
            report.matched += 1;
            log::debug!("Matched {}", entry);
        }

        self.state = WatchState::Diffing;
        let new_entries = self.diff.diff(&entries, &mut self.known);
        report.new_entries = new_entries.len();

        self.state = WatchState::Archiving;
        for entry in &new_entries {
            log::info!("New character found: {}", entry);
            match self.archiver.archive(entry).await {
                Ok(_) => report.archived += 1,
                Err(e) => {
                    report.archive_failures += 1;
                    self.known.forget(&entry.identity());
                    log::error!(
                        "Failed to archive {}: {}. It will be retried next cycle.",
                        entry.identity(),
                        e
                    );
                }
            }
        }

        self.state = WatchState::Persisting;
        if let Some(writer) = &self.snapshots {
            if entries.is_empty() {
                log::warn!("No characters found during this scrape.");
            } else {
                match writer.write(&entries).await {
                    Ok(path) => {
                        log::info!("Saved ladder snapshot to {}", path.display());
                        report.snapshot = Some(path);
                    }
                    Err(e) => log::error!("Failed to save ladder snapshot: {}", e),
                }
            }
        }

        match self.store.flush(&self.known).await {
            Ok(()) => report.flushed = true,
            Err(e) => log::error!(
                "Failed to save known-state to {}: {}",
                self.store.path().display(),
                e
            ),
        }
        report.known_count = self.known.len();

        self.state = WatchState::Sleeping;
        log::info!(
            "Cycle done: {} rows, {} parsed, {} skipped, {} matched, {} new, {} archived, {} known",
            report.rows,
            report.parsed,
            report.parse_failures,
            report.matched,
            report.new_entries,
            report.archived,
            report.known_count
        );
        CycleOutcome::Completed(report)
    }

    /// Run cycles until `shutdown` resolves or `max_cycles` have run.
    ///
    /// `shutdown` is only observed while fetching or sleeping. A cycle whose
    /// rows have arrived always finishes archiving and persisting first.
    pub async fn run<F>(mut self, shutdown: F, max_cycles: Option<u64>) -> WatchSummary
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut summary = WatchSummary::default();
        let limit_reached = |s: &WatchSummary| max_cycles.is_some_and(|max| s.cycles >= max);

        log::info!("Watching {}", self.source.describe());
        while !limit_reached(&summary) {
            let fetched = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    log::info!("Interrupted by user.");
                    break;
                }
                fetched = self.fetch() => fetched,
            };
            let outcome = self.complete_cycle(fetched).await;
            summary.record(&outcome);
            if limit_reached(&summary) {
                break;
            }

            let delay = self.sleep_duration();
            log::info!("Waiting for {} seconds before next check.", delay.as_secs());
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    log::info!("Interrupted by user.");
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.shutdown().await;
        summary.known_count = self.known.len();
        summary
    }

    /// Release the page source. Safe to call more than once.
    ///
    /// A watcher dropped without this call, for example while unwinding from
    /// a panic, still drops its source; see [`LadderSource::close`].
    pub async fn shutdown(&mut self) {
        self.state = WatchState::Stopped;
        if self.closed {
            return;
        }
        self.closed = true;
        match self.source.close().await {
            Ok(()) => log::info!("Page source closed."),
            Err(e) => log::error!("Failed to close page source: {}", e),
        }
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        if !self.closed {
            log::warn!(
                "Watcher dropped before shutdown; releasing {} without close",
                self.source.describe()
            );
        }
    }
}
