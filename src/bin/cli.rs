//! Ladder watcher CLI
//!
//! Polls a leaderboard page and archives every character seen for the first
//! time.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use ladder_watch::{
    error::Result,
    models::Config,
    pipeline::{CycleOutcome, EntryArchiver, Watcher},
    storage::KnownStateStore,
};

/// ladder-watch - Leaderboard new character tracker
#[derive(Parser, Debug)]
#[command(
    name = "ladder-watch",
    version,
    about = "Watches a leaderboard and archives newly seen characters"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "ladder.toml", global = true)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Overrides applied on top of the configuration file.
#[derive(Args, Debug)]
struct SourceArgs {
    /// Only archive characters of this account (case-insensitive)
    #[arg(long, env = "POE_ACCOUNT")]
    account: Option<String>,

    /// Ladder page URL
    #[arg(long, env = "POE_LADDER_PAGE")]
    page_url: Option<String>,

    /// Read the ladder from a saved HTML page instead
    #[arg(long)]
    html_file: Option<PathBuf>,

    /// Seconds between checks
    #[arg(long)]
    interval: Option<u64>,
}

impl SourceArgs {
    fn apply(self, config: &mut Config) {
        if let Some(account) = self.account {
            config.watch.target_account = Some(account);
        }
        if let Some(url) = self.page_url {
            config.source.page_url = Some(url);
        }
        if let Some(path) = self.html_file {
            config.source.html_file = Some(path);
        }
        if let Some(interval) = self.interval {
            config.watch.interval_secs = interval;
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the ladder until interrupted
    Watch {
        #[command(flatten)]
        source: SourceArgs,

        /// Stop after this many cycles
        #[arg(long)]
        max_cycles: Option<u64>,
    },

    /// Run a single cycle and exit
    Once {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Validate the configuration
    Validate {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show known-state and archive info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Resolves when the user presses Ctrl+C.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Load the configuration file, apply overrides and validate the result.
fn prepare_config(path: &Path, source: SourceArgs) -> Result<Config> {
    let mut config = Config::load_or_default(path);
    source.apply(&mut config);

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    Ok(config)
}

/// Build the watcher, logging initialization failures.
async fn start_watcher(config: &Config) -> Result<Watcher> {
    Watcher::from_config(config).await.inspect_err(|e| {
        log::error!("Could not start the page source: {}", e);
    })
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Watch { source, max_cycles } => {
            let config = prepare_config(&cli.config, source)?;
            log::info!("Starting ladder watcher. Press Ctrl+C to stop.");
            if let Some(account) = &config.watch.target_account {
                log::info!("Watching account: {}", account);
            }

            let watcher = start_watcher(&config).await?;
            let summary = watcher.run(interrupted(), max_cycles).await;

            log::info!(
                "Stopped after {} cycles ({} failed fetches): {} new characters archived, {} known",
                summary.cycles,
                summary.failed_fetches,
                summary.archived,
                summary.known_count
            );
        }

        Command::Once { source } => {
            let config = prepare_config(&cli.config, source)?;
            let mut watcher = start_watcher(&config).await?;
            let outcome = watcher.run_cycle().await;
            watcher.shutdown().await;

            if let CycleOutcome::FetchFailed(e) = outcome {
                return Err(e);
            }
        }

        Command::Validate { source } => {
            log::info!("Validating configuration...");
            prepare_config(&cli.config, source)?;
            log::info!("✓ Config OK");
        }

        Command::Info => {
            let config = Config::load_or_default(&cli.config);
            let store = KnownStateStore::new(&config.paths.known_file);

            match store.read().await {
                Ok(Some(known)) => log::info!(
                    "Known characters: {} ({})",
                    known.len(),
                    store.path().display()
                ),
                Ok(None) => log::info!("No known-state found at {}", store.path().display()),
                Err(e) => log::error!(
                    "Known-state at {} is unreadable: {}",
                    store.path().display(),
                    e
                ),
            }

            let archiver = EntryArchiver::new(&config.paths.archive_dir);
            let records = archiver.records().await?;
            log::info!(
                "Archived new characters: {} ({})",
                records.len(),
                config.paths.archive_dir
            );
        }
    }

    Ok(())
}
