//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::TableSelectors;
use crate::utils::parse_selector;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Where ladder rows come from
    #[serde(default)]
    pub source: SourceConfig,

    /// Polling behavior and account filter
    #[serde(default)]
    pub watch: WatchConfig,

    /// Row parsing rules
    #[serde(default)]
    pub parser: ParserConfig,

    /// Durable state locations
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        match (&self.source.page_url, &self.source.html_file) {
            (None, None) => {
                return Err(AppError::validation(
                    "source.page_url or source.html_file must be set",
                ));
            }
            (Some(url), _) => {
                url::Url::parse(url)?;
            }
            _ => {}
        }
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        for (_, selector) in self.source.selectors.named() {
            parse_selector(selector)?;
        }
        if self.watch.interval_secs == 0 {
            return Err(AppError::validation("watch.interval_secs must be > 0"));
        }
        if self
            .watch
            .target_account
            .as_deref()
            .is_some_and(|a| a.trim().is_empty())
        {
            return Err(AppError::validation("watch.target_account is empty"));
        }
        if self.parser.dead_token.is_empty() {
            return Err(AppError::validation("parser.dead_token is empty"));
        }
        if self.paths.known_file.trim().is_empty() {
            return Err(AppError::validation("paths.known_file is empty"));
        }
        if !names_a_file(&self.paths.known_file) {
            return Err(AppError::validation(format!(
                "paths.known_file must name a file: {}",
                self.paths.known_file
            )));
        }
        if self.paths.archive_dir.trim().is_empty() {
            return Err(AppError::validation("paths.archive_dir is empty"));
        }
        Ok(())
    }
}

/// Whether `path` ends in a file name rather than a directory.
fn names_a_file(path: &str) -> bool {
    !path.ends_with(['/', std::path::MAIN_SEPARATOR])
        && Path::new(path).file_name().is_some_and(|name| !name.is_empty())
}

/// Page source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Ladder page URL
    #[serde(default)]
    pub page_url: Option<String>,

    /// Saved ladder page to read instead of fetching (takes precedence)
    #[serde(default)]
    pub html_file: Option<PathBuf>,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub selectors: TableSelectors,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            page_url: None,
            html_file: None,
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            selectors: TableSelectors::default(),
        }
    }
}

/// Polling loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Only process entries of this account (case-insensitive)
    #[serde(default)]
    pub target_account: Option<String>,

    /// Seconds between cycles
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Extra seconds per consecutive fetch failure (0 disables backoff)
    #[serde(default)]
    pub backoff_step_secs: u64,

    /// Upper bound for the extra backoff delay
    #[serde(default = "defaults::max_backoff")]
    pub max_backoff_secs: u64,
}

impl WatchConfig {
    /// Sleep duration after a cycle, given the current failure streak.
    pub fn sleep_duration(&self, consecutive_failures: u32) -> Duration {
        let extra = self
            .backoff_step_secs
            .saturating_mul(u64::from(consecutive_failures))
            .min(self.max_backoff_secs);
        Duration::from_secs(self.interval_secs.saturating_add(extra))
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            target_account: None,
            interval_secs: defaults::interval(),
            backoff_step_secs: 0,
            max_backoff_secs: defaults::max_backoff(),
        }
    }
}

/// Row parsing rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParserConfig {
    /// Case-sensitive token marking a dead character in the status element
    #[serde(default = "defaults::dead_token")]
    pub dead_token: String,

    /// Marker searched in the cell text when there is no status element
    #[serde(default)]
    pub inline_dead_marker: Option<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            dead_token: defaults::dead_token(),
            inline_dead_marker: None,
        }
    }
}

/// Durable state locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Known-state JSON file
    #[serde(default = "defaults::known_file")]
    pub known_file: String,

    /// Directory holding one sub-directory per new character
    #[serde(default = "defaults::archive_dir")]
    pub archive_dir: String,

    /// Directory for full ladder snapshots; disabled when unset
    #[serde(default)]
    pub snapshot_dir: Option<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            known_file: defaults::known_file(),
            archive_dir: defaults::archive_dir(),
            snapshot_dir: None,
        }
    }
}

mod defaults {
    // Source defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; ladder-watch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        20
    }

    // Watch defaults
    pub fn interval() -> u64 {
        60
    }
    pub fn max_backoff() -> u64 {
        300
    }

    // Parser defaults
    pub fn dead_token() -> String {
        "Dead".into()
    }

    // Path defaults
    pub fn known_file() -> String {
        "characters.json".into()
    }
    pub fn archive_dir() -> String {
        "new_characters".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.source.page_url = Some("https://example.com/ladder".to_string());
        config
    }

    #[test]
    fn validate_default_with_url_ok() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_source() {
        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn validate_accepts_html_file_source() {
        let mut config = Config::default();
        config.source.html_file = Some(PathBuf::from("ladder.html"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_url() {
        let mut config = Config::default();
        config.source.page_url = Some("not a url".to_string());
        assert!(matches!(config.validate(), Err(AppError::Url(_))));
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = valid_config();
        config.watch.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let mut config = valid_config();
        config.source.selectors.row_selector = "[[invalid".to_string();
        assert!(matches!(config.validate(), Err(AppError::Selector { .. })));
    }

    #[test]
    fn validate_rejects_blank_target_account() {
        let mut config = valid_config();
        config.watch.target_account = Some("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_known_file_without_name() {
        for path in ["..", "state/", "/"] {
            let mut config = valid_config();
            config.paths.known_file = path.to_string();
            assert!(
                matches!(config.validate(), Err(AppError::Validation(_))),
                "{path} accepted"
            );
        }

        let mut config = valid_config();
        config.paths.known_file = "state/characters.json".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [source]
            page_url = "https://example.com/ladder"

            [watch]
            target_account = "Foo"
            "#,
        )
        .unwrap();

        assert_eq!(config.watch.target_account.as_deref(), Some("Foo"));
        assert_eq!(config.watch.interval_secs, 60);
        assert_eq!(config.parser.dead_token, "Dead");
        assert_eq!(config.paths.known_file, "characters.json");
        assert_eq!(
            config.source.selectors.status_selector,
            "span.league-ladder__entry-state"
        );
    }

    #[test]
    fn sleep_duration_without_backoff_is_fixed() {
        let watch = WatchConfig::default();
        assert_eq!(watch.sleep_duration(0), Duration::from_secs(60));
        assert_eq!(watch.sleep_duration(5), Duration::from_secs(60));
    }

    #[test]
    fn sleep_duration_backoff_is_capped() {
        let watch = WatchConfig {
            backoff_step_secs: 30,
            max_backoff_secs: 90,
            ..WatchConfig::default()
        };
        assert_eq!(watch.sleep_duration(1), Duration::from_secs(90));
        assert_eq!(watch.sleep_duration(10), Duration::from_secs(150));
    }

    #[test]
    fn example_config_is_valid() {
        let config: Config = toml::from_str(include_str!("../../ladder.example.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.source.selectors, TableSelectors::default());
    }
}
