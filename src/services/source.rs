// src/services/source.rs

//! Page source contract.
//!
//! A page source hands the watcher the rows currently visible in the ladder
//! table. It owns whatever session it needs to do so; the watcher acquires it
//! once and calls [`LadderSource::close`] exactly once when it stops.

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{RawRow, SourceConfig};
use crate::services::html::{FileLadderSource, HttpLadderSource};

/// Provider of raw ladder rows.
#[async_trait]
pub trait LadderSource: Send {
    /// Human-readable location, for logs.
    fn describe(&self) -> String;

    /// Rows currently in the ladder table. Any error abandons the cycle.
    async fn fetch_rows(&mut self) -> Result<Vec<RawRow>>;

    /// Release the underlying session.
    ///
    /// Only called on an orderly stop. Anything a source holds must also be
    /// released by dropping it, since a panicking cycle never reaches `close`.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Build the page source described by the configuration.
///
/// A configured `html_file` takes precedence over `page_url`. Every error
/// here is an [`AppError::Init`].
pub fn build_source(config: &SourceConfig) -> Result<Box<dyn LadderSource>> {
    if let Some(path) = &config.html_file {
        let source = FileLadderSource::new(path, &config.selectors).map_err(AppError::init)?;
        return Ok(Box::new(source));
    }
    if let Some(url) = &config.page_url {
        let source = HttpLadderSource::new(url, config).map_err(AppError::init)?;
        return Ok(Box::new(source));
    }
    Err(AppError::init(
        "no page source configured (set source.page_url or source.html_file)",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_build_source_requires_location() {
        let result = build_source(&SourceConfig::default());
        assert!(matches!(result, Err(AppError::Init(_))));
    }

    #[test]
    fn test_build_source_prefers_html_file() {
        let config = SourceConfig {
            page_url: Some("https://example.com/ladder".to_string()),
            html_file: Some(PathBuf::from("ladder.html")),
            ..SourceConfig::default()
        };
        let source = build_source(&config).unwrap();
        assert!(source.describe().contains("ladder.html"));
    }

    #[test]
    fn test_build_source_rejects_bad_url() {
        let config = SourceConfig {
            page_url: Some("::not a url".to_string()),
            ..SourceConfig::default()
        };
        assert!(matches!(build_source(&config), Err(AppError::Init(_))));
    }

    #[test]
    fn test_build_source_rejects_bad_selector() {
        let mut config = SourceConfig {
            page_url: Some("https://example.com/ladder".to_string()),
            ..SourceConfig::default()
        };
        config.selectors.cell_selector = "[[bad".to_string();
        assert!(matches!(build_source(&config), Err(AppError::Init(_))));
    }
}
