// src/services/html.rs

//! HTML page sources.
//!
//! Both sources share [`TableScraper`], which turns a ladder page into
//! [`RawRow`] values using the configured CSS selectors.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{RawCell, RawRow, SourceConfig, TableSelectors};
use crate::services::LadderSource;
use crate::utils::http::{create_async_client, fetch_text};
use crate::utils::{normalize_whitespace, parse_selector};

/// Compiled table selectors.
#[derive(Debug, Clone)]
pub struct TableScraper {
    table: Selector,
    row: Selector,
    cell: Selector,
    account_link: Selector,
    status: Selector,
}

impl TableScraper {
    pub fn new(selectors: &TableSelectors) -> Result<Self> {
        Ok(Self {
            table: parse_selector(&selectors.table_selector)?,
            row: parse_selector(&selectors.row_selector)?,
            cell: parse_selector(&selectors.cell_selector)?,
            account_link: parse_selector(&selectors.account_link_selector)?,
            status: parse_selector(&selectors.status_selector)?,
        })
    }

    /// Extract the rows of the first matching table.
    ///
    /// A page without the table is an error: the page did not load properly.
    pub fn extract_rows(&self, html: &str, context: &str) -> Result<Vec<RawRow>> {
        let document = Html::parse_document(html);
        let table = document
            .select(&self.table)
            .next()
            .ok_or_else(|| AppError::fetch(context, "ladder table not found"))?;

        Ok(table
            .select(&self.row)
            .map(|row| RawRow::new(row.select(&self.cell).map(|c| self.raw_cell(c)).collect()))
            .collect())
    }

    fn raw_cell(&self, cell: ElementRef<'_>) -> RawCell {
        RawCell {
            text: element_text(cell),
            link_text: cell.select(&self.account_link).next().map(element_text),
            status_text: cell.select(&self.status).next().map(element_text),
        }
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// Fetches the ladder page over HTTP every cycle.
pub struct HttpLadderSource {
    client: Client,
    page_url: Url,
    scraper: TableScraper,
}

impl HttpLadderSource {
    pub fn new(page_url: &str, config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
            page_url: Url::parse(page_url)?,
            scraper: TableScraper::new(&config.selectors)?,
        })
    }
}

#[async_trait]
impl LadderSource for HttpLadderSource {
    fn describe(&self) -> String {
        self.page_url.to_string()
    }

    async fn fetch_rows(&mut self) -> Result<Vec<RawRow>> {
        let html = fetch_text(&self.client, self.page_url.as_str()).await?;
        self.scraper.extract_rows(&html, self.page_url.as_str())
    }

    async fn close(&mut self) -> Result<()> {
        log::debug!("Closing HTTP session for {}", self.page_url);
        Ok(())
    }
}

/// Reads a saved ladder page from disk every cycle.
pub struct FileLadderSource {
    path: PathBuf,
    scraper: TableScraper,
}

impl FileLadderSource {
    pub fn new(path: impl AsRef<Path>, selectors: &TableSelectors) -> Result<Self> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            scraper: TableScraper::new(selectors)?,
        })
    }
}

#[async_trait]
impl LadderSource for FileLadderSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch_rows(&mut self) -> Result<Vec<RawRow>> {
        let html = tokio::fs::read_to_string(&self.path).await?;
        self.scraper.extract_rows(&html, &self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::parse_row;
    use tempfile::TempDir;

    const LADDER_PAGE: &str = r#"
        <html><body>
        <table class="league-ladder__entries">
          <thead><tr><th>Rank</th><th>Account</th><th>Character</th></tr></thead>
          <tbody>
            <tr class="league-ladder__entry">
              <td>1</td>
              <td><a href="/account/Foo">Foo</a></td>
              <td>"Bar"</td>
              <td>Witch</td>
              <td>90</td>
              <td>1.0e9</td>
            </tr>
            <tr class="league-ladder__entry">
              <td>2</td>
              <td><a href="/account/Qux">Qux</a></td>
              <td>"Baz"
                <span class="league-ladder__entry-state">(Dead)</span></td>
              <td>Marauder</td>
              <td>88</td>
              <td>9.5e8</td>
            </tr>
            <tr class="league-ladder__entry">
              <td>3</td>
              <td>NoLink</td>
              <td>"Lost"</td>
              <td>Ranger</td>
              <td>70</td>
            </tr>
          </tbody>
        </table>
        </body></html>
    "#;

    fn scraper() -> TableScraper {
        TableScraper::new(&TableSelectors::default()).unwrap()
    }

    #[test]
    fn test_extract_rows_skips_header() {
        let rows = scraper().extract_rows(LADDER_PAGE, "test").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].cells.len(), 6);
        assert_eq!(rows[2].cells.len(), 5);
    }

    #[test]
    fn test_extract_cell_details() {
        let rows = scraper().extract_rows(LADDER_PAGE, "test").unwrap();
        assert_eq!(rows[0].cells[1].link_text.as_deref(), Some("Foo"));
        assert_eq!(rows[0].cells[2].status_text, None);
        assert_eq!(rows[1].cells[2].text, "\"Baz\" (Dead)");
        assert_eq!(rows[1].cells[2].status_text.as_deref(), Some("(Dead)"));
        assert_eq!(rows[2].cells[1].link_text, None);
    }

    #[test]
    fn test_extracted_rows_parse() {
        let rows = scraper().extract_rows(LADDER_PAGE, "test").unwrap();

        let bar = parse_row(&rows[0]).unwrap();
        assert_eq!(bar.character_name, "Bar");
        assert!(!bar.is_dead);

        let baz = parse_row(&rows[1]).unwrap();
        assert_eq!(baz.account_name, "Qux");
        assert_eq!(baz.character_name, "Baz");
        assert!(baz.is_dead);

        assert_eq!(parse_row(&rows[2]).unwrap_err().reason(), "insufficient_columns");
    }

    #[test]
    fn test_missing_table_is_fetch_error() {
        let result = scraper().extract_rows("<html><body><p>loading</p></body></html>", "test");
        assert!(matches!(result, Err(AppError::Fetch { .. })));
    }

    #[tokio::test]
    async fn test_file_source_reads_each_fetch() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ladder.html");
        std::fs::write(&path, LADDER_PAGE).unwrap();

        let mut source = FileLadderSource::new(&path, &TableSelectors::default()).unwrap();
        assert_eq!(source.fetch_rows().await.unwrap().len(), 3);

        std::fs::remove_file(&path).unwrap();
        assert!(source.fetch_rows().await.is_err());
        source.close().await.unwrap();
    }
}
