// src/models/selectors.rs

//! CSS selectors for scraping the ladder table.

use serde::{Deserialize, Serialize};

/// CSS selectors for scraping the ladder table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableSelectors {
    /// Selector for the ladder table itself
    #[serde(default = "default_table")]
    pub table_selector: String,

    /// Selector for each entry row, relative to the table
    #[serde(default = "default_row")]
    pub row_selector: String,

    /// Selector for the cells within a row
    #[serde(default = "default_cell")]
    pub cell_selector: String,

    /// Selector for the account link within a cell
    #[serde(default = "default_account_link")]
    pub account_link_selector: String,

    /// Selector for the status marker within the character cell
    #[serde(default = "default_status")]
    pub status_selector: String,
}

fn default_table() -> String {
    "table.league-ladder__entries".to_string()
}

fn default_row() -> String {
    "tbody tr".to_string()
}

fn default_cell() -> String {
    "td".to_string()
}

fn default_account_link() -> String {
    "a".to_string()
}

fn default_status() -> String {
    "span.league-ladder__entry-state".to_string()
}

impl Default for TableSelectors {
    fn default() -> Self {
        Self {
            table_selector: default_table(),
            row_selector: default_row(),
            cell_selector: default_cell(),
            account_link_selector: default_account_link(),
            status_selector: default_status(),
        }
    }
}

impl TableSelectors {
    /// All selectors paired with their config key, for validation messages.
    pub fn named(&self) -> [(&'static str, &str); 5] {
        [
            ("table_selector", &self.table_selector),
            ("row_selector", &self.row_selector),
            ("cell_selector", &self.cell_selector),
            ("account_link_selector", &self.account_link_selector),
            ("status_selector", &self.status_selector),
        ]
    }
}
