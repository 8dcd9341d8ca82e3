// src/pipeline/parse.rs

//! Row parsing: raw table cells into [`LadderEntry`] values.
//!
//! Column layout is fixed:
//!
//! | col | content                                   |
//! |-----|-------------------------------------------|
//! | 0   | rank                                      |
//! | 1   | account (inner link text)                 |
//! | 2   | character name, optional status marker    |
//! | 3   | class                                     |
//! | 4   | level                                     |
//! | 5   | experience                                |
//!
//! Parsing is pure. Failures are returned to the caller, which decides how to
//! report them.

use thiserror::Error;

use crate::models::{LadderEntry, ParserConfig, RawCell, RawRow};

/// Minimum number of cells a ladder row must have.
pub const MIN_COLUMNS: usize = 6;

/// Why a row could not be turned into an entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("row has {found} cells, expected at least 6")]
    InsufficientColumns { found: usize },

    #[error("account cell has no link")]
    MissingAccountLink,

    #[error("row has an empty account or character name")]
    EmptyIdentity,
}

impl ParseFailure {
    /// Stable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            ParseFailure::InsufficientColumns { .. } => "insufficient_columns",
            ParseFailure::MissingAccountLink => "missing_account_link",
            ParseFailure::EmptyIdentity => "empty_identity",
        }
    }
}

/// Parser for ladder rows.
#[derive(Debug, Clone, Default)]
pub struct RowParser {
    config: ParserConfig,
}

impl RowParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse one row into an entry.
    pub fn parse(&self, row: &RawRow) -> Result<LadderEntry, ParseFailure> {
        let cells = &row.cells;
        if cells.len() < MIN_COLUMNS {
            return Err(ParseFailure::InsufficientColumns { found: cells.len() });
        }

        let rank = cells[0].text.trim().to_string();
        let account_name = cells[1]
            .link_text
            .as_deref()
            .ok_or(ParseFailure::MissingAccountLink)?
            .trim()
            .to_string();
        let (character_name, is_dead) = self.split_character(&cells[2]);

        if account_name.is_empty() || character_name.is_empty() {
            return Err(ParseFailure::EmptyIdentity);
        }

        Ok(LadderEntry {
            rank,
            account_name,
            character_name,
            character_class: cells[3].text.trim().to_string(),
            level: cells[4].text.trim().to_string(),
            experience: cells[5].text.trim().to_string(),
            is_dead,
        })
    }

    /// Separate the character name from its status annotation.
    fn split_character(&self, cell: &RawCell) -> (String, bool) {
        if let Some(status) = &cell.status_text {
            let name = if status.is_empty() {
                cell.text.clone()
            } else {
                cell.text.replace(status.as_str(), "")
            };
            return (
                normalize_name(&name),
                status.contains(self.config.dead_token.as_str()),
            );
        }

        match self
            .config
            .inline_dead_marker
            .as_deref()
            .filter(|marker| !marker.is_empty() && cell.text.contains(marker))
        {
            Some(marker) => (normalize_name(&cell.text.replace(marker, "")), true),
            None => (normalize_name(&cell.text), false),
        }
    }
}

/// Parse a row with the default rules.
pub fn parse_row(row: &RawRow) -> Result<LadderEntry, ParseFailure> {
    RowParser::default().parse(row)
}

/// Strip surrounding double quotes and whitespace.
fn normalize_name(s: &str) -> String {
    s.trim_matches(|c: char| c == '"' || c.is_whitespace())
        .to_string()
}
