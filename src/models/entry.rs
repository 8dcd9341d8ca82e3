//! Ladder row and entry data structures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One observed leaderboard position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LadderEntry {
    /// Display rank (not guaranteed numeric)
    #[serde(default)]
    pub rank: String,

    /// Account display name, case-sensitive
    pub account_name: String,

    /// Character name without quotes or status annotation
    pub character_name: String,

    /// Character class
    #[serde(default, rename = "class", alias = "character_class")]
    pub character_class: String,

    /// Character level
    #[serde(default)]
    pub level: String,

    /// Experience
    #[serde(default)]
    pub experience: String,

    /// Whether a dead marker was present in the character cell
    #[serde(default)]
    pub is_dead: bool,
}

impl LadderEntry {
    /// Composite identity of the character this entry describes.
    pub fn identity(&self) -> Identity {
        Identity::new(&self.account_name, &self.character_name)
    }

    /// Status label used in archive names.
    pub fn status(&self) -> &'static str {
        if self.is_dead { "dead" } else { "alive" }
    }
}

impl fmt::Display for LadderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rank: {}, Account: {}, Character: {}, Class: {}, Level: {}, Experience: {}, Dead: {}",
            self.rank,
            self.account_name,
            self.character_name,
            self.character_class,
            self.level,
            self.experience,
            self.is_dead
        )
    }
}

/// `(account_name, character_name)` pair. Exact, case-sensitive equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    pub account_name: String,
    pub character_name: String,
}

impl Identity {
    pub fn new(account_name: impl Into<String>, character_name: impl Into<String>) -> Self {
        Self {
            account_name: account_name.into(),
            character_name: character_name.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account_name, self.character_name)
    }
}

/// A table cell as handed over by a page source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCell {
    /// Full visible text of the cell
    pub text: String,

    /// Text of the first inner link, if the cell has one
    pub link_text: Option<String>,

    /// Text of the nested status element, if the cell has one
    pub status_text: Option<String>,
}

impl RawCell {
    /// Plain text cell.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Cell wrapping a single link.
    pub fn link(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            link_text: Some(text.clone()),
            text,
            status_text: None,
        }
    }

    /// Cell with a nested status element.
    pub fn with_status(text: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link_text: None,
            status_text: Some(status.into()),
        }
    }
}

/// An unparsed table row: cells in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub cells: Vec<RawCell>,
}

impl RawRow {
    pub fn new(cells: Vec<RawCell>) -> Self {
        Self { cells }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> LadderEntry {
        LadderEntry {
            rank: "1".to_string(),
            account_name: "Foo".to_string(),
            character_name: "Bar".to_string(),
            character_class: "Witch".to_string(),
            level: "90".to_string(),
            experience: "1.0e9".to_string(),
            is_dead: false,
        }
    }

    #[test]
    fn test_identity_ignores_display_fields() {
        let a = sample_entry();
        let mut b = sample_entry();
        b.rank = "7".to_string();
        b.level = "91".to_string();
        b.is_dead = true;
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_identity_is_case_sensitive() {
        let a = sample_entry();
        let mut b = sample_entry();
        b.account_name = "foo".to_string();
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(sample_entry()).unwrap();
        assert_eq!(value["account_name"], "Foo");
        assert_eq!(value["character_name"], "Bar");
        assert_eq!(value["class"], "Witch");
        assert_eq!(value["is_dead"], false);
    }

    #[test]
    fn test_deserialize_identity_only_record() {
        let entry: LadderEntry =
            serde_json::from_str(r#"{"account_name":"Foo","character_name":"Bar"}"#).unwrap();
        assert_eq!(entry.identity(), Identity::new("Foo", "Bar"));
        assert!(entry.rank.is_empty());
    }
}
