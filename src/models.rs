//! Core data models used throughout Foundry.
//!
//! These types represent the CSV records, indexed documents, and chat turns
//! that flow through the ingestion, retrieval, and conversation pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of a CSV dataset: an ordered mapping of column name to raw cell text.
///
/// Column order follows the source file's header. Lookups treat a missing
/// column and an empty (or whitespace-only) cell the same way: as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Build a record from `(column, value)` pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the cell for `column`, or `None` if the column is missing or blank.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.trim().is_empty())
    }

    /// Returns the cell for `column` parsed as a number.
    ///
    /// Absent cells and cells that don't parse as a finite number yield `None`.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|n| n.is_finite())
    }

    /// Iterate over all `(column, raw value)` pairs in header order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Metadata attached to every indexed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Dataset tag the document was rendered from (e.g. `"startup"`).
    pub source: String,
}

/// A rendered dataset row, ready to be embedded and stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Positional identifier: `<dataset>_<row-index>`.
    pub id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
}

/// A document returned from a similarity query, with its cosine score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in a chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Set when the assistant could not answer and `content` is a fallback message.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            created_at: Utc::now(),
            degraded: false,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            created_at: Utc::now(),
            degraded: false,
        }
    }

    pub fn degraded(content: impl Into<String>) -> Self {
        Self {
            degraded: true,
            ..Self::assistant(content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_cells_are_absent() {
        let record = Record::from_pairs([("name", "Acme"), ("closed_at", "  "), ("city", "")]);
        assert_eq!(record.get("name"), Some("Acme"));
        assert_eq!(record.get("closed_at"), None);
        assert_eq!(record.get("city"), None);
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_number_parsing() {
        let record = Record::from_pairs([
            ("a", "6"),
            ("b", " 5.5 "),
            ("c", "n/a"),
            ("d", "NaN"),
        ]);
        assert_eq!(record.number("a"), Some(6.0));
        assert_eq!(record.number("b"), Some(5.5));
        assert_eq!(record.number("c"), None);
        assert_eq!(record.number("d"), None);
        assert_eq!(record.number("e"), None);
    }

    #[test]
    fn test_columns_keep_header_order() {
        let record = Record::from_pairs([("z", "1"), ("a", "2"), ("m", "")]);
        let names: Vec<&str> = record.columns().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_degraded_flag_skipped_when_false() {
        let turn = ChatTurn::assistant("hi");
        let json = serde_json::to_value(&turn).unwrap();
        assert!(json.get("degraded").is_none());
        assert_eq!(json["role"], "assistant");

        let turn = ChatTurn::degraded("model offline");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["degraded"], true);
    }
}
