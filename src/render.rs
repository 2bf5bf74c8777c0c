//! Turning dataset rows into indexable documents.
//!
//! Each dataset is rendered with one of a closed set of [`Renderer`]s,
//! selected per dataset in configuration:
//!
//! - **`startup`**: a fixed one-line business summary including the
//!   [survival score](crate::score::survival_score).
//! - **`generic`**: every column as `name: value` on its own line, under an
//!   uppercase dataset label.
//!
//! Document identifiers are positional (`<dataset>_<row-index>`), so they are
//! only stable while the source file's row order is unchanged.

use serde::{Deserialize, Serialize};

use crate::models::{Document, DocumentMetadata, Record};
use crate::score::{self, survival_score};

/// Rendering strategy for a dataset's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Renderer {
    /// Fixed seven-field startup summary.
    Startup,
    /// `column: value` dump of every column.
    #[default]
    Generic,
}

impl Renderer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Renderer::Startup => "startup",
            Renderer::Generic => "generic",
        }
    }

    /// Render one record's content text.
    pub fn render(&self, dataset: &str, record: &Record) -> String {
        match self {
            Renderer::Startup => render_startup(record),
            Renderer::Generic => render_generic(dataset, record),
        }
    }
}

fn render_startup(record: &Record) -> String {
    let field = |column: &str| record.get(column).unwrap_or("N/A");

    format!(
        "Startup: {} | City: {} | Founded: {} | Closed: {} | Funding Duration: {} years | Relationships: {} | Survival Score: {}",
        field("name"),
        field("city"),
        field("founded_at"),
        record.get(score::CLOSED_AT).unwrap_or("Active"),
        field(score::FUNDING_AGE),
        field(score::RELATIONSHIPS),
        survival_score(record),
    )
}

fn render_generic(dataset: &str, record: &Record) -> String {
    let mut content = format!("{} DATA:\n", dataset.to_uppercase());
    for (column, value) in record.columns() {
        content.push_str(column);
        content.push_str(": ");
        content.push_str(value);
        content.push('\n');
    }
    content
}

/// Positional document identifier for row `index` of `dataset`.
pub fn document_id(dataset: &str, index: usize) -> String {
    format!("{}_{}", dataset, index)
}

/// Render every record of a dataset into a [`Document`], preserving row order.
pub fn build_documents(dataset: &str, renderer: Renderer, records: &[Record]) -> Vec<Document> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| Document {
            id: document_id(dataset, i),
            content: renderer.render(dataset, record),
            metadata: DocumentMetadata {
                source: dataset.to_string(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn startup_row() -> Record {
        Record::from_pairs([
            ("name", "FitPulse"),
            ("city", "Bangalore"),
            ("founded_at", "2011-04-01"),
            ("closed_at", ""),
            ("age_last_funding_year", "6"),
            ("relationships", "25"),
            ("age_last_milestone_year", "4"),
        ])
    }

    #[test]
    fn test_startup_line() {
        let content = Renderer::Startup.render("startup", &startup_row());
        assert_eq!(
            content,
            "Startup: FitPulse | City: Bangalore | Founded: 2011-04-01 | Closed: Active | \
             Funding Duration: 6 years | Relationships: 25 | Survival Score: 8"
        );
    }

    #[test]
    fn test_startup_defaults_for_missing_fields() {
        let record = Record::from_pairs([("closed_at", "2013-02-02")]);
        let content = Renderer::Startup.render("startup", &record);
        assert_eq!(
            content,
            "Startup: N/A | City: N/A | Founded: N/A | Closed: 2013-02-02 | \
             Funding Duration: N/A years | Relationships: N/A | Survival Score: 0"
        );
    }

    #[test]
    fn test_generic_dump() {
        let record = Record::from_pairs([("sector", "Health"), ("growth", "12%"), ("notes", "")]);
        let content = Renderer::Generic.render("industry", &record);
        assert_eq!(content, "INDUSTRY DATA:\nsector: Health\ngrowth: 12%\nnotes: \n");
    }

    #[test]
    fn test_build_documents_ids_and_order() {
        let records = vec![
            Record::from_pairs([("a", "1")]),
            Record::from_pairs([("a", "2")]),
            Record::from_pairs([("a", "3")]),
        ];
        let docs = build_documents("consumer", Renderer::Generic, &records);
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["consumer_0", "consumer_1", "consumer_2"]);
        assert!(docs[1].content.contains("a: 2"));
        assert!(docs.iter().all(|d| d.metadata.source == "consumer"));
    }

    #[test]
    fn test_build_documents_is_deterministic() {
        let records = vec![startup_row(), Record::from_pairs([("name", "Other")])];
        let first = build_documents("startup", Renderer::Startup, &records);
        let second = build_documents("startup", Renderer::Startup, &records);
        assert_eq!(first, second);
    }

    #[test]
    fn test_renderer_from_config_string() {
        #[derive(Deserialize)]
        struct Wrapper {
            renderer: Renderer,
        }
        let w: Wrapper = toml::from_str("renderer = \"startup\"").unwrap();
        assert_eq!(w.renderer, Renderer::Startup);
        assert!(toml::from_str::<Wrapper>("renderer = \"fancy\"").is_err());
    }
}
