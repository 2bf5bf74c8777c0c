//! CSV dataset loading.
//!
//! Reads a dataset file into [`Record`]s (header order preserved) and
//! fingerprints the raw bytes with SHA-256 so ingestion can detect when a
//! source file has changed since its collection was seeded.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::config::DatasetConfig;
use crate::models::{Document, Record};
use crate::render::{build_documents, Renderer};

/// A dataset read from disk, ready to be rendered.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub renderer: Renderer,
    pub records: Vec<Record>,
    /// Hex SHA-256 of the source file.
    pub fingerprint: String,
}

impl Dataset {
    /// Render every record into a document, in file order.
    pub fn documents(&self) -> Vec<Document> {
        build_documents(&self.name, self.renderer, &self.records)
    }
}

/// Read and parse the dataset described by `config`.
///
/// A missing or unreadable file is an error; so is malformed CSV.
pub fn load_dataset(config: &DatasetConfig) -> Result<Dataset> {
    let bytes = std::fs::read(&config.path).with_context(|| {
        format!(
            "Failed to read dataset '{}' from {}",
            config.name,
            config.path.display()
        )
    })?;

    let records = parse_records(&bytes)
        .with_context(|| format!("Failed to parse CSV: {}", config.path.display()))?;

    Ok(Dataset {
        name: config.name.clone(),
        renderer: config.renderer,
        records,
        fingerprint: fingerprint_bytes(&bytes),
    })
}

/// Parse CSV bytes (with a header row) into records.
///
/// Every record carries every header column. Short rows are padded with
/// blank cells, which read as absent; cells beyond the header width are
/// ignored.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), row.get(i).unwrap_or_default().to_string()))
            .collect();
        records.push(Record::new(fields));
    }

    Ok(records)
}

fn fingerprint_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const STARTUPS: &str = "name,city,founded_at,closed_at,age_last_funding_year,relationships,age_last_milestone_year
FitPulse,Bangalore,2011-04-01,,6,25,4
\"Shut, Inc.\",Delhi,2008-01-01,2012-06-30,2,3,1
";

    #[test]
    fn test_parse_records_quoted_and_empty() {
        let records = parse_records(STARTUPS.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some("FitPulse"));
        assert_eq!(records[0].get("closed_at"), None);
        assert_eq!(records[1].get("name"), Some("Shut, Inc."));
        assert_eq!(records[1].get("closed_at"), Some("2012-06-30"));
        assert_eq!(records[0].len(), 7);
    }

    #[test]
    fn test_short_rows_are_padded_as_absent() {
        let records = parse_records(b"a,b,c\n1,2\n4,5,6,7\n").unwrap();
        assert_eq!(records[0].len(), 3);
        assert_eq!(records[0].get("c"), None);
        assert_eq!(records[1].len(), 3);
        assert_eq!(records[1].get("c"), Some("6"));
    }

    #[test]
    fn test_short_row_keeps_every_column_in_generic_rendering() {
        let records = parse_records(b"a,b,c\n1,2\n").unwrap();
        let docs = build_documents("consumer", Renderer::Generic, &records);
        assert_eq!(docs[0].content, "CONSUMER DATA:\na: 1\nb: 2\nc: \n");
    }

    #[test]
    fn test_header_only_file() {
        let records = parse_records(b"a,b\n").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_load_dataset_and_fingerprint() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("startups.csv");
        std::fs::write(&path, STARTUPS).unwrap();

        let cfg = DatasetConfig {
            name: "startup".into(),
            path: path.clone(),
            renderer: Renderer::Startup,
            top_k: 5,
        };
        let ds = load_dataset(&cfg).unwrap();
        assert_eq!(ds.records.len(), 2);
        assert_eq!(ds.fingerprint, fingerprint_bytes(STARTUPS.as_bytes()));
        assert_eq!(ds.fingerprint.len(), 64);

        let docs = ds.documents();
        assert_eq!(docs[0].id, "startup_0");
        assert!(docs[0].content.ends_with("Survival Score: 8"));

        std::fs::write(&path, format!("{}Late,Pune,2015-01-01,,1,1,1\n", STARTUPS)).unwrap();
        assert_ne!(ds.fingerprint, load_dataset(&cfg).unwrap().fingerprint);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let cfg = DatasetConfig {
            name: "consumer".into(),
            path: PathBuf::from("/definitely/not/here.csv"),
            renderer: Renderer::Generic,
            top_k: 3,
        };
        let err = load_dataset(&cfg).unwrap_err().to_string();
        assert!(err.contains("consumer"), "{}", err);
    }
}
