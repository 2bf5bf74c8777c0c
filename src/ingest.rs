//! Seeding dataset collections.
//!
//! A collection is populated from its CSV file once. Under the default
//! [`IngestPolicy::IfEmpty`] policy a collection that already holds
//! documents is left untouched; under [`IngestPolicy::ContentHash`] it is
//! cleared and re-seeded when the file's SHA-256 no longer matches the
//! fingerprint recorded at the last seeding. `force` re-seeds regardless.

use anyhow::{bail, Context, Result};
use std::sync::Arc;

use crate::config::{Config, DatasetConfig, IngestPolicy};
use crate::dataset::load_dataset;
use crate::embedding::{create_provider, EmbeddingProvider};
use crate::models::Document;
use crate::store::{Collection, SqliteStore, VectorStore};

/// What a seeding pass did to one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The collection was empty and has been populated.
    Seeded { documents: usize },
    /// The collection was cleared and populated again.
    Reseeded { documents: usize },
    /// The collection already held documents and was left alone.
    Skipped { existing: i64 },
}

impl IngestOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            IngestOutcome::Seeded { .. } => "seeded",
            IngestOutcome::Reseeded { .. } => "reseeded",
            IngestOutcome::Skipped { .. } => "skipped",
        }
    }
}

/// Populate `collection` with `documents` iff it currently holds none.
pub async fn ensure_populated(
    collection: &Collection,
    documents: &[Document],
) -> Result<IngestOutcome> {
    let existing = collection.count().await?;
    if existing > 0 {
        return Ok(IngestOutcome::Skipped { existing });
    }
    let documents = collection.add_documents(documents).await?;
    Ok(IngestOutcome::Seeded { documents })
}

/// Populate `collection` according to `policy`, recording `fingerprint`.
pub async fn ensure_populated_with(
    collection: &Collection,
    documents: &[Document],
    fingerprint: &str,
    policy: IngestPolicy,
    force: bool,
) -> Result<IngestOutcome> {
    let existing = collection.count().await?;

    let reseed = if existing == 0 {
        false
    } else if force {
        true
    } else {
        match policy {
            IngestPolicy::IfEmpty => false,
            IngestPolicy::ContentHash => {
                collection.fingerprint().await?.as_deref() != Some(fingerprint)
            }
        }
    };

    let outcome = if existing == 0 {
        IngestOutcome::Seeded {
            documents: collection.add_documents(documents).await?,
        }
    } else if reseed {
        let vectors = collection.embed_documents(documents).await?;
        let removed = collection.clear().await?;
        tracing::info!(
            collection = collection.name(),
            removed,
            force,
            "clearing collection before reseed"
        );
        IngestOutcome::Reseeded {
            documents: collection.insert_embedded(documents, &vectors).await?,
        }
    } else {
        return Ok(IngestOutcome::Skipped { existing });
    };

    collection.set_fingerprint(fingerprint).await?;
    Ok(outcome)
}

/// Load one dataset from disk and seed its collection.
pub async fn ingest_dataset(
    dataset: &DatasetConfig,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    policy: IngestPolicy,
    force: bool,
) -> Result<IngestOutcome> {
    let loaded = load_dataset(dataset)?;
    let documents = loaded.documents();
    let collection = Collection::new(dataset.collection_name(), store, embedder, batch_size);

    let outcome = ensure_populated_with(&collection, &documents, &loaded.fingerprint, policy, force)
        .await
        .with_context(|| format!("Failed to ingest dataset '{}'", dataset.name))?;

    tracing::info!(
        dataset = %dataset.name,
        collection = collection.name(),
        rows = loaded.records.len(),
        outcome = outcome.label(),
        "ingest finished"
    );
    Ok(outcome)
}

/// `foundry ingest`: seed every configured dataset (or just one) and print a summary.
pub async fn run_ingest(config: &Config, dataset_filter: Option<&str>, force: bool) -> Result<()> {
    let datasets: Vec<&DatasetConfig> = match dataset_filter {
        Some(name) => match config.dataset(name) {
            Some(d) => vec![d],
            None => bail!(
                "Unknown dataset: '{}'. Available: {}",
                name,
                config
                    .datasets
                    .iter()
                    .map(|d| d.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        },
        None => config.datasets.iter().collect(),
    };

    if !config.embedding.is_enabled() {
        bail!("Ingestion requires embeddings. Set [embedding] provider in config.");
    }

    let store: Arc<dyn VectorStore> = Arc::new(SqliteStore::open(&config.db.path).await?);
    let embedder = create_provider(&config.embedding)?;

    let mut result = Ok(());
    for dataset in datasets {
        match ingest_dataset(
            dataset,
            store.clone(),
            embedder.clone(),
            config.embedding.batch_size,
            config.ingest.policy,
            force,
        )
        .await
        {
            Ok(outcome) => print_outcome(dataset, config.ingest.policy, &outcome),
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }

    store.close().await;
    result?;
    println!("ok");
    Ok(())
}

fn print_outcome(dataset: &DatasetConfig, policy: IngestPolicy, outcome: &IngestOutcome) {
    println!("ingest {}", dataset.name);
    println!("  collection: {}", dataset.collection_name());
    println!("  policy: {}", policy.as_str());
    match outcome {
        IngestOutcome::Seeded { documents } => println!("  seeded documents: {}", documents),
        IngestOutcome::Reseeded { documents } => println!("  reseeded documents: {}", documents),
        IngestOutcome::Skipped { existing } => {
            println!("  skipped: collection already holds {} documents", existing)
        }
    }
}
