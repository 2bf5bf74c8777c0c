//! Top-k retrieval over dataset collections.
//!
//! One [`Retriever`] per configured dataset, each with a fixed `k`. A
//! [`RetrieverSet`] queries them all in configuration order; no re-ranking,
//! filtering, or cross-collection dedup is applied.

use anyhow::{bail, Result};
use serde::Serialize;
use std::sync::Arc;

use crate::config::{Config, DatasetConfig};
use crate::embedding::{create_provider, EmbeddingProvider};
use crate::models::ScoredDocument;
use crate::store::{Collection, SqliteStore, VectorStore};

/// Fixed top-k nearest-neighbour query against one dataset's collection.
#[derive(Clone)]
pub struct Retriever {
    dataset: String,
    collection: Collection,
    k: usize,
}

impl Retriever {
    pub fn new(dataset: impl Into<String>, collection: Collection, k: usize) -> Self {
        Self {
            dataset: dataset.into(),
            collection,
            k,
        }
    }

    /// Build the retriever for a configured dataset.
    pub fn for_dataset(
        dataset: &DatasetConfig,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        batch_size: usize,
    ) -> Self {
        Self::new(
            dataset.name.clone(),
            Collection::new(dataset.collection_name(), store, embedder, batch_size),
            dataset.top_k,
        )
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Up to `k` documents, most similar first.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredDocument>> {
        self.collection.similarity_search(query, self.k).await
    }
}

/// Results from one dataset.
#[derive(Debug, Clone, Serialize)]
pub struct Retrieval {
    pub dataset: String,
    pub results: Vec<ScoredDocument>,
}

/// All retrievers, in configuration order.
#[derive(Clone, Default)]
pub struct RetrieverSet {
    retrievers: Vec<Retriever>,
}

impl RetrieverSet {
    pub fn new(retrievers: Vec<Retriever>) -> Self {
        Self { retrievers }
    }

    pub fn from_config(
        config: &Config,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self::new(
            config
                .datasets
                .iter()
                .map(|d| {
                    Retriever::for_dataset(
                        d,
                        store.clone(),
                        embedder.clone(),
                        config.embedding.batch_size,
                    )
                })
                .collect(),
        )
    }

    pub fn get(&self, dataset: &str) -> Option<&Retriever> {
        self.retrievers.iter().find(|r| r.dataset == dataset)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Retriever> {
        self.retrievers.iter()
    }

    /// Query every dataset. The first failure aborts the whole call.
    pub async fn retrieve_all(&self, query: &str) -> Result<Vec<Retrieval>> {
        let mut all = Vec::with_capacity(self.retrievers.len());
        for retriever in &self.retrievers {
            all.push(Retrieval {
                dataset: retriever.dataset.clone(),
                results: retriever.retrieve(query).await?,
            });
        }
        Ok(all)
    }
}

/// Retrieved content, one document per line, in dataset then rank order.
pub fn combined_text(retrievals: &[Retrieval]) -> String {
    retrievals
        .iter()
        .flat_map(|r| r.results.iter())
        .map(|r| r.document.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// `foundry search`: print the nearest documents for `query` from the index.
pub async fn run_search(config: &Config, query: &str, dataset_filter: Option<&str>) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    if !config.embedding.is_enabled() {
        bail!("Search requires embeddings. Set [embedding] provider in config.");
    }

    if let Some(name) = dataset_filter {
        if config.dataset(name).is_none() {
            bail!("Unknown dataset: '{}'", name);
        }
    }

    let store: Arc<dyn VectorStore> = Arc::new(SqliteStore::open(&config.db.path).await?);
    let embedder = create_provider(&config.embedding)?;
    let retrievers = RetrieverSet::from_config(config, store.clone(), embedder);

    let mut printed = 0;
    let mut outcome = Ok(());
    for retriever in retrievers.iter() {
        if dataset_filter.is_some_and(|name| name != retriever.dataset()) {
            continue;
        }
        let results = match retriever.retrieve(query).await {
            Ok(results) => results,
            Err(e) => {
                outcome = Err(e);
                break;
            }
        };
        for (i, result) in results.iter().enumerate() {
            println!(
                "{}. [{:.3}] {} / {}",
                i + 1,
                result.score,
                retriever.dataset(),
                result.document.id
            );
            println!(
                "    excerpt: \"{}\"",
                result.document.content.replace('\n', " ").trim()
            );
            println!();
            printed += 1;
        }
    }

    store.close().await;
    outcome?;

    if printed == 0 {
        println!("No results.");
    }
    Ok(())
}
