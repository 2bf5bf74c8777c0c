//! Vector storage for dataset collections.
//!
//! The [`VectorStore`] trait defines the handful of operations ingestion and
//! retrieval need: count, bulk insert, nearest-neighbour query, clear, and
//! fingerprint bookkeeping. Two backends implement it:
//!
//! - [`SqliteStore`]: persistent, one SQLite database holding every collection.
//! - [`InMemoryStore`]: process-local, for tests and throwaway sessions.
//!
//! A [`Collection`] binds one named collection of a store to an embedding
//! provider, so callers work with text rather than vectors.
//!
//! Store handles are constructed explicitly and shared as
//! `Arc<dyn VectorStore>`; call [`VectorStore::close`] on shutdown.

pub mod memory;
pub mod sqlite;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::embedding::{embed_query, EmbeddingProvider};
use crate::models::{Document, ScoredDocument};

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Summary of one collection, for `foundry stats` and the dashboard API.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionStats {
    pub name: String,
    pub documents: i64,
    pub fingerprint: Option<String>,
    pub updated_at: Option<i64>,
}

/// Abstract storage backend for embedded documents.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`count`](VectorStore::count) | Number of documents in a collection (0 if it doesn't exist) |
/// | [`insert`](VectorStore::insert) | Bulk insert documents with their vectors, keyed by id |
/// | [`query`](VectorStore::query) | Top-k documents by cosine similarity |
/// | [`clear`](VectorStore::clear) | Delete every document in a collection |
/// | [`fingerprint`](VectorStore::fingerprint) | Source fingerprint recorded at seeding |
/// | [`set_fingerprint`](VectorStore::set_fingerprint) | Record the source fingerprint |
/// | [`collections`](VectorStore::collections) | Per-collection stats |
/// | [`close`](VectorStore::close) | Flush and release resources |
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn count(&self, collection: &str) -> Result<i64>;

    /// Insert documents and their vectors. `vectors[i]` belongs to `docs[i]`.
    ///
    /// A document whose id already exists in the collection is overwritten in place.
    async fn insert(
        &self,
        collection: &str,
        docs: &[Document],
        vectors: &[Vec<f32>],
        model: &str,
    ) -> Result<()>;

    /// Return up to `k` documents ordered by descending cosine similarity.
    ///
    /// Equal scores keep insertion order, so results are deterministic for
    /// unchanged contents.
    async fn query(&self, collection: &str, vector: &[f32], k: usize)
        -> Result<Vec<ScoredDocument>>;

    /// Delete all documents in a collection. Returns the number removed.
    async fn clear(&self, collection: &str) -> Result<u64>;

    async fn fingerprint(&self, collection: &str) -> Result<Option<String>>;

    async fn set_fingerprint(&self, collection: &str, fingerprint: &str) -> Result<()>;

    async fn collections(&self) -> Result<Vec<CollectionStats>>;

    async fn close(&self);
}

/// Rank `(document, vector)` candidates against `query` and keep the top `k`.
///
/// Shared by both backends. Candidates must be in insertion order; the sort
/// is stable so ties keep that order.
pub(crate) fn rank<'a, I>(query: &[f32], candidates: I, k: usize) -> Vec<ScoredDocument>
where
    I: IntoIterator<Item = (Document, &'a [f32])>,
{
    let mut scored: Vec<ScoredDocument> = candidates
        .into_iter()
        .map(|(document, vector)| ScoredDocument {
            score: crate::embedding::cosine_similarity(query, vector),
            document,
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(k);
    scored
}

/// A named collection in a store, paired with the provider that embeds its text.
#[derive(Clone)]
pub struct Collection {
    name: String,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl Collection {
    pub fn new(
        name: impl Into<String>,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        batch_size: usize,
    ) -> Self {
        Self {
            name: name.into(),
            store,
            embedder,
            batch_size: batch_size.max(1),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn count(&self) -> Result<i64> {
        self.store.count(&self.name).await
    }

    /// Embed and insert documents. Returns the number inserted.
    ///
    /// Nothing is written unless every batch embeds, so a failure leaves the
    /// collection as it was.
    pub async fn add_documents(&self, docs: &[Document]) -> Result<usize> {
        let vectors = self.embed_documents(docs).await?;
        self.insert_embedded(docs, &vectors).await
    }

    /// Embed every document's content, `batch_size` texts per provider call.
    pub async fn embed_documents(&self, docs: &[Document]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(docs.len());

        for batch in docs.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|d| d.content.clone()).collect();
            let embedded = self.embedder.embed(&texts).await?;
            if embedded.len() != batch.len() {
                bail!(
                    "embedder returned {} vectors for {} documents",
                    embedded.len(),
                    batch.len()
                );
            }
            vectors.extend(embedded);
            tracing::debug!(
                collection = %self.name,
                embedded = vectors.len(),
                total = docs.len(),
                "embedded batch"
            );
        }

        Ok(vectors)
    }

    /// Insert documents with vectors from [`embed_documents`](Self::embed_documents)
    /// in one store write.
    pub async fn insert_embedded(&self, docs: &[Document], vectors: &[Vec<f32>]) -> Result<usize> {
        self.store
            .insert(&self.name, docs, vectors, self.embedder.model_name())
            .await?;
        Ok(docs.len())
    }

    /// Embed `query` and return the `k` nearest documents.
    pub async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>> {
        let vector = embed_query(self.embedder.as_ref(), query).await?;
        self.store.query(&self.name, &vector, k).await
    }

    pub async fn clear(&self) -> Result<u64> {
        self.store.clear(&self.name).await
    }

    pub async fn fingerprint(&self) -> Result<Option<String>> {
        self.store.fingerprint(&self.name).await
    }

    pub async fn set_fingerprint(&self, fingerprint: &str) -> Result<()> {
        self.store.set_fingerprint(&self.name, fingerprint).await
    }
}
