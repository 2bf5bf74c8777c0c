//! In-memory [`VectorStore`] for tests and ephemeral sessions.
//!
//! Collections live in a `HashMap` behind `std::sync::RwLock`. Queries are
//! brute-force cosine similarity over every stored vector.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::models::{Document, ScoredDocument};

use super::{rank, CollectionStats, VectorStore};

#[derive(Default)]
struct MemCollection {
    entries: Vec<(Document, Vec<f32>)>,
    fingerprint: Option<String>,
    updated_at: Option<i64>,
}

/// Process-local store; contents vanish when it is dropped.
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, MemCollection>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn count(&self, collection: &str) -> Result<i64> {
        let guard = self.collections.read().map_err(|_| poisoned())?;
        Ok(guard
            .get(collection)
            .map(|c| c.entries.len() as i64)
            .unwrap_or(0))
    }

    async fn insert(
        &self,
        collection: &str,
        docs: &[Document],
        vectors: &[Vec<f32>],
        _model: &str,
    ) -> Result<()> {
        if docs.len() != vectors.len() {
            bail!(
                "insert into {}: {} documents but {} vectors",
                collection,
                docs.len(),
                vectors.len()
            );
        }

        let mut guard = self.collections.write().map_err(|_| poisoned())?;
        let entry = guard.entry(collection.to_string()).or_default();
        for (doc, vector) in docs.iter().zip(vectors.iter()) {
            match entry.entries.iter_mut().find(|(d, _)| d.id == doc.id) {
                Some(existing) => *existing = (doc.clone(), vector.clone()),
                None => entry.entries.push((doc.clone(), vector.clone())),
            }
        }
        entry.updated_at = Some(chrono::Utc::now().timestamp());
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredDocument>> {
        let guard = self.collections.read().map_err(|_| poisoned())?;
        let Some(entry) = guard.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(rank(
            vector,
            entry
                .entries
                .iter()
                .map(|(doc, v)| (doc.clone(), v.as_slice())),
            k,
        ))
    }

    async fn clear(&self, collection: &str) -> Result<u64> {
        let mut guard = self.collections.write().map_err(|_| poisoned())?;
        Ok(guard
            .get_mut(collection)
            .map(|c| {
                let removed = c.entries.len() as u64;
                c.entries.clear();
                c.updated_at = Some(chrono::Utc::now().timestamp());
                removed
            })
            .unwrap_or(0))
    }

    async fn fingerprint(&self, collection: &str) -> Result<Option<String>> {
        let guard = self.collections.read().map_err(|_| poisoned())?;
        Ok(guard.get(collection).and_then(|c| c.fingerprint.clone()))
    }

    async fn set_fingerprint(&self, collection: &str, fingerprint: &str) -> Result<()> {
        let mut guard = self.collections.write().map_err(|_| poisoned())?;
        let entry = guard.entry(collection.to_string()).or_default();
        entry.fingerprint = Some(fingerprint.to_string());
        entry.updated_at = Some(chrono::Utc::now().timestamp());
        Ok(())
    }

    async fn collections(&self) -> Result<Vec<CollectionStats>> {
        let guard = self.collections.read().map_err(|_| poisoned())?;
        let mut stats: Vec<CollectionStats> = guard
            .iter()
            .map(|(name, c)| CollectionStats {
                name: name.clone(),
                documents: c.entries.len() as i64,
                fingerprint: c.fingerprint.clone(),
                updated_at: c.updated_at,
            })
            .collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stats)
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentMetadata;

    fn doc(id: &str, content: &str) -> Document {
        Document {
            id: id.to_string(),
            content: content.to_string(),
            metadata: DocumentMetadata {
                source: "startup".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_insert_count_and_overwrite() {
        let store = InMemoryStore::new();
        assert_eq!(store.count("c").await.unwrap(), 0);

        store
            .insert(
                "c",
                &[doc("startup_0", "a"), doc("startup_1", "b")],
                &[vec![1.0, 0.0], vec![0.0, 1.0]],
                "m",
            )
            .await
            .unwrap();
        assert_eq!(store.count("c").await.unwrap(), 2);

        store
            .insert("c", &[doc("startup_0", "a2")], &[vec![1.0, 0.0]], "m")
            .await
            .unwrap();
        assert_eq!(store.count("c").await.unwrap(), 2);

        let hits = store.query("c", &[1.0, 0.0], 1).await.unwrap();
        assert_eq!(hits[0].document.content, "a2");
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = InMemoryStore::new();
        store
            .insert("one", &[doc("x_0", "x")], &[vec![1.0]], "m")
            .await
            .unwrap();
        assert_eq!(store.count("two").await.unwrap(), 0);
        assert!(store.query("two", &[1.0], 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_and_fingerprint() {
        let store = InMemoryStore::new();
        store
            .insert("c", &[doc("a_0", "a")], &[vec![1.0]], "m")
            .await
            .unwrap();
        store.set_fingerprint("c", "abc").await.unwrap();

        assert_eq!(store.clear("c").await.unwrap(), 1);
        assert_eq!(store.count("c").await.unwrap(), 0);
        assert_eq!(store.fingerprint("c").await.unwrap().as_deref(), Some("abc"));

        let stats = store.collections().await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].documents, 0);
    }

    #[tokio::test]
    async fn test_mismatched_vectors_rejected() {
        let store = InMemoryStore::new();
        assert!(store
            .insert("c", &[doc("a_0", "a")], &[], "m")
            .await
            .is_err());
    }
}
