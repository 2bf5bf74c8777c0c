//! SQLite-backed [`VectorStore`].
//!
//! Every collection shares one database: a `collections` row holds the
//! fingerprint, and `documents` rows hold content, metadata, and the
//! embedding as a little-endian `f32` BLOB. Similarity is computed in Rust
//! over the collection's vectors.

use anyhow::{bail, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::path::Path;

use crate::db;
use crate::embedding::{blob_to_vec, vec_to_blob};
use crate::migrate;
use crate::models::{Document, DocumentMetadata, ScoredDocument};

use super::{rank, CollectionStats, VectorStore};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and apply migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = db::connect_path(path).await?;
        migrate::apply(&pool).await?;
        Ok(Self { pool })
    }
}

async fn touch_collection<'e, E>(executor: E, collection: &str, now: i64) -> Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO collections (name, fingerprint, created_at, updated_at)
        VALUES (?, NULL, ?, ?)
        ON CONFLICT(name) DO UPDATE SET updated_at = excluded.updated_at
        "#,
    )
    .bind(collection)
    .bind(now)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn count(&self, collection: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert(
        &self,
        collection: &str,
        docs: &[Document],
        vectors: &[Vec<f32>],
        model: &str,
    ) -> Result<()> {
        if docs.len() != vectors.len() {
            bail!(
                "insert into {}: {} documents but {} vectors",
                collection,
                docs.len(),
                vectors.len()
            );
        }

        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;
        touch_collection(&mut *tx, collection, now).await?;

        for (doc, vector) in docs.iter().zip(vectors.iter()) {
            let metadata_json = serde_json::to_string(&doc.metadata)?;
            sqlx::query(
                r#"
                INSERT INTO documents (collection, id, content, metadata_json, embedding, model, dims, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(collection, id) DO UPDATE SET
                    content = excluded.content,
                    metadata_json = excluded.metadata_json,
                    embedding = excluded.embedding,
                    model = excluded.model,
                    dims = excluded.dims,
                    created_at = excluded.created_at
                "#,
            )
            .bind(collection)
            .bind(&doc.id)
            .bind(&doc.content)
            .bind(&metadata_json)
            .bind(vec_to_blob(vector))
            .bind(model)
            .bind(vector.len() as i64)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredDocument>> {
        let rows = sqlx::query(
            r#"
            SELECT id, content, metadata_json, embedding
            FROM documents
            WHERE collection = ?
            ORDER BY seq
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        let mut candidates = Vec::with_capacity(rows.len());
        for row in &rows {
            let metadata_json: String = row.get("metadata_json");
            let metadata: DocumentMetadata =
                serde_json::from_str(&metadata_json).unwrap_or_else(|_| DocumentMetadata {
                    source: collection.to_string(),
                });
            let blob: Vec<u8> = row.get("embedding");
            candidates.push((
                Document {
                    id: row.get("id"),
                    content: row.get("content"),
                    metadata,
                },
                blob_to_vec(&blob),
            ));
        }

        Ok(rank(
            vector,
            candidates.iter().map(|(d, v)| (d.clone(), v.as_slice())),
            k,
        ))
    }

    async fn clear(&self, collection: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ?")
            .bind(collection)
            .execute(&self.pool)
            .await?;
        touch_collection(&self.pool, collection, chrono::Utc::now().timestamp()).await?;
        Ok(result.rows_affected())
    }

    async fn fingerprint(&self, collection: &str) -> Result<Option<String>> {
        let fingerprint: Option<Option<String>> =
            sqlx::query_scalar("SELECT fingerprint FROM collections WHERE name = ?")
                .bind(collection)
                .fetch_optional(&self.pool)
                .await?;
        Ok(fingerprint.flatten())
    }

    async fn set_fingerprint(&self, collection: &str, fingerprint: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO collections (name, fingerprint, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                fingerprint = excluded.fingerprint,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(collection)
        .bind(fingerprint)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn collections(&self) -> Result<Vec<CollectionStats>> {
        let rows = sqlx::query(
            r#"
            SELECT c.name, c.fingerprint, c.updated_at,
                   (SELECT COUNT(*) FROM documents d WHERE d.collection = c.name) AS documents
            FROM collections c
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| CollectionStats {
                name: row.get("name"),
                documents: row.get("documents"),
                fingerprint: row.get("fingerprint"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
