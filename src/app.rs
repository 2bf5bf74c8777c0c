//! Process-wide resources, assembled once at startup.
//!
//! [`App::open`] builds everything from configuration: the SQLite store, the
//! embedding provider, the generator, and the retrievers. Every dataset is
//! seeded before the first query, and the generator is probed. A failed
//! probe is kept as [`App::startup_warning`] rather than aborting: the
//! assistant keeps answering, with degraded messages, until the model
//! becomes reachable. [`App::generator_warning`] probes again on demand.

use anyhow::Result;
use std::sync::Arc;

use crate::assistant::Assistant;
use crate::config::Config;
use crate::embedding::{create_provider, EmbeddingProvider};
use crate::generation::{create_generator, Generator};
use crate::ingest::{ingest_dataset, IngestOutcome};
use crate::retrieve::RetrieverSet;
use crate::store::{SqliteStore, VectorStore};
use crate::transcript::TranscriptStore;

pub struct App {
    config: Config,
    store: Arc<dyn VectorStore>,
    assistant: Assistant,
    transcripts: Option<TranscriptStore>,
    startup_warning: Option<String>,
}

impl App {
    /// Open the configured backends, seed every dataset, and probe the generator.
    pub async fn open(config: Config) -> Result<Self> {
        let store: Arc<dyn VectorStore> = Arc::new(SqliteStore::open(&config.db.path).await?);
        let embedder = create_provider(&config.embedding)?;
        let generator = create_generator(&config.generation)?;
        Self::from_parts(config, store, embedder, generator).await
    }

    /// Assemble an app from explicit backends.
    ///
    /// On a seeding failure the store is closed before the error is returned.
    pub async fn from_parts(
        config: Config,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        if let Err(e) = seed_all(&config, &store, &embedder).await {
            store.close().await;
            return Err(e);
        }

        let transcripts = match &config.chat.history_dir {
            Some(dir) => Some(TranscriptStore::open(dir)?),
            None => None,
        };

        let startup_warning = probe_generator(generator.as_ref()).await;
        if let Some(warning) = &startup_warning {
            tracing::warn!("{}", warning);
        }

        let retrievers = RetrieverSet::from_config(&config, store.clone(), embedder);

        Ok(Self {
            assistant: Assistant::new(retrievers, generator),
            config,
            store,
            transcripts,
            startup_warning,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    pub fn transcripts(&self) -> Option<&TranscriptStore> {
        self.transcripts.as_ref()
    }

    /// Set when the generator failed its startup probe. Not updated afterwards.
    pub fn startup_warning(&self) -> Option<&str> {
        self.startup_warning.as_deref()
    }

    /// Probe the generator now. `None` when it is reachable.
    pub async fn generator_warning(&self) -> Option<String> {
        probe_generator(self.assistant.generator().as_ref()).await
    }

    /// Release the store. Call once, after the last request.
    pub async fn shutdown(&self) {
        self.store.close().await;
    }
}

async fn probe_generator(generator: &dyn Generator) -> Option<String> {
    generator.health_check().await.err().map(|e| {
        format!(
            "Generation model '{}' is unavailable: {:#}",
            generator.model_name(),
            e
        )
    })
}

async fn seed_all(
    config: &Config,
    store: &Arc<dyn VectorStore>,
    embedder: &Arc<dyn EmbeddingProvider>,
) -> Result<()> {
    for dataset in &config.datasets {
        let outcome = ingest_dataset(
            dataset,
            store.clone(),
            embedder.clone(),
            config.embedding.batch_size,
            config.ingest.policy,
            false,
        )
        .await?;
        if let IngestOutcome::Seeded { documents } | IngestOutcome::Reseeded { documents } = outcome
        {
            tracing::info!(dataset = %dataset.name, documents, "collection ready");
        }
    }
    Ok(())
}
