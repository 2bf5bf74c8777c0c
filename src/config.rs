//! TOML configuration.
//!
//! A single file describes the database location, the datasets to index,
//! the ingestion policy, the embedding and generation models, chat
//! persistence, and the HTTP bind address:
//!
//! ```toml
//! [db]
//! path = "./data/foundry.sqlite"
//!
//! [[datasets]]
//! name = "startup"
//! path = "./data/StartupDataset3.csv"
//! renderer = "startup"
//! top_k = 5
//!
//! [[datasets]]
//! name = "industry"
//! path = "./data/StartupDataset1.csv"
//!
//! [embedding]
//! provider = "ollama"
//! model = "mxbai-embed-large"
//! dims = 1024
//!
//! [generation]
//! model = "gemma3:1b"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::render::Renderer;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub datasets: Vec<DatasetConfig>,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// One CSV dataset and how to index and query it.
#[derive(Debug, Deserialize, Clone)]
pub struct DatasetConfig {
    /// Dataset tag; used for document ids, metadata, and the collection name.
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub renderer: Renderer,
    /// Number of nearest documents retrieved per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    3
}

impl DatasetConfig {
    /// Name of the vector collection backing this dataset.
    pub fn collection_name(&self) -> String {
        format!("{}_collection", self.name)
    }
}

/// When a non-empty collection is re-seeded at startup.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IngestPolicy {
    /// Seed only when the collection holds no documents.
    #[default]
    IfEmpty,
    /// Also re-seed when the source file's SHA-256 no longer matches the
    /// fingerprint recorded at the last seeding.
    ContentHash,
}

impl IngestPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestPolicy::IfEmpty => "if_empty",
            IngestPolicy::ContentHash => "content_hash",
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct IngestConfig {
    #[serde(default)]
    pub policy: IngestPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    /// Unset means the provider's default; see [`EmbeddingConfig::model_name`].
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL override (Ollama host, or an OpenAI-compatible endpoint).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

fn default_embedding_provider() -> String {
    "ollama".to_string()
}
const OLLAMA_DEFAULT_MODEL: &str = "mxbai-embed-large";
const OLLAMA_DEFAULT_DIMS: usize = 1024;
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_embedding_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }

    /// The configured model, or `mxbai-embed-large` for Ollama.
    pub fn model_name(&self) -> Option<&str> {
        match (self.model.as_deref(), self.provider.as_str()) {
            (Some(model), _) => Some(model),
            (None, "ollama") => Some(OLLAMA_DEFAULT_MODEL),
            (None, _) => None,
        }
    }

    /// The configured dimensions. Ollama's default model implies 1024.
    pub fn dimensions(&self) -> Option<usize> {
        match (self.dims, self.model.as_deref(), self.provider.as_str()) {
            (Some(dims), _, _) => Some(dims),
            (None, None, "ollama") => Some(OLLAMA_DEFAULT_DIMS),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_provider")]
    pub provider: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            model: default_generation_model(),
            url: None,
            temperature: None,
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

fn default_generation_provider() -> String {
    "ollama".to_string()
}
fn default_generation_model() -> String {
    "gemma3:1b".to_string()
}
fn default_generation_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ChatConfig {
    /// Directory for persisted transcripts. Conversations live only in
    /// memory when unset.
    #[serde(default)]
    pub history_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}

impl Config {
    /// Look up a dataset by name.
    pub fn dataset(&self, name: &str) -> Option<&DatasetConfig> {
        self.datasets.iter().find(|d| d.name == name)
    }

    /// Check cross-field constraints that serde can't express.
    pub fn validate(&self) -> Result<()> {
        if self.datasets.is_empty() {
            bail!("at least one [[datasets]] entry is required");
        }

        let mut seen = HashSet::new();
        for dataset in &self.datasets {
            if dataset.name.trim().is_empty() {
                bail!("datasets.name must not be empty");
            }
            if !dataset
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                bail!(
                    "datasets.name '{}' may only contain letters, digits, '_' and '-'",
                    dataset.name
                );
            }
            if !seen.insert(dataset.name.as_str()) {
                bail!("duplicate dataset name: '{}'", dataset.name);
            }
            if dataset.top_k == 0 {
                bail!("datasets.top_k must be >= 1 (dataset '{}')", dataset.name);
            }
        }

        if self.embedding.batch_size == 0 {
            bail!("embedding.batch_size must be > 0");
        }

        match self.embedding.provider.as_str() {
            "disabled" | "ollama" | "openai" | "local" => {}
            other => bail!(
                "Unknown embedding provider: '{}'. Must be disabled, ollama, openai, or local.",
                other
            ),
        }

        if self.embedding.is_enabled() && self.embedding.provider != "local" {
            if self.embedding.dimensions().unwrap_or(0) == 0 {
                bail!(
                    "embedding.dims must be > 0 when provider is '{}'",
                    self.embedding.provider
                );
            }
            if self.embedding.model_name().is_none() {
                bail!(
                    "embedding.model must be specified when provider is '{}'",
                    self.embedding.provider
                );
            }
        }

        match self.generation.provider.as_str() {
            "disabled" | "ollama" => {}
            other => bail!(
                "Unknown generation provider: '{}'. Must be disabled or ollama.",
                other
            ),
        }

        if let Some(t) = self.generation.temperature {
            if !(0.0..=2.0).contains(&t) {
                bail!("generation.temperature must be in [0.0, 2.0]");
            }
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[db]
path = "./data/foundry.sqlite"

[[datasets]]
name = "startup"
path = "./data/startups.csv"
renderer = "startup"
top_k = 5

[[datasets]]
name = "industry"
path = "./data/industry.csv"
"#;

    fn parse(s: &str) -> Config {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = parse(MINIMAL);
        cfg.validate().unwrap();

        assert_eq!(cfg.datasets[0].renderer, Renderer::Startup);
        assert_eq!(cfg.datasets[0].top_k, 5);
        assert_eq!(cfg.datasets[1].renderer, Renderer::Generic);
        assert_eq!(cfg.datasets[1].top_k, 3);
        assert_eq!(cfg.datasets[1].collection_name(), "industry_collection");
        assert_eq!(cfg.ingest.policy, IngestPolicy::IfEmpty);
        assert_eq!(cfg.embedding.provider, "ollama");
        assert_eq!(cfg.embedding.model_name(), Some("mxbai-embed-large"));
        assert_eq!(cfg.embedding.dimensions(), Some(1024));
        assert_eq!(cfg.generation.model, "gemma3:1b");
        assert!(cfg.chat.history_dir.is_none());
        assert_eq!(cfg.server.bind, "127.0.0.1:8501");
    }

    #[test]
    fn test_content_hash_policy() {
        let cfg = parse(&format!("{}\n[ingest]\npolicy = \"content_hash\"\n", MINIMAL));
        assert_eq!(cfg.ingest.policy, IngestPolicy::ContentHash);
    }

    #[test]
    fn test_rejects_duplicate_dataset() {
        let cfg = parse(&format!(
            "{}\n[[datasets]]\nname = \"startup\"\npath = \"x.csv\"\n",
            MINIMAL
        ));
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("duplicate"), "{}", err);
    }

    #[test]
    fn test_rejects_zero_top_k() {
        let cfg = parse(&MINIMAL.replace("top_k = 5", "top_k = 0"));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_providers() {
        let cfg = parse(&format!("{}\n[embedding]\nprovider = \"magic\"\n", MINIMAL));
        assert!(cfg.validate().is_err());

        let cfg = parse(&format!("{}\n[generation]\nprovider = \"magic\"\n", MINIMAL));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_enabled_embedding_requires_dims() {
        let cfg = parse(&format!(
            "{}\n[embedding]\nprovider = \"openai\"\nmodel = \"text-embedding-3-small\"\ndims = 0\n",
            MINIMAL
        ));
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("dims"), "{}", err);
    }

    #[test]
    fn test_openai_requires_explicit_model() {
        let cfg = parse(&format!(
            "{}\n[embedding]\nprovider = \"openai\"\ndims = 1536\n",
            MINIMAL
        ));
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("embedding.model"), "{}", err);
    }

    #[test]
    fn test_custom_ollama_model_requires_dims() {
        let cfg = parse(&format!(
            "{}\n[embedding]\nmodel = \"nomic-embed-text\"\n",
            MINIMAL
        ));
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("dims"), "{}", err);

        let cfg = parse(&format!(
            "{}\n[embedding]\nbatch_size = 8\n",
            MINIMAL
        ));
        cfg.validate().unwrap();
        assert_eq!(cfg.embedding.dimensions(), Some(1024));
    }

    #[test]
    fn test_disabled_embedding_needs_nothing() {
        let cfg = parse(&format!("{}\n[embedding]\nprovider = \"disabled\"\n", MINIMAL));
        cfg.validate().unwrap();
        assert!(!cfg.embedding.is_enabled());
    }

    #[test]
    fn test_dataset_name_charset() {
        let cfg = parse(&MINIMAL.replace("name = \"industry\"", "name = \"in dustry\""));
        assert!(cfg.validate().is_err());
    }
}
