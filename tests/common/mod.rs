#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use foundry::config::Config;
use foundry::embedding::EmbeddingProvider;
use foundry::generation::Generator;

pub const STARTUPS: &str = "name,city,founded_at,closed_at,age_last_funding_year,relationships,age_last_milestone_year
FitPulse,Bangalore,2011-04-01,,6,25,4
MedSnap,Delhi,2009-08-15,2013-02-01,2,8,1
PayLoop,Mumbai,2010-01-10,,5.5,31,2
LearnLoom,Chennai,2012-06-20,,1,12,3.5
GreenCart,Bangalore,2008-11-03,2012-09-30,4,21,0.5
GymBuddy AI,Pune,2014-02-11,,3,40,5
CodeNest,Hyderabad,2013-07-07,,7,2,1
";

pub const INDUSTRY: &str = "sector,startups,growth_rate
AI/ML,28,18%
Health,22,12%
Fitness,9,15%
Fintech,18,10%
";

/// Deterministic bag-of-words embedder: each lowercase word adds 1.0 to a hashed bucket.
pub struct BagOfWords {
    pub dims: usize,
    pub calls: AtomicUsize,
}

impl BagOfWords {
    pub fn new() -> Self {
        Self {
            dims: 64,
            calls: AtomicUsize::new(0),
        }
    }
}

fn bucket(word: &str, dims: usize) -> usize {
    // FNV-1a
    let mut h: u64 = 0xcbf29ce484222325;
    for b in word.bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    (h % dims as u64) as usize
}

#[async_trait]
impl EmbeddingProvider for BagOfWords {
    fn model_name(&self) -> &str {
        "bag-of-words"
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![0.0; self.dims];
                for word in t
                    .to_lowercase()
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|w| !w.is_empty())
                {
                    v[bucket(word, self.dims)] += 1.0;
                }
                v
            })
            .collect())
    }
}

/// Bag-of-words until `healthy` calls have been made, then every call fails.
pub struct Failing {
    pub inner: BagOfWords,
    pub healthy: usize,
}

#[async_trait]
impl EmbeddingProvider for Failing {
    fn model_name(&self) -> &str {
        "bag-of-words"
    }
    fn dims(&self) -> usize {
        self.inner.dims
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.inner.calls.load(Ordering::SeqCst) >= self.healthy {
            bail!("Ollama connection error: connection reset");
        }
        self.inner.embed(texts).await
    }
}

/// Replies with a fixed prefix and the prompt length.
pub struct EchoGenerator;

#[async_trait]
impl Generator for EchoGenerator {
    fn model_name(&self) -> &str {
        "echo"
    }
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(format!("ANALYSIS ({} chars)", prompt.len()))
    }
}

/// Behaves like an unreachable Ollama.
pub struct OfflineGenerator;

#[async_trait]
impl Generator for OfflineGenerator {
    fn model_name(&self) -> &str {
        "gemma3:1b"
    }
    async fn health_check(&self) -> Result<()> {
        bail!("Ollama connection error: connection refused")
    }
    async fn generate(&self, _prompt: &str) -> Result<String> {
        bail!("Ollama connection error: connection refused")
    }
}

/// Blocks inside `generate` until `release` is notified.
pub struct GatedGenerator {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[async_trait]
impl Generator for GatedGenerator {
    fn model_name(&self) -> &str {
        "gated"
    }
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok("ANALYSIS (gated)".to_string())
    }
}

/// Reachable only while `online` is set.
pub struct Switchable {
    pub online: Arc<AtomicBool>,
}

#[async_trait]
impl Generator for Switchable {
    fn model_name(&self) -> &str {
        "gemma3:1b"
    }
    async fn health_check(&self) -> Result<()> {
        if !self.online.load(Ordering::SeqCst) {
            bail!("Ollama connection error: connection refused");
        }
        Ok(())
    }
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.health_check().await?;
        Ok("ANALYSIS (switchable)".to_string())
    }
}

/// Write the two sample datasets and a config into `root`.
pub fn write_fixture(root: &Path, extra: &str) -> (PathBuf, Config) {
    let data = root.join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("startups.csv"), STARTUPS).unwrap();
    fs::write(data.join("industry.csv"), INDUSTRY).unwrap();

    let content = format!(
        r#"[db]
path = "{root}/data/foundry.sqlite"

[[datasets]]
name = "startup"
path = "{root}/data/startups.csv"
renderer = "startup"
top_k = 5

[[datasets]]
name = "industry"
path = "{root}/data/industry.csv"

[embedding]
batch_size = 3

{extra}
"#,
        root = root.display(),
        extra = extra,
    );

    let config_path = root.join("foundry.toml");
    fs::write(&config_path, &content).unwrap();
    let config: Config = toml::from_str(&content).unwrap();
    config.validate().unwrap();
    (config_path, config)
}
