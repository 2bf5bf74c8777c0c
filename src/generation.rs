//! Text generation backends.
//!
//! A [`Generator`] turns a prompt into plain text. The only remote backend is
//! Ollama's `/api/generate` endpoint, called non-streaming; the response
//! text is returned as-is with no structured parsing.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::GenerationConfig;

#[async_trait]
pub trait Generator: Send + Sync {
    fn model_name(&self) -> &str;

    /// Check that the backend is reachable and the model is available.
    async fn health_check(&self) -> Result<()>;

    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Create the generator selected by `config.provider`.
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledGenerator)),
        "ollama" => Ok(Arc::new(OllamaGenerator::new(config)?)),
        other => bail!("Unknown generation provider: {}", other),
    }
}

// ============ Disabled ============

pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn health_check(&self) -> Result<()> {
        bail!("Generation is disabled. Set [generation] provider in config.")
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        bail!("Generation is disabled. Set [generation] provider in config.")
    }
}

// ============ Ollama ============

/// Generator backed by a local Ollama instance (default `http://localhost:11434`).
pub struct OllamaGenerator {
    model: String,
    url: String,
    temperature: Option<f32>,
    client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434".to_string());
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model: config.model.clone(),
            url: url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            client,
        })
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });
        if let Some(t) = self.temperature {
            body["options"] = serde_json::json!({ "temperature": t });
        }
        body
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<()> {
        let endpoint = format!("{}/api/tags", self.url);
        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| anyhow!("Ollama connection error: {} (is Ollama running at {}?)", e, self.url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Ollama API error {}", status);
        }

        let json: serde_json::Value = response.json().await?;
        if !has_model(&json, &self.model) {
            bail!(
                "Model '{}' is not available in Ollama (try `ollama pull {}`)",
                self.model,
                self.model
            );
        }
        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let endpoint = format!("{}/api/generate", self.url);
        let response = self
            .client
            .post(&endpoint)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| anyhow!("Ollama connection error: {} (is Ollama running at {}?)", e, self.url))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Ollama API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_generate_response(&json)
    }
}

fn parse_generate_response(json: &serde_json::Value) -> Result<String> {
    if let Some(err) = json.get("error").and_then(|e| e.as_str()) {
        bail!("Ollama error: {}", err);
    }
    json.get("response")
        .and_then(|r| r.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("Invalid Ollama response: missing response field"))
}

/// Whether the `/api/tags` listing contains `model`. A bare name matches its `:latest` tag.
fn has_model(tags: &serde_json::Value, model: &str) -> bool {
    let Some(models) = tags.get("models").and_then(|m| m.as_array()) else {
        return false;
    };
    models
        .iter()
        .filter_map(|m| m.get("name").and_then(|n| n.as_str()))
        .any(|name| name == model || name.strip_suffix(":latest") == Some(model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_generate_response() {
        let json = json!({"model": "gemma3:1b", "response": "1. Survival Patterns ...", "done": true});
        assert_eq!(
            parse_generate_response(&json).unwrap(),
            "1. Survival Patterns ..."
        );
    }

    #[test]
    fn test_parse_generate_error() {
        let json = json!({"error": "model 'gemma3:1b' not found"});
        let err = parse_generate_response(&json).unwrap_err().to_string();
        assert!(err.contains("not found"), "{}", err);
        assert!(parse_generate_response(&json!({"done": true})).is_err());
    }

    #[test]
    fn test_has_model() {
        let tags = json!({"models": [{"name": "gemma3:1b"}, {"name": "mxbai-embed-large:latest"}]});
        assert!(has_model(&tags, "gemma3:1b"));
        assert!(has_model(&tags, "mxbai-embed-large"));
        assert!(!has_model(&tags, "gemma3:4b"));
        assert!(!has_model(&json!({}), "gemma3:1b"));
    }

    #[test]
    fn test_request_body_options() {
        let mut config = GenerationConfig::default();
        let g = OllamaGenerator::new(&config).unwrap();
        let body = g.request_body("hi");
        assert_eq!(body["stream"], false);
        assert_eq!(body["model"], "gemma3:1b");
        assert!(body.get("options").is_none());

        config.temperature = Some(0.5);
        config.url = Some("http://ollama:11434/".into());
        let g = OllamaGenerator::new(&config).unwrap();
        assert_eq!(g.url, "http://ollama:11434");
        assert_eq!(g.request_body("hi")["options"]["temperature"], 0.5);
    }

    #[tokio::test]
    async fn test_disabled_generator_errors() {
        let g = create_generator(&GenerationConfig {
            provider: "disabled".into(),
            ..GenerationConfig::default()
        })
        .unwrap();
        assert!(g.health_check().await.is_err());
        assert!(g.generate("x").await.is_err());
    }
}
