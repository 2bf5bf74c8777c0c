//! Retrieval-augmented answering: retrieve, fill the prompt, generate.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::sync::Arc;

use crate::app::App;
use crate::chat::degraded_message;
use crate::config::Config;
use crate::generation::Generator;
use crate::prompt::render_prompt;
use crate::retrieve::{combined_text, Retrieval, RetrieverSet};

/// A generated analysis plus the records it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<Retrieval>,
}

#[derive(Clone)]
pub struct Assistant {
    retrievers: RetrieverSet,
    generator: Arc<dyn Generator>,
}

impl Assistant {
    pub fn new(retrievers: RetrieverSet, generator: Arc<dyn Generator>) -> Self {
        Self {
            retrievers,
            generator,
        }
    }

    pub fn retrievers(&self) -> &RetrieverSet {
        &self.retrievers
    }

    pub fn generator(&self) -> &Arc<dyn Generator> {
        &self.generator
    }

    /// Fill the template with `idea` and `retrieved_text` and return the model's raw text.
    pub async fn respond(&self, idea: &str, retrieved_text: &str) -> Result<String> {
        let prompt = render_prompt(idea, retrieved_text);
        self.generator
            .generate(&prompt)
            .await
            .with_context(|| format!("Generation failed ({})", self.generator.model_name()))
    }

    /// Retrieve from every dataset, then respond.
    pub async fn answer(&self, idea: &str) -> Result<Answer> {
        let sources = self
            .retrievers
            .retrieve_all(idea)
            .await
            .context("Retrieval failed")?;
        let text = self.respond(idea, &combined_text(&sources)).await?;
        Ok(Answer { text, sources })
    }
}

/// `foundry ask`: answer one idea and print the analysis with its sources.
pub async fn run_ask(config: &Config, idea: &str) -> Result<()> {
    if idea.trim().is_empty() {
        bail!("idea must not be empty");
    }

    let app = App::open(config.clone()).await?;
    if let Some(warning) = app.startup_warning() {
        println!("⚠️  {}", warning);
        println!();
    }

    match app.assistant().answer(idea.trim()).await {
        Ok(answer) => {
            println!("{}", answer.text.trim_end());
            println!();
            println!("Sources:");
            for retrieval in &answer.sources {
                for r in &retrieval.results {
                    println!("  [{:.3}] {} / {}", r.score, retrieval.dataset, r.document.id);
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "answer failed");
            println!("{}", degraded_message(&e));
        }
    }

    app.shutdown().await;
    Ok(())
}
