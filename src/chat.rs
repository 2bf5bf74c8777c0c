//! Chat sessions.
//!
//! A [`Conversation`] is an append-only transcript. Every accepted user
//! message is followed by exactly one assistant turn: the generated
//! analysis, or a degraded fallback when retrieval or generation fails.
//! Failures never escape [`Conversation::submit`].

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use uuid::Uuid;

use crate::app::App;
use crate::assistant::Assistant;
use crate::config::Config;
use crate::dashboard::DASHBOARD;
use crate::models::ChatTurn;

const TITLE_MAX_CHARS: usize = 40;
const UNTITLED: &str = "New chat";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub turns: Vec<ChatTurn>,
}

/// Listing entry for the chat history sidebar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub turns: usize,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            title: UNTITLED.to_string(),
            created_at: Utc::now(),
            turns: Vec::new(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            title: self.title.clone(),
            created_at: self.created_at,
            turns: self.turns.len(),
        }
    }

    /// Append `input` and the assistant's reply. Blank input is ignored.
    ///
    /// Returns the assistant turn that was appended.
    pub async fn submit(&mut self, assistant: &Assistant, input: &str) -> Option<&ChatTurn> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if self.turns.is_empty() {
            self.title = make_title(input);
        }
        self.turns.push(ChatTurn::user(input));

        let reply = match assistant.answer(input).await {
            Ok(answer) => ChatTurn::assistant(answer.text),
            Err(e) => {
                tracing::warn!(session = %self.id, error = %format!("{:#}", e), "answer failed");
                ChatTurn::degraded(degraded_message(&e))
            }
        };
        self.turns.push(reply);
        self.turns.last()
    }
}

/// User-facing text for a failed answer.
pub fn degraded_message(err: &anyhow::Error) -> String {
    format!(
        "⚠️ The analysis engine is unavailable right now, so no answer could be generated. ({:#})",
        err
    )
}

fn make_title(input: &str) -> String {
    let line = input.lines().next().unwrap_or(input).trim();
    if line.chars().count() <= TITLE_MAX_CHARS {
        return line.to_string();
    }
    let truncated: String = line.chars().take(TITLE_MAX_CHARS).collect();
    format!("{}…", truncated.trim_end())
}

/// `foundry chat`: terminal chat over stdin. `exit` or EOF ends the session.
pub async fn run_chat(config: &Config) -> Result<()> {
    let app = App::open(config.clone()).await?;

    println!("🚀 FoundryBOT");
    println!();
    print!("{}", DASHBOARD.render_text());
    println!();
    if let Some(warning) = app.startup_warning() {
        println!("⚠️  {}", warning);
        println!();
    }
    println!("Ask about startups, ideas, markets... (type `exit` to quit)");

    let mut convo = Conversation::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    let result = loop {
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e.into()),
        };
        if matches!(line.trim(), "exit" | "quit") {
            break Ok(());
        }

        let Some(reply) = convo.submit(app.assistant(), &line).await else {
            continue;
        };
        println!();
        println!("{}", reply.content.trim_end());

        if let Some(transcripts) = app.transcripts() {
            if let Err(e) = transcripts.persist(convo.clone()).await {
                tracing::warn!(session = %convo.id, error = %format!("{:#}", e), "failed to save transcript");
            }
        }
    };

    app.shutdown().await;
    result
}
