//! Durable chat transcripts.
//!
//! Each [`Conversation`] is written as pretty-printed JSON to
//! `<history_dir>/<session-id>.json`. The store is optional; without it
//! sessions live only in process memory.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::chat::{Conversation, SessionSummary};

#[derive(Debug, Clone)]
pub struct TranscriptStore {
    dir: PathBuf,
}

impl TranscriptStore {
    /// Use `dir` for transcripts, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create history directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Write `conversation`, replacing any earlier copy.
    pub fn save(&self, conversation: &Conversation) -> Result<()> {
        let json = serde_json::to_string_pretty(conversation)?;
        let path = self.path_for(conversation.id);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write transcript: {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to write transcript: {}", path.display()))?;
        Ok(())
    }

    /// [`save`](Self::save) on the blocking thread pool, for async callers.
    pub async fn persist(&self, conversation: Conversation) -> Result<()> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.save(&conversation))
            .await
            .context("Transcript writer task failed")?
    }

    /// Load one transcript; `None` if it was never saved.
    pub fn load(&self, id: Uuid) -> Result<Option<Conversation>> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(read_conversation(&path)?))
    }

    /// Every saved conversation, newest first. Unreadable files are skipped.
    pub fn load_all(&self) -> Result<Vec<Conversation>> {
        let mut conversations = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_conversation(&path) {
                Ok(c) => conversations.push(c),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping transcript"),
            }
        }
        conversations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(conversations)
    }

    pub fn list(&self) -> Result<Vec<SessionSummary>> {
        Ok(self.load_all()?.iter().map(|c| c.summary()).collect())
    }
}

fn read_conversation(path: &Path) -> Result<Conversation> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse transcript: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatTurn;
    use tempfile::TempDir;

    #[test]
    fn test_save_load_list() {
        let tmp = TempDir::new().unwrap();
        let store = TranscriptStore::open(tmp.path().join("history")).unwrap();

        let mut older = Conversation::new();
        older.created_at = older.created_at - chrono::Duration::hours(1);
        older.title = "Health Tech Trends".into();
        store.save(&older).unwrap();

        let mut newer = Conversation::new();
        newer.title = "AI Fitness App Idea".into();
        newer.turns.push(ChatTurn::user("AI Fitness App Idea"));
        newer.turns.push(ChatTurn::degraded("offline"));
        store.save(&newer).unwrap();

        let loaded = store.load(newer.id).unwrap().unwrap();
        assert_eq!(loaded.turns, newer.turns);
        assert!(store.load(Uuid::new_v4()).unwrap().is_none());

        let titles: Vec<String> = store.list().unwrap().into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["AI Fitness App Idea", "Health Tech Trends"]);
    }

    #[tokio::test]
    async fn test_persist_from_async_context() {
        let tmp = TempDir::new().unwrap();
        let store = TranscriptStore::open(tmp.path()).unwrap();

        let mut convo = Conversation::new();
        convo.turns.push(ChatTurn::user("Funding in NYC"));
        store.persist(convo.clone()).await.unwrap();

        let loaded = store.load(convo.id).unwrap().unwrap();
        assert_eq!(loaded.turns, convo.turns);
    }

    #[test]
    fn test_save_overwrites_and_skips_garbage() {
        let tmp = TempDir::new().unwrap();
        let store = TranscriptStore::open(tmp.path()).unwrap();

        let mut convo = Conversation::new();
        store.save(&convo).unwrap();
        convo.turns.push(ChatTurn::user("x"));
        store.save(&convo).unwrap();
        std::fs::write(tmp.path().join("broken.json"), "{not json").unwrap();

        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].turns.len(), 1);
    }
}
