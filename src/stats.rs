//! Index statistics.
//!
//! `foundry stats` prints the database size and, for every configured
//! dataset, how many documents its collection holds and when it was last
//! seeded. Collections left over from datasets no longer in the config are
//! listed too.

use anyhow::Result;

use crate::config::Config;
use crate::store::{CollectionStats, SqliteStore, VectorStore};

/// Run the stats command: query the store and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = SqliteStore::open(&config.db.path).await?;
    let collections = store.collections().await;
    store.close().await;
    let collections = collections?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);
    let total: i64 = collections.iter().map(|c| c.documents).sum();

    println!("Foundry Index Stats");
    println!("=====================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!("  Documents:   {}", total);
    println!("  Policy:      {}", config.ingest.policy.as_str());
    println!();
    println!(
        "  {:<28} {:>8}   {:<12} {}",
        "COLLECTION", "DOCS", "SOURCE HASH", "LAST SEEDED"
    );
    println!("  {}", "-".repeat(72));

    for row in stats_rows(config, &collections) {
        let hash = row
            .fingerprint
            .as_deref()
            .map(|h| h.chars().take(12).collect::<String>())
            .unwrap_or_else(|| "-".to_string());
        let seeded = match row.updated_at {
            Some(ts) => format_ts_relative(ts),
            None => "never".to_string(),
        };
        println!(
            "  {:<28} {:>8}   {:<12} {}",
            row.name, row.documents, hash, seeded
        );
    }
    println!();

    Ok(())
}

/// Configured datasets first (in config order, empty if never seeded), then any others.
fn stats_rows(config: &Config, collections: &[CollectionStats]) -> Vec<CollectionStats> {
    let mut rows: Vec<CollectionStats> = config
        .datasets
        .iter()
        .map(|d| {
            let name = d.collection_name();
            collections
                .iter()
                .find(|c| c.name == name)
                .cloned()
                .unwrap_or(CollectionStats {
                    name,
                    documents: 0,
                    fingerprint: None,
                    updated_at: None,
                })
        })
        .collect();

    for c in collections {
        if !rows.iter().any(|r| r.name == c.name) {
            rows.push(c.clone());
        }
    }
    rows
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
