//! # Foundry CLI (`foundry`)
//!
//! The `foundry` binary seeds the dataset index, queries it, and runs the
//! startup analysis assistant in the terminal or behind the HTTP dashboard.
//!
//! ## Usage
//!
//! ```bash
//! foundry --config ./config/foundry.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `foundry init` | Create the SQLite database and run schema migrations |
//! | `foundry ingest` | Seed dataset collections from their CSV files |
//! | `foundry stats` | Show per-collection document counts |
//! | `foundry search "<query>"` | Print the nearest documents for a query |
//! | `foundry ask "<idea>"` | One-shot analysis of a startup idea |
//! | `foundry chat` | Interactive terminal chat |
//! | `foundry serve` | Start the dashboard HTTP server |
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`
//! (default `foundry=info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use foundry::{assistant, chat, config, ingest, migrate, retrieve, server, stats};

/// Foundry: startup intelligence assistant over CSV datasets.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/foundry.toml` for an example.
#[derive(Parser)]
#[command(
    name = "foundry",
    about = "Foundry, a retrieval-augmented startup intelligence assistant",
    version,
    long_about = "Foundry embeds startup datasets (CSV) into a local vector index, retrieves \
    the records most relevant to an idea, and asks a local language model for a survival, \
    growth, audience, and risk analysis, in the terminal or on an HTTP dashboard."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/foundry.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent; running it multiple times is safe.
    Init,

    /// Seed dataset collections from their CSV files.
    ///
    /// Collections that already hold documents are skipped unless the
    /// `content_hash` policy detects a changed file, or `--force` is given.
    Ingest {
        /// Only ingest this dataset.
        #[arg(long)]
        dataset: Option<String>,

        /// Clear and reseed even when the collection is populated.
        #[arg(long)]
        force: bool,
    },

    /// Show per-collection document counts and source fingerprints.
    Stats,

    /// Print the nearest indexed documents for a query.
    Search {
        /// The search query string.
        query: String,

        /// Only search this dataset.
        #[arg(long)]
        dataset: Option<String>,
    },

    /// Analyze one startup idea and exit.
    Ask {
        /// The idea to analyze.
        idea: String,
    },

    /// Interactive terminal chat.
    Chat,

    /// Start the dashboard HTTP server on `[server].bind`.
    Serve,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("foundry=info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { dataset, force } => {
            ingest::run_ingest(&cfg, dataset.as_deref(), force).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Search { query, dataset } => {
            retrieve::run_search(&cfg, &query, dataset.as_deref()).await?;
        }
        Commands::Ask { idea } => {
            assistant::run_ask(&cfg, &idea).await?;
        }
        Commands::Chat => {
            chat::run_chat(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
