//! # Foundry
//!
//! A retrieval-augmented startup intelligence assistant.
//!
//! Foundry renders the rows of one or more CSV datasets into text documents,
//! embeds them into per-dataset vector collections, retrieves the records
//! nearest to a user's startup idea, and asks a local language model for a
//! four-part analysis. Answers are shown in a terminal chat or on an HTTP
//! dashboard.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌───────────┐
//! │ CSV rows │──▶│ Render+Score │──▶│  SQLite   │
//! │ datasets │   │ Embed (batch)│   │  vectors  │
//! └──────────┘   └──────────────┘   └─────┬─────┘
//!                                         │ top-k per dataset
//!                                         ▼
//!                 ┌──────────┐      ┌───────────┐
//!                 │  Prompt  │◀─────│ Retrievers│
//!                 │ Generate │      └───────────┘
//!                 └────┬─────┘
//!              ┌───────┴───────┐
//!              ▼               ▼
//!         ┌─────────┐     ┌─────────┐
//!         │   CLI   │     │  HTTP   │
//!         │ foundry │     │dashboard│
//!         └─────────┘     └─────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! foundry init                   # create database
//! foundry ingest                 # seed every dataset
//! foundry ask "AI fitness app"   # one-shot analysis
//! foundry serve                  # dashboard on 127.0.0.1:8501
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`dataset`] | CSV loading and fingerprinting |
//! | [`score`] | Survival score heuristic |
//! | [`render`] | Row → document rendering |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | Vector store backends |
//! | [`ingest`] | Collection seeding policies |
//! | [`retrieve`] | Top-k retrieval |
//! | [`prompt`] | Analysis prompt template |
//! | [`generation`] | Text generation backends |
//! | [`assistant`] | Retrieve → prompt → generate |
//! | [`chat`] | Chat sessions |
//! | [`transcript`] | Durable chat transcripts |
//! | [`dashboard`] | Static dashboard widgets |
//! | [`app`] | Startup wiring |
//! | [`server`] | HTTP dashboard and API |
//! | [`stats`] | Index statistics |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod app;
pub mod assistant;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod db;
pub mod embedding;
pub mod generation;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod prompt;
pub mod render;
pub mod retrieve;
pub mod score;
pub mod server;
pub mod stats;
pub mod store;
pub mod transcript;
