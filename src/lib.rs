//! # Blog Augment
//!
//! The content-augmentation subsystem of a personal blog: AI summaries with
//! a seven-day cache, deterministic tech/life classification, chunked
//! embeddings, retrieval-augmented Q&A, and AI comment moderation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌────────────────┐
//! │  Markdown   │──▶│    SQLite     │──▶│  chunk_vectors  │
//! │  (import)   │   │ articles/comm │   │  (vectorize)    │
//! └─────────────┘   └──────┬───────┘   └───────┬────────┘
//!                          │                   │
//!               ┌──────────┴───────┬───────────┘
//!               ▼                  ▼
//!        ┌────────────┐     ┌────────────┐     ┌──────────────┐
//!        │ freshness  │     │ retrieval  │────▶│   gateway     │
//!        │ (summary)  │────▶│ (ask)      │     │ deepseek/...  │
//!        └────────────┘     └────────────┘     └──────────────┘
//! ```
//!
//! Pure logic (models, taxonomy, chunking, freshness, keyword retrieval,
//! structured parsing, store and provider traits) lives in
//! `blog-augment-core`; this crate adds the database, HTTP providers,
//! configuration, and the `blogai` CLI.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and credential resolution |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite article, comment, and vector store |
//! | [`providers`] | Chat-completions providers and registry |
//! | [`gateway`] | Typed, time-bounded structured completions |
//! | [`prompts`] | Prompt templates |
//! | [`embedding`] | Embedding providers |
//! | [`summarize`] | Cached article summaries |
//! | [`classify`] | Taxonomy classification command |
//! | [`vectorize`] | Chunk + embed + replace vector points |
//! | [`ask`] | Retrieval-augmented answers |
//! | [`moderate`] | Comment creation and moderation |
//! | [`import`] | Markdown import |
//! | [`runtime`] | Store, providers, and embedder wired from one config |

pub mod ask;
pub mod classify;
pub mod config;
pub mod db;
pub mod embedding;
pub mod gateway;
pub mod import;
pub mod migrate;
pub mod moderate;
pub mod prompts;
pub mod providers;
pub mod runtime;
pub mod sqlite_store;
pub mod summarize;
pub mod vectorize;
