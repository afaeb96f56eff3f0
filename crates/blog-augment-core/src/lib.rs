//! # Blog Augment Core
//!
//! Pure logic for the blog's content-augmentation subsystem: data models,
//! keyword taxonomy classification, sentence chunking, the artifact
//! freshness gate, keyword retrieval, structured-response parsing, and the
//! store / provider traits the application crate implements.
//!
//! This crate contains no tokio, sqlx, or HTTP dependencies. Everything
//! that touches the network or a database lives in `blog-augment`.

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod freshness;
pub mod models;
pub mod provider;
pub mod retrieval;
pub mod store;
pub mod structured;
pub mod taxonomy;
