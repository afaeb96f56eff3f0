//! Storage abstraction for the augmentation subsystem.
//!
//! Two seams:
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`ArticleStore`] | Articles, comments, and the AI-derived fields on them |
//! | [`VectorStore`] | Chunk vectors with a JSON payload, searched by cosine similarity |
//!
//! Implementations must be `Send + Sync` to work with async runtimes. The
//! SQLite implementation lives in the app crate; [`memory::InMemoryStore`]
//! implements both traits for tests.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{Article, Artifact, Category, Comment, CommentStatus, Moderation};

/// Payload stored next to every chunk vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub article_id: String,
    pub slug: String,
    pub title: String,
    pub chunk_index: i64,
    pub text: String,
}

impl ChunkPayload {
    /// Value of a filterable payload field, as used by
    /// [`VectorStore::delete_by_filter`]. Only `article_id` and `slug` are
    /// filterable.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "article_id" => Some(&self.article_id),
            "slug" => Some(&self.slug),
            _ => None,
        }
    }
}

/// One vector search result.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub id: String,
    pub score: f32,
    pub payload: ChunkPayload,
}

/// Persistence of articles and comments.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert_article`](ArticleStore::upsert_article) | Insert, or update title/body of the article with the same slug |
/// | [`update_artifact`](ArticleStore::update_artifact) | Write summary, keywords, timestamp and category in one update |
/// | [`keyword_search`](ArticleStore::keyword_search) | Published articles whose title or body contains any keyword |
/// | [`recent`](ArticleStore::recent) | Most recent published articles |
/// | [`record_moderation`](ArticleStore::record_moderation) | Write all moderation fields and the new status at once |
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn get_article(&self, id: &str) -> Result<Option<Article>>;

    async fn get_article_by_slug(&self, slug: &str) -> Result<Option<Article>>;

    /// Insert the article, or update the title and body of the existing
    /// article with the same slug. Returns the stored article id.
    async fn upsert_article(&self, article: &Article) -> Result<String>;

    /// Slugs of all articles, oldest first.
    async fn list_slugs(&self) -> Result<Vec<String>>;

    async fn count_published(&self) -> Result<i64>;

    /// Published articles whose title or body contains any of `keywords`
    /// (case-insensitive), newest first.
    async fn keyword_search(&self, keywords: &[String], limit: i64) -> Result<Vec<Article>>;

    /// Most recent published articles, newest first.
    async fn recent(&self, limit: i64) -> Result<Vec<Article>>;

    /// Persist a regenerated artifact together with the recomputed category.
    /// Either every field is written or none is.
    async fn update_artifact(&self, article_id: &str, artifact: &Artifact, category: Category) -> Result<()>;

    async fn set_category(&self, article_id: &str, category: Category) -> Result<()>;

    async fn set_vectorized(&self, article_id: &str, vectorized: bool) -> Result<()>;

    /// Delete an article and its comments.
    async fn delete_article(&self, article_id: &str) -> Result<bool>;

    async fn insert_comment(&self, comment: &Comment) -> Result<()>;

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>>;

    /// Write the moderation result and resulting status in one update.
    async fn record_moderation(&self, comment_id: &str, moderation: &Moderation, status: CommentStatus) -> Result<()>;
}

/// Similarity-search store for chunk vectors.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace the point with `id`.
    async fn upsert(&self, id: &str, vector: &[f32], payload: &ChunkPayload) -> Result<()>;

    /// Points with cosine similarity `>= score_threshold`, best first.
    async fn search(&self, vector: &[f32], limit: usize, score_threshold: f32) -> Result<Vec<VectorHit>>;

    /// Delete every point whose payload `field` equals `value`. Returns the
    /// number of points removed. Fails for a field that is not filterable.
    async fn delete_by_filter(&self, field: &str, value: &str) -> Result<u64>;
}
