//! In-memory [`ArticleStore`] and [`VectorStore`] implementation for tests.
//!
//! Uses `HashMap` behind `std::sync::RwLock` for thread safety. Vector
//! search is brute-force cosine similarity over all stored points.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::{Article, Artifact, Category, Comment, CommentStatus, Moderation};

use super::{ArticleStore, ChunkPayload, VectorHit, VectorStore};

struct StoredPoint {
    vector: Vec<f32>,
    payload: ChunkPayload,
}

/// In-memory store for tests.
pub struct InMemoryStore {
    articles: RwLock<HashMap<String, Article>>,
    comments: RwLock<HashMap<String, Comment>>,
    points: RwLock<HashMap<String, StoredPoint>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            articles: RwLock::new(HashMap::new()),
            comments: RwLock::new(HashMap::new()),
            points: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored vector points.
    pub fn point_count(&self) -> usize {
        self.points.read().unwrap().len()
    }

    /// Ids of the points belonging to `article_id`, sorted.
    pub fn point_ids_for(&self, article_id: &str) -> Vec<String> {
        let points = self.points.read().unwrap();
        let mut ids: Vec<String> = points
            .iter()
            .filter(|(_, p)| p.payload.article_id == article_id)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    fn published_newest_first<F>(&self, limit: i64, keep: F) -> Vec<Article>
    where
        F: Fn(&Article) -> bool,
    {
        let articles = self.articles.read().unwrap();
        let mut matched: Vec<Article> = articles
            .values()
            .filter(|a| a.published && keep(a))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        matched.truncate(limit.max(0) as usize);
        matched
    }

    fn with_article<F>(&self, article_id: &str, update: F) -> Result<()>
    where
        F: FnOnce(&mut Article),
    {
        let mut articles = self.articles.write().unwrap();
        match articles.get_mut(article_id) {
            Some(article) => {
                update(article);
                Ok(())
            }
            None => bail!("Article not found: {}", article_id),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArticleStore for InMemoryStore {
    async fn get_article(&self, id: &str) -> Result<Option<Article>> {
        Ok(self.articles.read().unwrap().get(id).cloned())
    }

    async fn get_article_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        let articles = self.articles.read().unwrap();
        Ok(articles.values().find(|a| a.slug == slug).cloned())
    }

    async fn upsert_article(&self, article: &Article) -> Result<String> {
        let mut articles = self.articles.write().unwrap();
        if let Some(existing) = articles.values_mut().find(|a| a.slug == article.slug) {
            existing.title = article.title.clone();
            existing.body = article.body.clone();
            existing.published = article.published;
            return Ok(existing.id.clone());
        }
        articles.insert(article.id.clone(), article.clone());
        Ok(article.id.clone())
    }

    async fn list_slugs(&self) -> Result<Vec<String>> {
        let articles = self.articles.read().unwrap();
        let mut all: Vec<&Article> = articles.values().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.slug.cmp(&b.slug)));
        Ok(all.into_iter().map(|a| a.slug.clone()).collect())
    }

    async fn count_published(&self) -> Result<i64> {
        let articles = self.articles.read().unwrap();
        Ok(articles.values().filter(|a| a.published).count() as i64)
    }

    async fn keyword_search(&self, keywords: &[String], limit: i64) -> Result<Vec<Article>> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }
        let needles: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        Ok(self.published_newest_first(limit, |a| {
            let title = a.title.to_lowercase();
            let body = a.body.to_lowercase();
            needles.iter().any(|k| title.contains(k) || body.contains(k))
        }))
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Article>> {
        Ok(self.published_newest_first(limit, |_| true))
    }

    async fn update_artifact(&self, article_id: &str, artifact: &Artifact, category: Category) -> Result<()> {
        self.with_article(article_id, |a| {
            a.summary = Some(artifact.summary.clone());
            a.keywords = Some(artifact.keywords.clone());
            a.ai_summary_at = Some(artifact.generated_at);
            a.category = category;
        })
    }

    async fn set_category(&self, article_id: &str, category: Category) -> Result<()> {
        self.with_article(article_id, |a| a.category = category)
    }

    async fn set_vectorized(&self, article_id: &str, vectorized: bool) -> Result<()> {
        self.with_article(article_id, |a| a.vectorized = vectorized)
    }

    async fn delete_article(&self, article_id: &str) -> Result<bool> {
        let removed = self.articles.write().unwrap().remove(article_id).is_some();
        if removed {
            self.comments
                .write()
                .unwrap()
                .retain(|_, c| c.article_id != article_id);
            self.points
                .write()
                .unwrap()
                .retain(|_, p| p.payload.article_id != article_id);
        }
        Ok(removed)
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        if !self.articles.read().unwrap().contains_key(&comment.article_id) {
            bail!("Article not found: {}", comment.article_id);
        }
        self.comments
            .write()
            .unwrap()
            .insert(comment.id.clone(), comment.clone());
        Ok(())
    }

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>> {
        Ok(self.comments.read().unwrap().get(id).cloned())
    }

    async fn record_moderation(&self, comment_id: &str, moderation: &Moderation, status: CommentStatus) -> Result<()> {
        let mut comments = self.comments.write().unwrap();
        match comments.get_mut(comment_id) {
            Some(c) => {
                c.moderation = Some(moderation.clone());
                c.status = status;
                Ok(())
            }
            None => bail!("Comment not found: {}", comment_id),
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn upsert(&self, id: &str, vector: &[f32], payload: &ChunkPayload) -> Result<()> {
        self.points.write().unwrap().insert(
            id.to_string(),
            StoredPoint {
                vector: vector.to_vec(),
                payload: payload.clone(),
            },
        );
        Ok(())
    }

    async fn search(&self, vector: &[f32], limit: usize, score_threshold: f32) -> Result<Vec<VectorHit>> {
        let points = self.points.read().unwrap();
        let mut hits: Vec<VectorHit> = points
            .iter()
            .map(|(id, p)| VectorHit {
                id: id.clone(),
                score: cosine_similarity(vector, &p.vector),
                payload: p.payload.clone(),
            })
            .filter(|h| h.score >= score_threshold)
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn delete_by_filter(&self, field: &str, value: &str) -> Result<u64> {
        if !matches!(field, "article_id" | "slug") {
            bail!("Unsupported filter field: '{}'", field);
        }
        let mut points = self.points.write().unwrap();
        let before = points.len();
        points.retain(|_, p| p.payload.field(field) != Some(value));
        Ok((before - points.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn article(slug: &str, title: &str, body: &str, age_days: i64) -> Article {
        Article::new(slug, title, body, Utc::now() - Duration::days(age_days))
    }

    fn payload(article_id: &str, index: i64) -> ChunkPayload {
        ChunkPayload {
            article_id: article_id.to_string(),
            slug: format!("slug-{}", article_id),
            title: "t".to_string(),
            chunk_index: index,
            text: "x".to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_by_slug_keeps_id() {
        let store = InMemoryStore::new();
        let first = article("vue", "Vue", "old", 1);
        let id = store.upsert_article(&first).await.unwrap();

        let second = article("vue", "Vue 3", "new", 0);
        let id2 = store.upsert_article(&second).await.unwrap();
        assert_eq!(id, id2);

        let stored = store.get_article_by_slug("vue").await.unwrap().unwrap();
        assert_eq!(stored.title, "Vue 3");
        assert_eq!(stored.body, "new");
        assert_eq!(store.count_published().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_keyword_search_is_case_insensitive_newest_first() {
        let store = InMemoryStore::new();
        store.upsert_article(&article("a", "Learning VUE", "", 3)).await.unwrap();
        store.upsert_article(&article("b", "Other", "some vue notes", 1)).await.unwrap();
        store.upsert_article(&article("c", "Hiking", "mountains", 0)).await.unwrap();

        let mut draft = article("d", "Vue draft", "", 0);
        draft.published = false;
        store.upsert_article(&draft).await.unwrap();

        let hits = store.keyword_search(&["vue".to_string()], 5).await.unwrap();
        let slugs: Vec<&str> = hits.iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(slugs, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_delete_article_cascades_comments_and_points() {
        let store = InMemoryStore::new();
        let a = article("a", "A", "body", 0);
        store.upsert_article(&a).await.unwrap();
        let c = Comment::new(&a.id, "bob", "hi", Utc::now());
        store.insert_comment(&c).await.unwrap();
        let payload = ChunkPayload {
            article_id: a.id.clone(),
            slug: "a".to_string(),
            title: "A".to_string(),
            chunk_index: 0,
            text: "body".to_string(),
        };
        store.upsert("p-a", &[1.0, 0.0], &payload).await.unwrap();
        store
            .upsert("p-other", &[0.0, 1.0], &ChunkPayload { article_id: "other".to_string(), ..payload.clone() })
            .await
            .unwrap();

        assert!(store.delete_article(&a.id).await.unwrap());
        assert!(store.get_comment(&c.id).await.unwrap().is_none());
        assert!(store.point_ids_for(&a.id).is_empty());
        assert_eq!(store.point_count(), 1);
        assert!(!store.delete_article(&a.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_comment_requires_article() {
        let store = InMemoryStore::new();
        let c = Comment::new("missing", "bob", "hi", Utc::now());
        assert!(store.insert_comment(&c).await.is_err());
    }

    #[tokio::test]
    async fn test_vector_search_threshold_and_order() {
        let store = InMemoryStore::new();
        store.upsert("p1", &[1.0, 0.0], &payload("a", 0)).await.unwrap();
        store.upsert("p2", &[0.8, 0.6], &payload("a", 1)).await.unwrap();
        store.upsert("p3", &[0.0, 1.0], &payload("b", 0)).await.unwrap();

        let hits = store.search(&[1.0, 0.0], 10, 0.5).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);

        let hits = store.search(&[1.0, 0.0], 1, 0.0).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_by_filter() {
        let store = InMemoryStore::new();
        store.upsert("p1", &[1.0], &payload("a", 0)).await.unwrap();
        store.upsert("p2", &[1.0], &payload("a", 1)).await.unwrap();
        store.upsert("p3", &[1.0], &payload("b", 0)).await.unwrap();

        assert_eq!(store.delete_by_filter("article_id", "a").await.unwrap(), 2);
        assert_eq!(store.point_count(), 1);
        assert!(store.delete_by_filter("text", "x").await.is_err());
    }
}
