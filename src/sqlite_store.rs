//! SQLite-backed [`ArticleStore`] and [`VectorStore`] implementation.
//!
//! Timestamps are stored as Unix seconds. Keyword lists and vector
//! payloads are stored as JSON text; vectors as little-endian `f32` BLOBs.
//! Vector search is brute-force cosine similarity computed in Rust.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use blog_augment_core::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use blog_augment_core::models::{Article, Artifact, Category, Comment, CommentStatus, Moderation};
use blog_augment_core::store::{ArticleStore, ChunkPayload, VectorHit, VectorStore};

/// SQLite implementation of both store traits over one pool.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

const ARTICLE_COLUMNS: &str = "id, slug, title, body, summary, keywords_json, ai_summary_at, \
                               vectorized, category, published, created_at";

const COMMENT_COLUMNS: &str = "id, article_id, author, content, status, spam_score, \
                               toxicity_score, suggested_reply, checked_at, created_at";

fn from_ts(ts: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0).ok_or_else(|| anyhow!("Invalid timestamp: {}", ts))
}

fn row_to_article(row: &SqliteRow) -> Result<Article> {
    let keywords_json: Option<String> = row.get("keywords_json");
    let keywords = keywords_json
        .map(|s| serde_json::from_str::<Vec<String>>(&s))
        .transpose()
        .context("Corrupt keywords_json")?;
    let ai_summary_at: Option<i64> = row.get("ai_summary_at");
    let category: String = row.get("category");
    let vectorized: i64 = row.get("vectorized");
    let published: i64 = row.get("published");

    Ok(Article {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        body: row.get("body"),
        summary: row.get("summary"),
        keywords,
        ai_summary_at: ai_summary_at.map(from_ts).transpose()?,
        vectorized: vectorized != 0,
        category: category.parse()?,
        published: published != 0,
        created_at: from_ts(row.get("created_at"))?,
    })
}

fn row_to_comment(row: &SqliteRow) -> Result<Comment> {
    let status: String = row.get("status");
    let spam_score: Option<f64> = row.get("spam_score");
    let toxicity_score: Option<f64> = row.get("toxicity_score");
    let checked_at: Option<i64> = row.get("checked_at");

    // Moderation columns are written together; a row is either fully
    // moderated or not at all.
    let moderation = match (spam_score, toxicity_score, checked_at) {
        (Some(spam_score), Some(toxicity_score), Some(checked_at)) => Some(Moderation {
            spam_score,
            toxicity_score,
            suggested_reply: row.get("suggested_reply"),
            checked_at: from_ts(checked_at)?,
        }),
        _ => None,
    };

    Ok(Comment {
        id: row.get("id"),
        article_id: row.get("article_id"),
        author: row.get("author"),
        content: row.get("content"),
        status: status.parse()?,
        moderation,
        created_at: from_ts(row.get("created_at"))?,
    })
}

#[async_trait]
impl ArticleStore for SqliteStore {
    async fn get_article(&self, id: &str) -> Result<Option<Article>> {
        let row = sqlx::query(&format!("SELECT {} FROM articles WHERE id = ?", ARTICLE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_article).transpose()
    }

    async fn get_article_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        let row = sqlx::query(&format!("SELECT {} FROM articles WHERE slug = ?", ARTICLE_COLUMNS))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_article).transpose()
    }

    async fn upsert_article(&self, article: &Article) -> Result<String> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO articles (id, slug, title, body, category, published, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(slug) DO UPDATE SET
                title = excluded.title,
                body = excluded.body,
                published = excluded.published
            "#,
        )
        .bind(&article.id)
        .bind(&article.slug)
        .bind(&article.title)
        .bind(&article.body)
        .bind(article.category.as_str())
        .bind(article.published as i64)
        .bind(article.created_at.timestamp())
        .execute(&mut *tx)
        .await?;

        let id: String = sqlx::query_scalar("SELECT id FROM articles WHERE slug = ?")
            .bind(&article.slug)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(id)
    }

    async fn list_slugs(&self) -> Result<Vec<String>> {
        let slugs = sqlx::query_scalar("SELECT slug FROM articles ORDER BY created_at ASC, slug ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(slugs)
    }

    async fn count_published(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE published = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn keyword_search(&self, keywords: &[String], limit: i64) -> Result<Vec<Article>> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        // SQLite's lower() folds ASCII only; match in Rust with Unicode folding.
        let needles: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        let rows = sqlx::query(&format!(
            "SELECT {} FROM articles WHERE published = 1 ORDER BY created_at DESC, id ASC",
            ARTICLE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut matched = Vec::new();
        for row in &rows {
            if matched.len() as i64 >= limit {
                break;
            }
            let article = row_to_article(row)?;
            let title = article.title.to_lowercase();
            let body = article.body.to_lowercase();
            if needles
                .iter()
                .any(|n| title.contains(n.as_str()) || body.contains(n.as_str()))
            {
                matched.push(article);
            }
        }
        Ok(matched)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Article>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM articles WHERE published = 1 ORDER BY created_at DESC, id ASC LIMIT ?",
            ARTICLE_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_article).collect()
    }

    async fn update_artifact(&self, article_id: &str, artifact: &Artifact, category: Category) -> Result<()> {
        let keywords_json = serde_json::to_string(&artifact.keywords)?;
        let result = sqlx::query(
            r#"
            UPDATE articles
            SET summary = ?, keywords_json = ?, ai_summary_at = ?, category = ?
            WHERE id = ?
            "#,
        )
        .bind(&artifact.summary)
        .bind(&keywords_json)
        .bind(artifact.generated_at.timestamp())
        .bind(category.as_str())
        .bind(article_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            bail!("Article not found: {}", article_id);
        }
        Ok(())
    }

    async fn set_category(&self, article_id: &str, category: Category) -> Result<()> {
        let result = sqlx::query("UPDATE articles SET category = ? WHERE id = ?")
            .bind(category.as_str())
            .bind(article_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            bail!("Article not found: {}", article_id);
        }
        Ok(())
    }

    async fn set_vectorized(&self, article_id: &str, vectorized: bool) -> Result<()> {
        let result = sqlx::query("UPDATE articles SET vectorized = ? WHERE id = ?")
            .bind(vectorized as i64)
            .bind(article_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            bail!("Article not found: {}", article_id);
        }
        Ok(())
    }

    async fn delete_article(&self, article_id: &str) -> Result<bool> {
        // Comments cascade by foreign key; vector points are removed here.
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM chunk_vectors WHERE article_id = ?")
            .bind(article_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(article_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, article_id, author, content, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.article_id)
        .bind(&comment.author)
        .bind(&comment.content)
        .bind(comment.status.as_str())
        .bind(comment.created_at.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>> {
        let row = sqlx::query(&format!("SELECT {} FROM comments WHERE id = ?", COMMENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_comment).transpose()
    }

    async fn record_moderation(&self, comment_id: &str, moderation: &Moderation, status: CommentStatus) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE comments
            SET spam_score = ?, toxicity_score = ?, suggested_reply = ?, checked_at = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(moderation.spam_score)
        .bind(moderation.toxicity_score)
        .bind(&moderation.suggested_reply)
        .bind(moderation.checked_at.timestamp())
        .bind(status.as_str())
        .bind(comment_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            bail!("Comment not found: {}", comment_id);
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn upsert(&self, id: &str, vector: &[f32], payload: &ChunkPayload) -> Result<()> {
        let blob = vec_to_blob(vector);
        let payload_json = serde_json::to_string(payload)?;

        sqlx::query(
            r#"
            INSERT INTO chunk_vectors (id, article_id, slug, payload_json, dims, embedding)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                article_id = excluded.article_id,
                slug = excluded.slug,
                payload_json = excluded.payload_json,
                dims = excluded.dims,
                embedding = excluded.embedding
            "#,
        )
        .bind(id)
        .bind(&payload.article_id)
        .bind(&payload.slug)
        .bind(&payload_json)
        .bind(vector.len() as i64)
        .bind(&blob)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn search(&self, vector: &[f32], limit: usize, score_threshold: f32) -> Result<Vec<VectorHit>> {
        let rows = sqlx::query("SELECT id, payload_json, embedding FROM chunk_vectors")
            .fetch_all(&self.pool)
            .await?;

        let mut hits = Vec::new();
        for row in &rows {
            let blob: Vec<u8> = row.get("embedding");
            let score = cosine_similarity(vector, &blob_to_vec(&blob));
            if score < score_threshold {
                continue;
            }
            let payload_json: String = row.get("payload_json");
            hits.push(VectorHit {
                id: row.get("id"),
                score,
                payload: serde_json::from_str(&payload_json).context("Corrupt payload_json")?,
            });
        }

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
        // Column names cannot be bound; only known payload fields are accepted.
        let sql = match field {
            "article_id" => "DELETE FROM chunk_vectors WHERE article_id = ?",
            "slug" => "DELETE FROM chunk_vectors WHERE slug = ?",
            other => bail!("Unsupported filter field: '{}'", other),
        };
        let result = sqlx::query(sql).bind(value).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;

    async fn memory_store() -> SqliteStore {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        crate::migrate::apply(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    fn article(slug: &str, title: &str, body: &str, age_days: i64) -> Article {
        Article::new(slug, title, body, Utc::now() - Duration::days(age_days))
    }

    #[tokio::test]
    async fn test_upsert_roundtrip_and_slug_conflict() {
        let store = memory_store().await;
        let a = article("vue", "Vue", "old body", 2);
        let id = store.upsert_article(&a).await.unwrap();
        assert_eq!(id, a.id);

        let replacement = article("vue", "Vue 3", "new body", 0);
        let id2 = store.upsert_article(&replacement).await.unwrap();
        assert_eq!(id2, a.id);

        let stored = store.get_article_by_slug("vue").await.unwrap().unwrap();
        assert_eq!(stored.title, "Vue 3");
        assert_eq!(stored.body, "new body");
        assert_eq!(stored.category, Category::Tech);
        assert!(stored.summary.is_none());
        assert!(!stored.vectorized);
        assert_eq!(store.list_slugs().await.unwrap(), vec!["vue"]);
    }

    #[tokio::test]
    async fn test_update_artifact_writes_all_fields() {
        let store = memory_store().await;
        let a = article("life", "周末", "body", 0);
        store.upsert_article(&a).await.unwrap();

        let artifact = Artifact {
            summary: "总结".to_string(),
            keywords: vec!["生活".to_string(), "周末".to_string()],
            generated_at: from_ts(Utc::now().timestamp()).unwrap(),
        };
        store.update_artifact(&a.id, &artifact, Category::Life).await.unwrap();

        let stored = store.get_article(&a.id).await.unwrap().unwrap();
        assert_eq!(stored.summary.as_deref(), Some("总结"));
        assert_eq!(stored.keywords, Some(artifact.keywords.clone()));
        assert_eq!(stored.ai_summary_at, Some(artifact.generated_at));
        assert_eq!(stored.category, Category::Life);

        assert!(store.update_artifact("missing", &artifact, Category::Tech).await.is_err());
    }

    #[tokio::test]
    async fn test_keyword_search_or_semantics() {
        let store = memory_store().await;
        store.upsert_article(&article("a", "Vue3 响应式原理详解", "", 3)).await.unwrap();
        store.upsert_article(&article("b", "Rust", "tokio runtime", 2)).await.unwrap();
        store.upsert_article(&article("c", "Hiking", "mountains", 1)).await.unwrap();

        let kws = vec!["VUE".to_string(), "Tokio".to_string()];
        let hits = store.keyword_search(&kws, 5).await.unwrap();
        let slugs: Vec<&str> = hits.iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(slugs, vec!["b", "a"]);

        assert!(store.keyword_search(&[], 5).await.unwrap().is_empty());
        assert_eq!(store.keyword_search(&kws, 1).await.unwrap().len(), 1);
        assert_eq!(store.recent(2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_comments_and_cascade() {
        let store = memory_store().await;
        let a = article("a", "A", "body", 0);
        store.upsert_article(&a).await.unwrap();

        let c = Comment::new(&a.id, "bob", "great post", Utc::now());
        store.insert_comment(&c).await.unwrap();
        let stored = store.get_comment(&c.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CommentStatus::Pending);
        assert!(stored.moderation.is_none());

        let m = Moderation {
            spam_score: 0.1,
            toxicity_score: 0.05,
            suggested_reply: Some("谢谢".to_string()),
            checked_at: from_ts(Utc::now().timestamp()).unwrap(),
        };
        store.record_moderation(&c.id, &m, CommentStatus::Approved).await.unwrap();
        let stored = store.get_comment(&c.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CommentStatus::Approved);
        assert_eq!(stored.moderation, Some(m));

        let payload = ChunkPayload {
            article_id: a.id.clone(),
            slug: a.slug.clone(),
            title: a.title.clone(),
            chunk_index: 0,
            text: "body".to_string(),
        };
        store.upsert("p-a", &[1.0, 0.0], &payload).await.unwrap();

        assert!(store.delete_article(&a.id).await.unwrap());
        assert!(store.get_comment(&c.id).await.unwrap().is_none());
        assert!(store.search(&[1.0, 0.0], 10, -1.0).await.unwrap().is_empty());
        assert!(!store.delete_article(&a.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_keyword_search_folds_non_ascii_case() {
        let store = memory_store().await;
        store.upsert_article(&article("uber", "Über Rust", "", 1)).await.unwrap();
        store.upsert_article(&article("hiking", "Hiking", "ΑΘΗΝΑ trip", 0)).await.unwrap();

        let hits = store.keyword_search(&["über".to_string()], 5).await.unwrap();
        let slugs: Vec<&str> = hits.iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(slugs, vec!["uber"]);

        let hits = store.keyword_search(&["Αθηνα".to_string()], 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].slug, "hiking");
    }

    #[tokio::test]
    async fn test_vector_upsert_search_and_delete() {
        let store = memory_store().await;
        let payload = |article_id: &str, i: i64| ChunkPayload {
            article_id: article_id.to_string(),
            slug: format!("s-{}", article_id),
            title: "T".to_string(),
            chunk_index: i,
            text: format!("chunk {}", i),
        };
        store.upsert("p1", &[1.0, 0.0], &payload("a", 0)).await.unwrap();
        store.upsert("p2", &[0.0, 1.0], &payload("a", 1)).await.unwrap();
        store.upsert("p3", &[0.9, 0.1], &payload("b", 0)).await.unwrap();
        // re-upsert replaces
        store.upsert("p1", &[1.0, 0.0], &payload("a", 0)).await.unwrap();

        let hits = store.search(&[1.0, 0.0], 10, 0.5).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3"]);
        assert_eq!(hits[0].payload.text, "chunk 0");

        assert_eq!(store.delete_by_filter("article_id", "a").await.unwrap(), 2);
        assert_eq!(store.search(&[1.0, 0.0], 10, -1.0).await.unwrap().len(), 1);
        assert!(store.delete_by_filter("title", "T").await.is_err());
    }
}
