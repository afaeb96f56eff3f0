use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create every table and index. Idempotent.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    // Create articles table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS articles (
            id TEXT PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            summary TEXT,
            keywords_json TEXT,
            ai_summary_at INTEGER,
            vectorized INTEGER NOT NULL DEFAULT 0,
            category TEXT NOT NULL DEFAULT 'tech',
            published INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create comments table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            id TEXT PRIMARY KEY,
            article_id TEXT NOT NULL,
            author TEXT NOT NULL,
            content TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            spam_score REAL,
            toxicity_score REAL,
            suggested_reply TEXT,
            checked_at INTEGER,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Vector points; not tied to articles by a foreign key
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chunk_vectors (
            id TEXT PRIMARY KEY,
            article_id TEXT NOT NULL,
            slug TEXT NOT NULL,
            payload_json TEXT NOT NULL,
            dims INTEGER NOT NULL,
            embedding BLOB NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_articles_created_at ON articles(created_at DESC)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_article_id ON comments(article_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunk_vectors_article_id ON chunk_vectors(article_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunk_vectors_slug ON chunk_vectors(slug)")
        .execute(pool)
        .await?;

    Ok(())
}
