//! Article vectorization: chunk, embed, replace the article's points.
//!
//! Embedding happens before anything is deleted, so an embedding failure
//! leaves the previous points in place. The old points of the article are
//! then removed by payload filter and the new ones upserted under their
//! stable chunk ids, which makes a re-run after partial failure safe.
//!
//! Two concurrent runs on the same article may interleave their delete and
//! upsert steps; callers serialize them.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

use blog_augment_core::chunk::chunk_text;
use blog_augment_core::embedding::EmbeddingProvider;
use blog_augment_core::store::{ArticleStore, ChunkPayload, VectorStore};

use crate::config::Config;
use crate::embedding::embed_in_batches;
use crate::runtime::Runtime;

#[derive(Debug, Clone, Serialize)]
pub struct VectorizeOutcome {
    pub slug: String,
    pub chunks: usize,
    pub removed: u64,
    pub vectorized: bool,
}

/// Run one vector-store call under `timeout`.
pub async fn with_timeout<T, F>(timeout: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => bail!("{} timed out after {}s", what, timeout.as_secs_f64()),
    }
}

pub async fn vectorize<S, V>(
    store: &S,
    vectors: &V,
    embedder: &dyn EmbeddingProvider,
    config: &Config,
    slug: &str,
) -> Result<VectorizeOutcome>
where
    S: ArticleStore + ?Sized,
    V: VectorStore + ?Sized,
{
    let article = match store.get_article_by_slug(slug).await? {
        Some(a) => a,
        None => bail!("Article not found: {}", slug),
    };
    let timeout = Duration::from_secs(config.embedding.vector_timeout_secs);

    let chunks = chunk_text(&article.id, &article.body, config.chunking.target_chars);

    let embeddings = if chunks.is_empty() {
        Vec::new()
    } else {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let batches = texts.len().div_ceil(config.embedding.batch_size.max(1)) as u64;
        with_timeout(
            Duration::from_secs(config.embedding.embed_budget_secs * batches),
            "embedding",
            embed_in_batches(embedder, &texts, config.embedding.batch_size),
        )
        .await
        .with_context(|| format!("Failed to embed article '{}'", slug))?
    };

    let removed = with_timeout(
        timeout,
        "vector delete",
        vectors.delete_by_filter("article_id", &article.id),
    )
    .await?;

    for (chunk, vector) in chunks.iter().zip(embeddings.iter()) {
        let payload = ChunkPayload {
            article_id: article.id.clone(),
            slug: article.slug.clone(),
            title: article.title.clone(),
            chunk_index: chunk.chunk_index,
            text: chunk.text.clone(),
        };
        with_timeout(timeout, "vector upsert", vectors.upsert(&chunk.id, vector, &payload)).await?;
    }

    let vectorized = !chunks.is_empty();
    store.set_vectorized(&article.id, vectorized).await?;

    tracing::info!(
        slug,
        chunks = chunks.len(),
        removed,
        model = embedder.model_name(),
        "article vectorized"
    );

    Ok(VectorizeOutcome {
        slug: article.slug,
        chunks: chunks.len(),
        removed,
        vectorized,
    })
}

/// Vectorize one article, or every article when `slug` is `None`.
pub async fn run_vectorize(config: &Config, slug: Option<&str>) -> Result<()> {
    if !config.embedding.is_enabled() {
        bail!("Embedding provider is disabled. Set [embedding] provider = \"openai\" to vectorize.");
    }
    let rt = Runtime::open(config).await?;

    let slugs = match slug {
        Some(s) => vec![s.to_string()],
        None => rt.store.list_slugs().await?,
    };

    let mut total_chunks = 0usize;
    for slug in &slugs {
        let outcome = vectorize(&rt.store, &rt.store, rt.embedder.as_ref(), config, slug).await?;
        println!(
            "{}: {} chunks embedded, {} old points removed",
            outcome.slug, outcome.chunks, outcome.removed
        );
        total_chunks += outcome.chunks;
    }
    println!("Vectorized {} articles ({} chunks)", slugs.len(), total_chunks);

    rt.close().await;
    Ok(())
}
