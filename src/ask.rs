//! Retrieval-augmented question answering.
//!
//! # Flow
//!
//! 1. Nothing published → a fixed answer; no provider is contacted.
//! 2. With embeddings enabled, embed the question and search the vector
//!    store. Hit articles are fetched concurrently. Any failure or an
//!    empty result falls through to step 3.
//! 3. Keyword retrieval (with its own most-recent fallback).
//! 4. Ask the provider with a bounded context of the retrieved articles.

use anyhow::{anyhow, Result};
use futures::future::try_join_all;
use serde::Serialize;
use std::time::Duration;

use blog_augment_core::embedding::EmbeddingProvider;
use blog_augment_core::models::SourceDocument;
use blog_augment_core::provider::AiProvider;
use blog_augment_core::retrieval::{retrieve, Retrieval, RetrievalStrategy};
use blog_augment_core::store::{ArticleStore, VectorStore};
use blog_augment_core::structured::AnswerResult;

use crate::config::Config;
use crate::embedding::embed_query;
use crate::gateway;
use crate::prompts;
use crate::runtime::Runtime;
use crate::vectorize::with_timeout;

/// Answer given when there is nothing to ground an answer in.
pub const NO_CONTENT_ANSWER: &str = "博客里暂时还没有可以参考的文章，暂时无法回答这个问题。";

/// Vector search backend for semantic retrieval.
pub struct Semantic<'a> {
    pub embedder: &'a dyn EmbeddingProvider,
    pub vectors: &'a dyn VectorStore,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    /// `None` when the corpus was empty and no provider was called.
    pub strategy: Option<RetrievalStrategy>,
}

impl Answer {
    fn no_content() -> Self {
        Answer {
            answer: NO_CONTENT_ANSWER.to_string(),
            sources: Vec::new(),
            strategy: None,
        }
    }
}

/// Retrieve articles through vector search. `Ok(None)` means no usable hit.
pub async fn semantic_retrieve<S>(
    store: &S,
    semantic: &Semantic<'_>,
    config: &Config,
    question: &str,
) -> Result<Option<Retrieval>>
where
    S: ArticleStore + ?Sized,
{
    let timeout = Duration::from_secs(config.embedding.vector_timeout_secs);

    let query_vec = with_timeout(
        Duration::from_secs(config.embedding.timeout_secs),
        "query embedding",
        embed_query(semantic.embedder, question),
    )
    .await?;
    let hits = with_timeout(
        timeout,
        "vector search",
        semantic.vectors.search(
            &query_vec,
            config.retrieval.semantic_limit,
            config.retrieval.score_threshold,
        ),
    )
    .await?;

    // Hits arrive best first; keep each article once, at its best rank.
    let mut article_ids: Vec<String> = Vec::new();
    for hit in &hits {
        if !article_ids.contains(&hit.payload.article_id) {
            article_ids.push(hit.payload.article_id.clone());
        }
    }
    article_ids.truncate(config.retrieval.limit.max(1) as usize);

    let fetched = try_join_all(article_ids.iter().map(|id| store.get_article(id))).await?;

    let documents: Vec<SourceDocument> = fetched
        .iter()
        .flatten()
        .filter(|a| a.published)
        .map(SourceDocument::from)
        .collect();

    if documents.is_empty() {
        return Ok(None);
    }
    Ok(Some(Retrieval {
        keywords: Vec::new(),
        documents,
        strategy: RetrievalStrategy::Semantic,
    }))
}

pub async fn ask<S>(
    store: &S,
    semantic: Option<&Semantic<'_>>,
    provider: &dyn AiProvider,
    config: &Config,
    question: &str,
) -> Result<Answer>
where
    S: ArticleStore + ?Sized,
{
    if store.count_published().await? == 0 {
        tracing::info!("no published content, answering without provider");
        return Ok(Answer::no_content());
    }

    let mut retrieval = None;
    if let Some(semantic) = semantic {
        match semantic_retrieve(store, semantic, config, question).await {
            Ok(found) => retrieval = found,
            Err(e) => tracing::warn!(error = %e, "semantic retrieval failed, using keyword retrieval"),
        }
    }

    let retrieval = match retrieval {
        Some(r) => r,
        None => match retrieve(store, question, config.retrieval.limit).await? {
            Ok(r) => r,
            Err(_) => return Ok(Answer::no_content()),
        },
    };
    tracing::info!(
        strategy = retrieval.strategy.as_str(),
        documents = retrieval.documents.len(),
        keywords = ?retrieval.keywords,
        "retrieved context"
    );

    let prompt = prompts::answer_prompt(question, &retrieval.documents, config.retrieval.context_chars);
    let result: AnswerResult = gateway::complete(
        provider,
        prompts::ANSWER_SYSTEM,
        &prompt,
        Duration::from_secs(config.generation.timeout_secs),
    )
    .await?;

    Ok(Answer {
        answer: result.answer.trim().to_string(),
        sources: retrieval
            .documents
            .iter()
            .map(|d| SourceRef {
                title: d.title.clone(),
                slug: d.slug.clone(),
            })
            .collect(),
        strategy: Some(retrieval.strategy),
    })
}

pub async fn run_ask(config: &Config, question: &str, provider_name: &str) -> Result<()> {
    if question.trim().is_empty() {
        return Err(anyhow!("Question must not be empty"));
    }
    let rt = Runtime::open(config).await?;
    let provider = rt.providers.get(provider_name)?;

    let answer = ask(&rt.store, rt.semantic().as_ref(), provider.as_ref(), config, question).await?;

    println!("{}", answer.answer);
    if !answer.sources.is_empty() {
        println!();
        println!("Sources:");
        for source in &answer.sources {
            println!("  - {} (/{})", source.title, source.slug);
        }
    }

    rt.close().await;
    Ok(())
}
