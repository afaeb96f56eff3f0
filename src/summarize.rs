//! Article summarization with artifact caching.
//!
//! The freshness gate decides first. A reusable artifact is returned as
//! stored and no provider is contacted. Otherwise a new summary and keyword
//! list are generated, the article is reclassified with the new summary,
//! and all of it is written in a single update. A failed generation writes
//! nothing, so the previous artifact stays intact.

use anyhow::{bail, Result};
use chrono::{Timelike, Utc};
use serde::Serialize;
use std::time::Duration;

use blog_augment_core::freshness::{decide, ArtifactState, FreshnessDecision, RegenerateReason};
use blog_augment_core::models::{Artifact, Category};
use blog_augment_core::provider::AiProvider;
use blog_augment_core::store::ArticleStore;
use blog_augment_core::structured::SummaryResult;
use blog_augment_core::taxonomy::classify;

use crate::config::Config;
use crate::gateway;
use crate::prompts;
use crate::runtime::Runtime;

#[derive(Debug, Clone, Serialize)]
pub struct SummaryOutcome {
    pub slug: String,
    pub artifact: Artifact,
    pub category: Category,
    /// `true` when the cached artifact was returned without a provider call.
    pub reused: bool,
    pub reason: Option<RegenerateReason>,
}

/// Summarize the article `slug`, reusing a fresh cached artifact unless
/// `force` is set.
pub async fn summarize<S>(
    store: &S,
    provider: &dyn AiProvider,
    config: &Config,
    slug: &str,
    force: bool,
) -> Result<SummaryOutcome>
where
    S: ArticleStore + ?Sized,
{
    let article = match store.get_article_by_slug(slug).await? {
        Some(a) => a,
        None => bail!("Article not found: {}", slug),
    };

    // Whole seconds, as stored.
    let now = Utc::now().with_nanosecond(0).unwrap_or_else(Utc::now);
    let reason = match decide(&ArtifactState::from(&article), force, now) {
        FreshnessDecision::Reuse(artifact) => {
            tracing::info!(slug, "summary cache hit");
            return Ok(SummaryOutcome {
                slug: article.slug,
                artifact,
                category: article.category,
                reused: true,
                reason: None,
            });
        }
        FreshnessDecision::Regenerate(reason) => reason,
    };
    tracing::info!(slug, ?reason, provider = provider.name(), "regenerating summary");

    let prompt = prompts::summary_prompt(&article.title, &article.body, config.generation.max_prompt_chars);
    let result: SummaryResult = gateway::complete(
        provider,
        prompts::SUMMARY_SYSTEM,
        &prompt,
        Duration::from_secs(config.generation.timeout_secs),
    )
    .await?;

    let artifact = Artifact {
        summary: result.summary.trim().to_string(),
        keywords: result.keywords.iter().map(|k| k.trim().to_string()).collect(),
        generated_at: now,
    };
    let category = classify(&article.title, Some(&artifact.summary)).category;

    store.update_artifact(&article.id, &artifact, category).await?;

    Ok(SummaryOutcome {
        slug: article.slug,
        artifact,
        category,
        reused: false,
        reason: Some(reason),
    })
}

pub async fn run_summarize(config: &Config, slug: &str, provider_name: &str, force: bool) -> Result<()> {
    let rt = Runtime::open(config).await?;
    let provider = rt.providers.get(provider_name)?;

    let outcome = summarize(&rt.store, provider.as_ref(), config, slug, force).await?;

    let source = if outcome.reused { "cached" } else { "generated" };
    println!("Summary for {} ({}):", outcome.slug, source);
    println!("  {}", outcome.artifact.summary);
    println!("Keywords: {}", outcome.artifact.keywords.join(", "));
    println!(
        "Category: {} ({})",
        outcome.category,
        outcome.category.label()
    );
    println!(
        "Generated at: {}",
        outcome.artifact.generated_at.format("%Y-%m-%dT%H:%M:%SZ")
    );

    rt.close().await;
    Ok(())
}
