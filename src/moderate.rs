//! Comment creation and AI moderation.
//!
//! A new comment is stored as `pending` before any provider is contacted.
//! Moderation then writes every moderation field together with the status
//! chosen by the [`ApprovalPolicy`]. If the provider fails, the comment
//! stays pending for manual review and creation still succeeds.

use anyhow::{bail, Result};
use chrono::Utc;
use serde::Serialize;
use std::time::Duration;

use blog_augment_core::models::{Comment, CommentStatus, Moderation};
use blog_augment_core::provider::AiProvider;
use blog_augment_core::store::ArticleStore;
use blog_augment_core::structured::ModerationResult;

use crate::config::{Config, ModerationConfig};
use crate::gateway;
use crate::prompts;
use crate::runtime::Runtime;

/// Scores strictly below both thresholds approve a comment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ApprovalPolicy {
    pub spam_threshold: f64,
    pub toxicity_threshold: f64,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self {
            spam_threshold: 0.3,
            toxicity_threshold: 0.3,
        }
    }
}

impl From<&ModerationConfig> for ApprovalPolicy {
    fn from(config: &ModerationConfig) -> Self {
        Self {
            spam_threshold: config.spam_threshold,
            toxicity_threshold: config.toxicity_threshold,
        }
    }
}

impl ApprovalPolicy {
    pub fn decide(&self, spam_score: f64, toxicity_score: f64) -> CommentStatus {
        if spam_score < self.spam_threshold && toxicity_score < self.toxicity_threshold {
            CommentStatus::Approved
        } else {
            CommentStatus::Pending
        }
    }
}

/// Score `comment` and persist the result. Provider errors are returned
/// untouched and leave the comment as it was.
pub async fn moderate<S>(
    store: &S,
    provider: &dyn AiProvider,
    config: &Config,
    comment: &Comment,
) -> Result<Comment>
where
    S: ArticleStore + ?Sized,
{
    let article_title = store
        .get_article(&comment.article_id)
        .await?
        .map(|a| a.title);
    let prompt = prompts::moderation_prompt(
        article_title.as_deref(),
        &comment.author,
        &comment.content,
        config.generation.max_prompt_chars,
    );

    let result: ModerationResult = gateway::complete(
        provider,
        prompts::MODERATION_SYSTEM,
        &prompt,
        Duration::from_secs(config.generation.timeout_secs),
    )
    .await?;

    let moderation = Moderation {
        spam_score: result.spam_score,
        toxicity_score: result.toxicity_score,
        suggested_reply: result
            .suggested_reply
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()),
        checked_at: Utc::now(),
    };
    let status = ApprovalPolicy::from(&config.moderation).decide(moderation.spam_score, moderation.toxicity_score);

    store.record_moderation(&comment.id, &moderation, status).await?;
    tracing::info!(
        comment_id = %comment.id,
        spam_score = moderation.spam_score,
        toxicity_score = moderation.toxicity_score,
        status = status.as_str(),
        "comment moderated"
    );

    Ok(Comment {
        status,
        moderation: Some(moderation),
        ..comment.clone()
    })
}

/// Store a new comment on `slug`, then moderate it.
pub async fn create_comment<S>(
    store: &S,
    provider: &dyn AiProvider,
    config: &Config,
    slug: &str,
    author: &str,
    content: &str,
) -> Result<Comment>
where
    S: ArticleStore + ?Sized,
{
    if author.trim().is_empty() {
        bail!("Comment author must not be empty");
    }
    if content.trim().is_empty() {
        bail!("Comment content must not be empty");
    }
    let article = match store.get_article_by_slug(slug).await? {
        Some(a) => a,
        None => bail!("Article not found: {}", slug),
    };

    let comment = Comment::new(&article.id, author.trim(), content.trim(), Utc::now());
    store.insert_comment(&comment).await?;

    match moderate(store, provider, config, &comment).await {
        Ok(moderated) => Ok(moderated),
        Err(e) => {
            tracing::warn!(
                comment_id = %comment.id,
                error = %e,
                "moderation failed, comment left pending for manual review"
            );
            Ok(comment)
        }
    }
}

/// Re-run moderation for a stored comment.
pub async fn moderate_comment<S>(
    store: &S,
    provider: &dyn AiProvider,
    config: &Config,
    comment_id: &str,
) -> Result<Comment>
where
    S: ArticleStore + ?Sized,
{
    let comment = match store.get_comment(comment_id).await? {
        Some(c) => c,
        None => bail!("Comment not found: {}", comment_id),
    };
    moderate(store, provider, config, &comment).await
}

fn print_comment(comment: &Comment) {
    println!("Comment {}: {}", comment.id, comment.status.as_str());
    match &comment.moderation {
        Some(m) => {
            println!(
                "  spam: {:.2}  toxicity: {:.2}",
                m.spam_score, m.toxicity_score
            );
            if let Some(reply) = &m.suggested_reply {
                println!("  suggested reply: {}", reply);
            }
        }
        None => println!("  not moderated; requires manual review"),
    }
}

pub async fn run_comment_add(
    config: &Config,
    slug: &str,
    author: &str,
    content: &str,
    provider_name: &str,
) -> Result<()> {
    let rt = Runtime::open(config).await?;
    let provider = rt.providers.get(provider_name)?;

    let comment = create_comment(&rt.store, provider.as_ref(), config, slug, author, content).await?;
    print_comment(&comment);

    rt.close().await;
    Ok(())
}

pub async fn run_comment_moderate(config: &Config, comment_id: &str, provider_name: &str) -> Result<()> {
    let rt = Runtime::open(config).await?;
    let provider = rt.providers.get(provider_name)?;

    let comment = moderate_comment(&rt.store, provider.as_ref(), config, comment_id).await?;
    print_comment(&comment);

    rt.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_thresholds_are_strict() {
        let policy = ApprovalPolicy::default();
        assert_eq!(policy.decide(0.1, 0.1), CommentStatus::Approved);
        assert_eq!(policy.decide(0.29, 0.0), CommentStatus::Approved);
        assert_eq!(policy.decide(0.3, 0.0), CommentStatus::Pending);
        assert_eq!(policy.decide(0.0, 0.3), CommentStatus::Pending);
        assert_eq!(policy.decide(0.9, 0.9), CommentStatus::Pending);
    }

    #[test]
    fn test_policy_from_config() {
        let policy = ApprovalPolicy::from(&ModerationConfig {
            spam_threshold: 0.5,
            toxicity_threshold: 0.1,
        });
        assert_eq!(policy.decide(0.4, 0.05), CommentStatus::Approved);
        assert_eq!(policy.decide(0.4, 0.2), CommentStatus::Pending);
    }
}
