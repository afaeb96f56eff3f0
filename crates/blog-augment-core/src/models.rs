//! Core data models shared by the augmentation pipeline.
//!
//! Articles and comments are owned by the persistence layer; the
//! augmentation subsystem only reads them and updates the AI-derived
//! fields (summary, keywords, category, vectorized flag, moderation).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Article category produced by the taxonomy classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Tech,
    Life,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Tech => "tech",
            Category::Life => "life",
        }
    }

    /// Human-readable label shown next to the category.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Tech => "技术博客",
            Category::Life => "生活记录",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "tech" => Ok(Category::Tech),
            "life" => Ok(Category::Life),
            other => anyhow::bail!("Unknown category: '{}'. Must be tech or life.", other),
        }
    }
}

/// A blog article as seen by the augmentation subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub summary: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub ai_summary_at: Option<DateTime<Utc>>,
    pub vectorized: bool,
    pub category: Category,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

impl Article {
    /// Build a fresh, published article with every AI field unset.
    pub fn new(slug: &str, title: &str, body: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            slug: slug.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            summary: None,
            keywords: None,
            ai_summary_at: None,
            vectorized: false,
            category: Category::default(),
            published: true,
            created_at,
        }
    }
}

/// A cached AI artifact: summary plus keyword list, generated together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub summary: String,
    pub keywords: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Document handed to the answering step as retrieval context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceDocument {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub body: String,
}

impl From<&Article> for SourceDocument {
    fn from(a: &Article) -> Self {
        SourceDocument {
            id: a.id.clone(),
            title: a.title.clone(),
            slug: a.slug.clone(),
            body: a.body.clone(),
        }
    }
}

/// Review state of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    /// Requires manual review. Also the state after a failed moderation call.
    #[default]
    Pending,
    Approved,
}

impl CommentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentStatus::Pending => "pending",
            CommentStatus::Approved => "approved",
        }
    }
}

impl FromStr for CommentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "pending" => Ok(CommentStatus::Pending),
            "approved" => Ok(CommentStatus::Approved),
            other => anyhow::bail!("Unknown comment status: '{}'", other),
        }
    }
}

/// AI-derived moderation fields. Set together or not at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Moderation {
    pub spam_score: f64,
    pub toxicity_score: f64,
    pub suggested_reply: Option<String>,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub article_id: String,
    pub author: String,
    pub content: String,
    pub status: CommentStatus,
    pub moderation: Option<Moderation>,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(article_id: &str, author: &str, content: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            article_id: article_id.to_string(),
            author: author.to_string(),
            content: content.to_string(),
            status: CommentStatus::Pending,
            moderation: None,
            created_at,
        }
    }

    pub fn is_checked(&self) -> bool {
        self.moderation.is_some()
    }
}

/// A chunk of an article's body, the unit of embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingChunk {
    /// Stable id derived from `(article_id, chunk_index)`.
    pub id: String,
    pub article_id: String,
    pub chunk_index: i64,
    pub text: String,
    /// SHA-256 of `text`.
    pub hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip_and_labels() {
        assert_eq!("tech".parse::<Category>().unwrap(), Category::Tech);
        assert_eq!("life".parse::<Category>().unwrap(), Category::Life);
        assert!("food".parse::<Category>().is_err());
        assert_eq!(Category::default(), Category::Tech);
        assert_eq!(Category::Tech.label(), "技术博客");
        assert_eq!(Category::Life.label(), "生活记录");
    }

    #[test]
    fn test_new_comment_is_unchecked_and_pending() {
        let c = Comment::new("a1", "alice", "nice post", Utc::now());
        assert!(!c.is_checked());
        assert_eq!(c.status, CommentStatus::Pending);
    }
}
