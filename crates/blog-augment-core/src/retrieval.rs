//! Keyword retrieval of grounding documents for question answering.
//!
//! # Algorithm
//!
//! 1. [`extract_keywords`]: replace CJK and Latin punctuation with spaces,
//!    split on whitespace, drop tokens shorter than
//!    [`MIN_KEYWORD_CHARS`], keep the first [`MAX_KEYWORDS`].
//! 2. Primary: published articles whose title or body contains any keyword
//!    (case-insensitive), newest first.
//! 3. Fallback: zero keywords or zero matches select the most recent
//!    published articles instead, so a non-empty corpus never produces an
//!    empty context.
//! 4. An empty corpus is [`RetrievalError::EmptyCorpus`].
//!
//! Semantic retrieval (vector search) is layered on top by the app crate
//! and reports [`RetrievalStrategy::Semantic`].

use anyhow::Result;
use serde::Serialize;

use crate::error::RetrievalError;
use crate::models::SourceDocument;
use crate::store::ArticleStore;

/// Default number of documents handed to the answering step.
pub const DEFAULT_RETRIEVAL_LIMIT: i64 = 5;
/// Maximum number of keywords taken from a question.
pub const MAX_KEYWORDS: usize = 5;
/// Tokens shorter than this (in characters) are discarded.
pub const MIN_KEYWORD_CHARS: usize = 2;

/// Sentence punctuation only; symbols such as `+`, `#` and `.` inside a
/// token belong to terms like `C++`, `C#` and `node.js`.
const LATIN_PUNCTUATION: &[char] = &[',', '!', '?', ';', ':', '"', '\'', '(', ')'];

const CJK_PUNCTUATION: &[char] = &[
    '，', '。', '！', '？', '；', '：', '、', '“', '”', '‘', '’', '（', '）', '《', '》', '【', '】', '…',
    '—', '·', '「', '」',
];

/// How a [`Retrieval`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalStrategy {
    Keyword,
    Recent,
    Semantic,
}

impl RetrievalStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalStrategy::Keyword => "keyword",
            RetrievalStrategy::Recent => "recent",
            RetrievalStrategy::Semantic => "semantic",
        }
    }
}

/// Ordered grounding documents for one question. Never empty.
#[derive(Debug, Clone, Serialize)]
pub struct Retrieval {
    pub keywords: Vec<String>,
    pub documents: Vec<SourceDocument>,
    pub strategy: RetrievalStrategy,
}

/// Extract up to [`MAX_KEYWORDS`] search terms from a question, in order.
///
/// ```rust
/// use blog_augment_core::retrieval::extract_keywords;
///
/// assert_eq!(extract_keywords("Vue 的响应式原理是什么？"), vec!["Vue", "的响应式原理是什么"]);
/// assert!(extract_keywords("a, b!").is_empty());
/// ```
pub fn extract_keywords(question: &str) -> Vec<String> {
    let normalized: String = question
        .chars()
        .map(|c| {
            if LATIN_PUNCTUATION.contains(&c) || CJK_PUNCTUATION.contains(&c) {
                ' '
            } else {
                c
            }
        })
        .collect();

    let mut keywords: Vec<String> = Vec::new();
    // A period ends a sentence only at the end of a token: `node.js` stays whole.
    for token in normalized.split_whitespace().map(|t| t.trim_end_matches('.')) {
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
        if token.chars().count() < MIN_KEYWORD_CHARS || keywords.iter().any(|k| k == token) {
            continue;
        }
        keywords.push(token.to_string());
    }
    keywords
}

/// Select grounding documents for `question`.
///
/// Returns `Ok(Err(EmptyCorpus))` when nothing is published, so callers can
/// tell a non-fatal empty corpus apart from a storage failure.
pub async fn retrieve<S>(store: &S, question: &str, limit: i64) -> Result<std::result::Result<Retrieval, RetrievalError>>
where
    S: ArticleStore + ?Sized,
{
    if store.count_published().await? == 0 {
        return Ok(Err(RetrievalError::EmptyCorpus));
    }

    let keywords = extract_keywords(question);
    if !keywords.is_empty() {
        let matched = store.keyword_search(&keywords, limit).await?;
        if !matched.is_empty() {
            return Ok(Ok(Retrieval {
                keywords,
                documents: matched.iter().map(SourceDocument::from).collect(),
                strategy: RetrievalStrategy::Keyword,
            }));
        }
    }

    let recent = store.recent(limit).await?;
    if recent.is_empty() {
        return Ok(Err(RetrievalError::EmptyCorpus));
    }
    Ok(Ok(Retrieval {
        keywords,
        documents: recent.iter().map(SourceDocument::from).collect(),
        strategy: RetrievalStrategy::Recent,
    }))
}
