//! Structured (JSON) model responses.
//!
//! Every generative operation declares a response type implementing
//! [`StructuredResponse`]. Raw model output is parsed defensively:
//!
//! 1. Strip Markdown code fences (```` ```json ```` / ```` ``` ````).
//! 2. Parse as `T`.
//! 3. On failure, extract the first balanced `{...}` substring and parse
//!    again.
//! 4. Validate the parsed value.
//!
//! Any failure is a [`GenerationError::Format`] carrying the raw text. A
//! malformed response is never replaced with a default value.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// A typed, validated model response.
pub trait StructuredResponse: DeserializeOwned + Send {
    /// Example JSON object shown to the model.
    fn shape() -> serde_json::Value;

    /// Reject values that parsed but are unusable.
    fn validate(&self) -> Result<(), String>;
}

/// Summary and keywords for an article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    pub keywords: Vec<String>,
}

/// Maximum number of keywords accepted in a [`SummaryResult`].
pub const MAX_SUMMARY_KEYWORDS: usize = 10;

impl StructuredResponse for SummaryResult {
    fn shape() -> serde_json::Value {
        serde_json::json!({
            "summary": "2-3 sentence summary of the article",
            "keywords": ["keyword1", "keyword2", "keyword3"]
        })
    }

    fn validate(&self) -> Result<(), String> {
        if self.summary.trim().is_empty() {
            return Err("summary is empty".to_string());
        }
        if self.keywords.is_empty() {
            return Err("keywords is empty".to_string());
        }
        if self.keywords.len() > MAX_SUMMARY_KEYWORDS {
            return Err(format!(
                "too many keywords: {} (max {})",
                self.keywords.len(),
                MAX_SUMMARY_KEYWORDS
            ));
        }
        if self.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err("keywords contains an empty entry".to_string());
        }
        Ok(())
    }
}

/// Moderation scores for a comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationResult {
    pub spam_score: f64,
    pub toxicity_score: f64,
    #[serde(default)]
    pub suggested_reply: Option<String>,
}

impl StructuredResponse for ModerationResult {
    fn shape() -> serde_json::Value {
        serde_json::json!({
            "spam_score": 0.0,
            "toxicity_score": 0.0,
            "suggested_reply": "optional short friendly reply, or null"
        })
    }

    fn validate(&self) -> Result<(), String> {
        for (name, score) in [
            ("spam_score", self.spam_score),
            ("toxicity_score", self.toxicity_score),
        ] {
            if !score.is_finite() || !(0.0..=1.0).contains(&score) {
                return Err(format!("{} out of range [0, 1]: {}", name, score));
            }
        }
        Ok(())
    }
}

/// Grounded answer to a reader's question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
}

impl StructuredResponse for AnswerResult {
    fn shape() -> serde_json::Value {
        serde_json::json!({ "answer": "answer grounded in the provided articles" })
    }

    fn validate(&self) -> Result<(), String> {
        if self.answer.trim().is_empty() {
            return Err("answer is empty".to_string());
        }
        Ok(())
    }
}

/// Strip Markdown code fences the model may wrap around its JSON.
pub fn strip_code_fences(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```JSON")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Return the first balanced `{...}` substring, honoring JSON strings and
/// escapes so braces inside string values do not end the object early.
pub fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse and validate raw model output as `T`.
pub fn parse_structured<T: StructuredResponse>(provider: &str, raw: &str) -> Result<T, GenerationError> {
    let format_error = |reason: String| GenerationError::Format {
        provider: provider.to_string(),
        reason,
        raw: raw.to_string(),
    };

    let stripped = strip_code_fences(raw);
    let value: T = match serde_json::from_str(stripped) {
        Ok(v) => v,
        Err(first_err) => {
            let candidate = first_balanced_object(stripped)
                .ok_or_else(|| format_error(format!("no JSON object found: {}", first_err)))?;
            serde_json::from_str(candidate).map_err(|e| format_error(e.to_string()))?
        }
    };

    value.validate().map_err(format_error)?;
    Ok(value)
}
