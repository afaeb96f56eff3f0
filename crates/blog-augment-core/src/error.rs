//! Error taxonomy of the augmentation subsystem.
//!
//! Generation errors carry the full provider detail in their `Display`
//! output for logs; [`GenerationError::user_message`] gives the sanitized
//! text that may be shown to readers.

use std::time::Duration;
use thiserror::Error;

/// Terminal failure of one generation request.
///
/// None of these are retried by the gateway. Retry policy belongs to the
/// caller.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The provider did not answer within the caller-supplied timeout.
    #[error("{provider}: generation timed out after {}s", .after.as_secs_f64())]
    Timeout { provider: String, after: Duration },

    /// The response could not be parsed or failed validation.
    #[error("{provider}: malformed structured response ({reason}); raw: {raw}")]
    Format {
        provider: String,
        reason: String,
        raw: String,
    },

    /// Missing or rejected credential (HTTP 401/403).
    #[error("{provider}: authentication failed: {message}")]
    Auth { provider: String, message: String },

    /// Connection failure, rate limiting, or a 5xx from the provider.
    #[error("{provider}: provider unavailable: {message}")]
    Unavailable { provider: String, message: String },

    /// Any other non-success status.
    #[error("{provider}: request rejected with status {status}: {message}")]
    Rejected {
        provider: String,
        status: u16,
        message: String,
    },
}

impl GenerationError {
    /// Sanitized, reader-facing message. Never includes provider output.
    pub fn user_message(&self) -> &'static str {
        match self {
            GenerationError::Timeout { .. } => "AI 服务响应超时，请稍后重试",
            GenerationError::Format { .. } => "AI 返回的内容格式异常，请稍后重试",
            GenerationError::Auth { .. } => "AI 服务认证失败，请检查服务配置",
            GenerationError::Unavailable { .. } => "AI 服务暂时不可用，请稍后重试",
            GenerationError::Rejected { .. } => "AI 服务拒绝了本次请求",
        }
    }

    /// Terminal state of the request that produced this error.
    pub fn state(&self) -> RequestState {
        match self {
            GenerationError::Timeout { .. } => RequestState::TimedOut,
            GenerationError::Format { .. } => RequestState::FormatError,
            GenerationError::Auth { .. } => RequestState::AuthError,
            GenerationError::Unavailable { .. } | GenerationError::Rejected { .. } => {
                RequestState::Unavailable
            }
        }
    }
}

/// Lifecycle of a single gateway request.
///
/// `Pending` moves to exactly one terminal state; terminal states are never
/// left again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    Completed,
    TimedOut,
    FormatError,
    AuthError,
    Unavailable,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestState::Pending)
    }
}

/// Retrieval could not produce any context.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetrievalError {
    /// No published article exists. Non-fatal: callers answer with a canned
    /// response and skip the provider call.
    #[error("no published content available")]
    EmptyCorpus,
}
