//! AI provider trait.
//!
//! A provider turns one prompt into raw model text. Parsing, validation and
//! timeouts are applied on top by the gateway in the application crate, so
//! every provider gets the same defensive handling.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::GenerationError;

/// One completion request: a system instruction, a user prompt, and a
/// description of the JSON shape the answer must follow.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    /// Example of the expected JSON object, appended to the system
    /// instruction so the model knows which keys to produce.
    pub response_shape: serde_json::Value,
}

impl CompletionRequest {
    /// System instruction with the response contract appended.
    pub fn system_with_contract(&self) -> String {
        format!(
            "{}\n\nRespond with a single JSON object only, shaped like:\n{}",
            self.system, self.response_shape
        )
    }
}

/// Interchangeable large-language-model backend.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Configured provider name (e.g. `"deepseek"`).
    fn name(&self) -> &str;
    /// Model identifier sent with each request.
    fn model(&self) -> &str;
    /// Send the request and return the raw message content.
    async fn complete_raw(&self, request: &CompletionRequest) -> Result<String, GenerationError>;
}
