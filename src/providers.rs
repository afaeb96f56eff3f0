//! Generative AI provider backends and the provider registry.
//!
//! Every configured provider speaks the OpenAI-style chat completions
//! protocol. The `deepseek` and `openai` kinds differ only in their default
//! base URL and model; `openai-compatible` must name both.
//!
//! # HTTP status mapping
//!
//! | Status | Error |
//! |--------|-------|
//! | 401, 403 | [`GenerationError::Auth`] |
//! | 429, 5xx, connection failure | [`GenerationError::Unavailable`] |
//! | other non-2xx | [`GenerationError::Rejected`] |
//! | 2xx with an unreadable envelope | [`GenerationError::Format`] |

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use blog_augment_core::error::GenerationError;
use blog_augment_core::provider::{AiProvider, CompletionRequest};

use crate::config::{Config, ProviderConfig};

#[derive(Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Provider for any `POST {base_url}/chat/completions` endpoint.
pub struct ChatCompletionsProvider {
    name: String,
    model: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl ChatCompletionsProvider {
    pub fn new(name: &str, base_url: &str, model: &str, api_key: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            bail!("Provider '{}' has no credential", name);
        }
        Ok(Self {
            name: name.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: reqwest::Client::builder().build()?,
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let base_url = match config.resolved_base_url() {
            Some(url) => url,
            None => bail!("Provider '{}' has no base_url", config.name),
        };
        let model = match config.resolved_model() {
            Some(model) => model,
            None => bail!("Provider '{}' has no model", config.name),
        };
        Self::new(&config.name, &base_url, &model, &config.credential)
    }

    fn status_error(&self, status: reqwest::StatusCode, body: String) -> GenerationError {
        let provider = self.name.clone();
        match status.as_u16() {
            401 | 403 => GenerationError::Auth {
                provider,
                message: format!("{}: {}", status, body),
            },
            429 | 500..=599 => GenerationError::Unavailable {
                provider,
                message: format!("{}: {}", status, body),
            },
            code => GenerationError::Rejected {
                provider,
                status: code,
                message: body,
            },
        }
    }
}

#[async_trait]
impl AiProvider for ChatCompletionsProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete_raw(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
        let system = request.system_with_contract();
        let body = ChatCompletionsRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            stream: false,
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Unavailable {
                provider: self.name.clone(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| GenerationError::Unavailable {
            provider: self.name.clone(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(self.status_error(status, text));
        }

        let envelope: ChatCompletionsResponse =
            serde_json::from_str(&text).map_err(|e| GenerationError::Format {
                provider: self.name.clone(),
                reason: format!("invalid completion envelope: {}", e),
                raw: text.clone(),
            })?;

        envelope
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GenerationError::Format {
                provider: self.name.clone(),
                reason: "completion has no message content".to_string(),
                raw: text,
            })
    }
}

/// Named providers, resolved at call time by name.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn AiProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one [`ChatCompletionsProvider`] per `[[providers]]` entry.
    pub fn from_config(configs: &[ProviderConfig]) -> Result<Self> {
        let mut registry = Self::new();
        for config in configs {
            registry.register(Arc::new(ChatCompletionsProvider::from_config(config)?))?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, provider: Arc<dyn AiProvider>) -> Result<()> {
        let name = provider.name().to_string();
        if self.providers.contains_key(&name) {
            bail!("Duplicate provider name: '{}'", name);
        }
        self.providers.insert(name, provider);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn AiProvider>> {
        match self.providers.get(name) {
            Some(p) => Ok(p.clone()),
            None => bail!(
                "Unknown provider: '{}'. Configured: [{}]",
                name,
                self.names().join(", ")
            ),
        }
    }

    /// Provider names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

/// `blogai providers`: list configured providers. Credentials are never
/// printed.
pub fn run_providers(config: &Config) -> Result<()> {
    if config.providers.is_empty() {
        println!("No providers configured. Add a [[providers]] section to the config.");
        return Ok(());
    }

    println!("{:<16} {:<18} {:<20} BASE URL", "NAME", "KIND", "MODEL");
    for p in &config.providers {
        println!(
            "{:<16} {:<18} {:<20} {}",
            p.name,
            p.kind.as_str(),
            p.resolved_model().unwrap_or_default(),
            p.resolved_base_url().unwrap_or_default()
        );
    }

    if config.embedding.is_enabled() {
        println!();
        println!(
            "Embedding: {} {} ({} dims)",
            config.embedding.provider,
            config.embedding.model.as_deref().unwrap_or("-"),
            config.embedding.dims.unwrap_or(0)
        );
    } else {
        println!();
        println!("Embedding: disabled (keyword retrieval only)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;

    fn provider_config(name: &str, kind: ProviderKind) -> ProviderConfig {
        ProviderConfig {
            name: name.to_string(),
            kind,
            base_url: None,
            model: None,
            api_key_env: Some("UNUSED".to_string()),
            credential: "sk-test".to_string(),
        }
    }

    #[test]
    fn test_registry_resolves_presets_by_name() {
        let registry = ProviderRegistry::from_config(&[
            provider_config("deepseek", ProviderKind::Deepseek),
            provider_config("openai", ProviderKind::Openai),
        ])
        .unwrap();

        assert_eq!(registry.names(), vec!["deepseek", "openai"]);
        assert_eq!(registry.get("deepseek").unwrap().model(), "deepseek-chat");
        assert!(registry.get("claude").is_err());
    }

    #[test]
    fn test_empty_credential_rejected() {
        let mut config = provider_config("deepseek", ProviderKind::Deepseek);
        config.credential = String::new();
        assert!(ChatCompletionsProvider::from_config(&config).is_err());
    }

    #[test]
    fn test_status_mapping() {
        let p = ChatCompletionsProvider::new("p", "http://localhost", "m", "k").unwrap();
        let err = |code: u16| p.status_error(reqwest::StatusCode::from_u16(code).unwrap(), "x".into());
        assert!(matches!(err(401), GenerationError::Auth { .. }));
        assert!(matches!(err(403), GenerationError::Auth { .. }));
        assert!(matches!(err(429), GenerationError::Unavailable { .. }));
        assert!(matches!(err(503), GenerationError::Unavailable { .. }));
        assert!(matches!(err(400), GenerationError::Rejected { status: 400, .. }));
    }
}
