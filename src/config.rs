//! TOML configuration parsing and validation.
//!
//! One file, passed with `--config` (default `./config/blogai.toml`).
//! Only `[db]` is required; every other section has defaults.
//!
//! Credentials are never stored in the file by default: each provider names
//! an environment variable (`api_key_env`) that is resolved here, at load
//! time. A provider whose credential cannot be resolved is a configuration
//! error. There are no built-in fallback keys.
//!
//! ```toml
//! [db]
//! path = "./data/blogai.sqlite"
//!
//! [[providers]]
//! name = "deepseek"
//! kind = "deepseek"
//! api_key_env = "DEEPSEEK_API_KEY"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use blog_augment_core::chunk::DEFAULT_TARGET_CHARS;
use blog_augment_core::retrieval::DEFAULT_RETRIEVAL_LIMIT;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub moderation: ModerationConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_target_chars")]
    pub target_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_chars: DEFAULT_TARGET_CHARS,
        }
    }
}

fn default_target_chars() -> usize {
    DEFAULT_TARGET_CHARS
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Documents handed to the answering step.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Chunk hits requested from the vector store.
    #[serde(default = "default_semantic_limit")]
    pub semantic_limit: usize,
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
    /// Per-document excerpt length in the answer prompt.
    #[serde(default = "default_context_chars")]
    pub context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            semantic_limit: default_semantic_limit(),
            score_threshold: default_score_threshold(),
            context_chars: default_context_chars(),
        }
    }
}

fn default_limit() -> i64 {
    DEFAULT_RETRIEVAL_LIMIT
}
fn default_semantic_limit() -> usize {
    8
}
fn default_score_threshold() -> f32 {
    0.3
}
fn default_context_chars() -> usize {
    1500
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
    /// Article bodies are truncated to this many characters in prompts.
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_generation_timeout(),
            max_prompt_chars: default_max_prompt_chars(),
        }
    }
}

fn default_generation_timeout() -> u64 {
    60
}
fn default_max_prompt_chars() -> usize {
    6000
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModerationConfig {
    #[serde(default = "default_moderation_threshold")]
    pub spam_threshold: f64,
    #[serde(default = "default_moderation_threshold")]
    pub toxicity_threshold: f64,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            spam_threshold: default_moderation_threshold(),
            toxicity_threshold: default_moderation_threshold(),
        }
    }
}

fn default_moderation_threshold() -> f64 {
    0.3
}

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-large";
pub const DEFAULT_EMBEDDING_DIMS: usize = 3072;

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Timeout of each vector-store call.
    #[serde(default = "default_vector_timeout_secs")]
    pub vector_timeout_secs: u64,
    /// Overall bound on one embedding batch during vectorization, retries
    /// included. Query embedding in `ask` is bounded by `timeout_secs`.
    #[serde(default = "default_embed_budget_secs")]
    pub embed_budget_secs: u64,
    /// Resolved from `api_key_env` by [`load_config`].
    #[serde(skip)]
    pub credential: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            base_url: default_openai_base_url(),
            api_key_env: default_embedding_key_env(),
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
            vector_timeout_secs: 10,
            embed_budget_secs: 120,
            credential: String::new(),
        }
    }
}

fn default_embedding_provider() -> String {
    "disabled".to_string()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_embedding_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_embed_budget_secs() -> u64 {
    120
}
fn default_vector_timeout_secs() -> u64 {
    10
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

/// Wire protocol family of a generative provider.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    Deepseek,
    Openai,
    OpenaiCompatible,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Deepseek => "deepseek",
            ProviderKind::Openai => "openai",
            ProviderKind::OpenaiCompatible => "openai-compatible",
        }
    }

    fn default_base_url(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Deepseek => Some("https://api.deepseek.com/v1"),
            ProviderKind::Openai => Some("https://api.openai.com/v1"),
            ProviderKind::OpenaiCompatible => None,
        }
    }

    fn default_model(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Deepseek => Some("deepseek-chat"),
            ProviderKind::Openai => Some("gpt-4o-mini"),
            ProviderKind::OpenaiCompatible => None,
        }
    }
}

/// One `[[providers]]` entry.
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: ProviderKind,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Resolved by [`load_config`]. Never empty after a successful load.
    #[serde(skip)]
    pub credential: String,
}

impl ProviderConfig {
    /// Configured base URL, or the preset's default.
    pub fn resolved_base_url(&self) -> Option<String> {
        self.base_url
            .clone()
            .or_else(|| self.kind.default_base_url().map(str::to_string))
            .map(|u| u.trim_end_matches('/').to_string())
    }

    /// Configured model, or the preset's default.
    pub fn resolved_model(&self) -> Option<String> {
        self.model
            .clone()
            .or_else(|| self.kind.default_model().map(str::to_string))
    }
}

impl Config {
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }
}

fn resolve_env_credential(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate chunking
    if config.chunking.target_chars == 0 {
        bail!("chunking.target_chars must be > 0");
    }

    // Validate retrieval
    if config.retrieval.limit < 1 {
        bail!("retrieval.limit must be >= 1");
    }
    if config.retrieval.semantic_limit == 0 {
        bail!("retrieval.semantic_limit must be > 0");
    }
    if config.retrieval.context_chars == 0 {
        bail!("retrieval.context_chars must be > 0");
    }
    if !(-1.0..=1.0).contains(&config.retrieval.score_threshold) {
        bail!("retrieval.score_threshold must be in [-1.0, 1.0]");
    }

    // Validate generation
    if config.generation.timeout_secs == 0 {
        bail!("generation.timeout_secs must be > 0");
    }
    if config.generation.max_prompt_chars == 0 {
        bail!("generation.max_prompt_chars must be > 0");
    }

    // Validate moderation
    for (name, value) in [
        ("spam_threshold", config.moderation.spam_threshold),
        ("toxicity_threshold", config.moderation.toxicity_threshold),
    ] {
        if !(0.0..=1.0).contains(&value) {
            bail!("moderation.{} must be in [0.0, 1.0]", name);
        }
    }

    // Validate embedding
    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => bail!(
            "Unknown embedding provider: '{}'. Must be disabled or openai.",
            other
        ),
    }
    if config.embedding.is_enabled() {
        // An omitted model means the default model at its native width.
        if config.embedding.model.is_none() {
            config.embedding.model = Some(DEFAULT_EMBEDDING_MODEL.to_string());
            config.embedding.dims.get_or_insert(DEFAULT_EMBEDDING_DIMS);
        }
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.batch_size == 0 {
            bail!("embedding.batch_size must be > 0");
        }
        if config.embedding.timeout_secs == 0
            || config.embedding.vector_timeout_secs == 0
            || config.embedding.embed_budget_secs == 0
        {
            bail!("embedding timeouts must be > 0");
        }
        config.embedding.credential = resolve_env_credential(&config.embedding.api_key_env)
            .with_context(|| {
                format!(
                    "{} environment variable not set (required by embedding provider '{}')",
                    config.embedding.api_key_env, config.embedding.provider
                )
            })?;
    }

    // Validate providers
    let mut seen = HashSet::new();
    for provider in config.providers.iter_mut() {
        if provider.name.trim().is_empty() {
            bail!("providers.name must not be empty");
        }
        if !seen.insert(provider.name.clone()) {
            bail!("Duplicate provider name: '{}'", provider.name);
        }
        if provider.resolved_base_url().is_none() {
            bail!(
                "providers.base_url must be specified for '{}' (kind {})",
                provider.name,
                provider.kind.as_str()
            );
        }
        if provider.resolved_model().is_none() {
            bail!(
                "providers.model must be specified for '{}' (kind {})",
                provider.name,
                provider.kind.as_str()
            );
        }
        let var = provider.api_key_env.as_deref().with_context(|| {
            format!("providers.api_key_env must be specified for '{}'", provider.name)
        })?;
        provider.credential = resolve_env_credential(var).with_context(|| {
            format!(
                "{} environment variable not set (required by provider '{}')",
                var, provider.name
            )
        })?;
    }

    Ok(config)
}
