//! Wiring shared by the CLI commands: the database-backed store, the
//! provider registry, and the embedding provider, built from one config.

use anyhow::Result;

use blog_augment_core::embedding::EmbeddingProvider;

use crate::ask::Semantic;
use crate::config::Config;
use crate::db;
use crate::embedding::create_provider;
use crate::providers::ProviderRegistry;
use crate::sqlite_store::SqliteStore;

pub struct Runtime {
    pub config: Config,
    pub store: SqliteStore,
    pub providers: ProviderRegistry,
    pub embedder: Box<dyn EmbeddingProvider>,
}

impl Runtime {
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        Ok(Self {
            config: config.clone(),
            store: SqliteStore::new(pool),
            providers: ProviderRegistry::from_config(&config.providers)?,
            embedder: create_provider(&config.embedding)?,
        })
    }

    /// Vector search backend, when embeddings are enabled.
    pub fn semantic(&self) -> Option<Semantic<'_>> {
        if !self.config.embedding.is_enabled() {
            return None;
        }
        Some(Semantic {
            embedder: self.embedder.as_ref(),
            vectors: &self.store,
        })
    }

    pub async fn close(self) {
        self.store.pool().close().await;
    }
}
