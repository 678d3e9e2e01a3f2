use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PassimConfig {
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub index: IndexConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub dimension: u64,
}

#[derive(Debug, Deserialize)]
pub struct IndexConfig {
    pub qdrant_url: String,
    pub collection: String,
    pub summary_db_path: String,
    pub top_k: usize,
    pub relevance: RelevanceConfig,
}

/// Two-tier relevance cutoffs applied on top of raw similarity scores.
///
/// `primary` is the preferred floor; when fewer than `min_results` candidates
/// clear it, candidates above `secondary` are merged in as well. Tune per
/// embedding model.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RelevanceConfig {
    pub primary: f32,
    pub secondary: f32,
    pub min_results: usize,
}

#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub embedding_ttl_secs: u64,
    pub search_ttl_secs: u64,
}

impl PassimConfig {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("PASSIM_EMBED_PROVIDER") {
            self.embedding.provider = v;
        }
        if let Ok(v) = std::env::var("PASSIM_EMBED_BASE_URL") {
            self.embedding.base_url = v;
        }
        if let Ok(v) = std::env::var("PASSIM_EMBED_API_KEY") {
            self.embedding.api_key = v;
        }
        if let Ok(v) = std::env::var("PASSIM_EMBED_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("PASSIM_QDRANT_URL") {
            self.index.qdrant_url = v;
        }
    }

    fn default() -> Self {
        Self {
            chunking: ChunkingConfig {
                chunk_size: 1000,
                overlap: 200,
            },
            embedding: EmbeddingConfig {
                provider: "mock".into(),
                base_url: "http://localhost:11434/v1".into(),
                api_key: String::new(),
                model: "text-embedding-3-large".into(),
                dimension: 3072,
            },
            index: IndexConfig {
                qdrant_url: "http://localhost:6334".into(),
                collection: "passim_chunks".into(),
                summary_db_path: "./data/passim.db".into(),
                top_k: 5,
                relevance: RelevanceConfig {
                    primary: 0.4,
                    secondary: 0.3,
                    min_results: 2,
                },
            },
            cache: CacheConfig {
                enabled: true,
                embedding_ttl_secs: 86_400,
                search_ttl_secs: 600,
            },
        }
    }
}
