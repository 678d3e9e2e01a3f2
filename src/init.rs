//! Process bootstrap: tracing setup and component wiring from config.

use std::sync::Arc;
use std::time::Duration;

use passim_core::{CacheService, InMemoryCache, NoopCache, PassimConfig};
use passim_embed::{CachedEmbedder, EmbedProvider, HttpEmbedder, MockEmbedder};
use passim_index::{InMemoryVectorStore, QdrantStore, SimilarityIndex, SummaryStore, VectorStore};

pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Build the similarity index and summary store described by `config`.
///
/// The embedding provider and vector store are selected by config:
/// `embedding.provider = "mock"` runs fully offline, and
/// `index.qdrant_url = "memory"` swaps Qdrant for the in-process store.
pub async fn build_components(
    config: &PassimConfig,
) -> anyhow::Result<(Arc<SimilarityIndex>, Arc<SummaryStore>)> {
    let cache: Arc<dyn CacheService> = if config.cache.enabled {
        Arc::new(InMemoryCache::new())
    } else {
        Arc::new(NoopCache)
    };

    let provider: Arc<dyn EmbedProvider> = match config.embedding.provider.as_str() {
        "mock" => Arc::new(MockEmbedder::new(config.embedding.dimension)),
        _ => Arc::new(HttpEmbedder::new(
            config.embedding.api_key.clone(),
            config.embedding.base_url.clone(),
            config.embedding.model.clone(),
            config.embedding.dimension,
        )),
    };
    let embedder = Arc::new(CachedEmbedder::new(
        provider,
        cache.clone(),
        Duration::from_secs(config.cache.embedding_ttl_secs),
    ));

    let store: Arc<dyn VectorStore> = if config.index.qdrant_url == "memory" {
        Arc::new(InMemoryVectorStore::new())
    } else {
        Arc::new(QdrantStore::new(&config.index.qdrant_url)?)
    };

    let index = Arc::new(SimilarityIndex::new(
        store,
        embedder,
        cache,
        config.index.collection.clone(),
        Duration::from_secs(config.cache.search_ttl_secs),
    ));
    index.ensure_ready().await?;

    let summaries = Arc::new(SummaryStore::connect(&config.index.summary_db_path).await?);
    Ok((index, summaries))
}
