use std::sync::Arc;
use std::time::Duration;

use passim_core::CacheService;

use crate::error::EmbedError;
use crate::provider::{BoxFuture, EmbedProvider};

/// Content fingerprint of a text, used as its cache address.
#[must_use]
pub fn fingerprint(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

fn cache_key(text: &str) -> String {
    format!("embedding:{}", fingerprint(text))
}

/// Content-addressed cache in front of an embedding provider.
///
/// Every input is fingerprinted; hits are served from the cache, and all
/// misses are collected into a single provider call whose results are
/// scattered back into input order. Only successful generations are written
/// back, so a provider outage never corrupts the cache. Two calls with the
/// same text inside the TTL reach the provider at most once.
pub struct CachedEmbedder {
    inner: Arc<dyn EmbedProvider>,
    cache: Arc<dyn CacheService>,
    ttl: Duration,
}

impl std::fmt::Debug for CachedEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedEmbedder")
            .field("provider", &self.inner.name())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl CachedEmbedder {
    #[must_use]
    pub fn new(inner: Arc<dyn EmbedProvider>, cache: Arc<dyn CacheService>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    async fn embed_all(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbedError> {
        let mut vectors: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut miss_indices = Vec::new();
        let mut miss_texts = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            let cached = self.cache.get(&cache_key(text)).await;
            match cached.and_then(|json| serde_json::from_str::<Vec<f32>>(&json).ok()) {
                Some(vector) => vectors[i] = Some(vector),
                None => {
                    miss_indices.push(i);
                    miss_texts.push(text.clone());
                }
            }
        }

        if !miss_texts.is_empty() {
            tracing::debug!(
                misses = miss_texts.len(),
                hits = texts.len() - miss_texts.len(),
                provider = self.inner.name(),
                "generating embeddings for cache misses"
            );
            let generated = self.inner.embed_batch(&miss_texts).await?;
            if generated.len() != miss_texts.len() {
                return Err(EmbedError::BatchMismatch {
                    expected: miss_texts.len(),
                    got: generated.len(),
                });
            }

            for ((i, text), vector) in miss_indices.into_iter().zip(&miss_texts).zip(generated) {
                let json = serde_json::to_string(&vector)?;
                self.cache.set(&cache_key(text), json, self.ttl).await;
                vectors[i] = Some(vector);
            }
        }

        // Every slot was filled by a hit or a generated vector.
        Ok(vectors.into_iter().flatten().collect())
    }
}

impl EmbedProvider for CachedEmbedder {
    fn embed_batch(&self, texts: &[String]) -> BoxFuture<'_, Result<Vec<Vec<f32>>, EmbedError>> {
        let texts = texts.to_vec();
        Box::pin(async move { self.embed_all(texts).await })
    }

    fn dimension(&self) -> u64 {
        self.inner.dimension()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
