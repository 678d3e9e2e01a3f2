//! Test-only deterministic embedding provider.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::EmbedError;
use crate::provider::{BoxFuture, EmbedProvider};

/// Bag-of-words feature-hashing embedder.
///
/// Each lowercased alphanumeric token is hashed into a bucket and the bucket
/// counts are L2-normalized, so texts sharing words score high under cosine
/// similarity while unrelated texts score near zero. Deterministic: the same
/// text always produces the same vector.
#[derive(Debug)]
pub struct MockEmbedder {
    dimension: u64,
    fail: bool,
    calls: AtomicUsize,
    batches: Mutex<Vec<Vec<String>>>,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self {
            dimension: 384,
            fail: false,
            calls: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
        }
    }
}

impl MockEmbedder {
    #[must_use]
    pub fn new(dimension: u64) -> Self {
        Self {
            dimension,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of `embed_batch` calls that reached this provider.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Every batch of texts this provider was asked to embed.
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().map(|b| b.clone()).unwrap_or_default()
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        #[expect(clippy::cast_possible_truncation)]
        let dim = self.dimension as usize;
        let mut vector = vec![0.0f32; dim];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = blake3::hash(token.to_lowercase().as_bytes());
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&hash.as_bytes()[..8]);
            #[expect(clippy::cast_possible_truncation)]
            let bucket = (u64::from_le_bytes(bytes) % self.dimension) as usize;
            vector[bucket] += 1.0;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl EmbedProvider for MockEmbedder {
    fn embed_batch(&self, texts: &[String]) -> BoxFuture<'_, Result<Vec<Vec<f32>>, EmbedError>> {
        let texts = texts.to_vec();
        Box::pin(async move {
            if self.fail {
                return Err(EmbedError::Other("mock embed error".into()));
            }
            self.calls.fetch_add(1, Ordering::Relaxed);
            if let Ok(mut batches) = self.batches.lock() {
                batches.push(texts.clone());
            }
            Ok(texts.iter().map(|t| self.embed_one(t)).collect())
        })
    }

    fn dimension(&self) -> u64 {
        self.dimension
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn identical_text_identical_vector() {
        let mock = MockEmbedder::default();
        let a = mock.embed_batch(&["hello world".to_owned()]).await.unwrap();
        let b = mock.embed_batch(&["hello world".to_owned()]).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn shared_words_score_higher_than_disjoint() {
        let mock = MockEmbedder::default();
        let vectors = mock
            .embed_batch(&[
                "photosynthesis converts light energy".to_owned(),
                "photosynthesis converts light energy into chemical energy".to_owned(),
                "quarterly revenue grew nine percent".to_owned(),
            ])
            .await
            .unwrap();

        let related = cosine(&vectors[0], &vectors[1]);
        let unrelated = cosine(&vectors[0], &vectors[2]);
        assert!(related > 0.7, "related texts should score high: {related}");
        assert!(unrelated < 0.1, "disjoint texts should score low: {unrelated}");
    }

    #[tokio::test]
    async fn vectors_are_normalized() {
        let mock = MockEmbedder::default();
        let vectors = mock.embed_batch(&["some words here".to_owned()]).await.unwrap();
        let norm: f32 = vectors[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn failing_mock_errors() {
        let mock = MockEmbedder::failing();
        assert!(mock.embed_batch(&["x".to_owned()]).await.is_err());
        assert_eq!(mock.calls(), 0);
    }
}
