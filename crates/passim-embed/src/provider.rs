use std::future::Future;
use std::pin::Pin;

use crate::error::EmbedError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Batch embedding boundary.
///
/// Implementations must return exactly one vector per input, in input order,
/// and must fail the whole call rather than return partial results.
pub trait EmbedProvider: Send + Sync {
    fn embed_batch(&self, texts: &[String]) -> BoxFuture<'_, Result<Vec<Vec<f32>>, EmbedError>>;

    /// Dimension of every vector this provider produces.
    fn dimension(&self) -> u64;

    fn name(&self) -> &str;
}
