//! Embedding generation behind a provider boundary.
//!
//! [`HttpEmbedder`] talks to any OpenAI-compatible `/embeddings` endpoint;
//! [`CachedEmbedder`] wraps a provider with a content-addressed TTL cache so
//! identical text is never embedded twice while the cache holds.

mod cached;
mod error;
pub mod http;
mod openai;
mod provider;

#[cfg(any(test, feature = "mock"))]
mod mock;

pub use cached::{CachedEmbedder, fingerprint};
pub use error::EmbedError;
pub use openai::HttpEmbedder;
pub use provider::EmbedProvider;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;
