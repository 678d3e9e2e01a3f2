//! Shared building blocks for the passim retrieval core: typed identifiers,
//! configuration loading, and the optional cache-service boundary.

pub mod cache;
pub mod config;
pub mod types;

pub use cache::{CacheService, InMemoryCache, NoopCache};
pub use config::PassimConfig;
pub use types::{CollectionId, DocumentId, JobId};
