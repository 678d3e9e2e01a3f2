//! Persistent similarity index over document passages.
//!
//! Chunks are contextually enhanced, embedded, and stored as vector points;
//! queries go through the same enhancement so both sides of a comparison
//! live in one semantic space. Search is scoped to a document or a whole
//! collection, results carry raw similarity scores, and a configurable
//! [`RelevancePolicy`] provides the two-tier cutoff convention for callers
//! that need one.

mod enhance;
mod error;
mod in_memory_store;
mod index;
mod policy;
mod qdrant;
mod summaries;
mod vector_store;

pub use enhance::{derive_topic, enhance_chunk, enhance_query};
pub use error::IndexError;
pub use in_memory_store::InMemoryVectorStore;
pub use index::{DocumentMeta, ResultMetadata, SearchResult, SearchScope, SimilarityIndex};
pub use policy::RelevancePolicy;
pub use qdrant::QdrantStore;
pub use summaries::SummaryStore;
pub use vector_store::{
    FieldCondition, FieldValue, ScoredVectorPoint, VectorFilter, VectorPoint, VectorStore,
    VectorStoreError,
};
