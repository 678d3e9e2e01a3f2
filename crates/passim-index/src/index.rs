use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use passim_chunk::Chunk;
use passim_core::{CacheService, CollectionId, DocumentId};
use passim_embed::{EmbedError, EmbedProvider, fingerprint};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::enhance::{derive_topic, enhance_chunk, enhance_query};
use crate::error::IndexError;
use crate::vector_store::{
    FieldCondition, FieldValue, ScoredVectorPoint, VectorFilter, VectorPoint, VectorStore,
};

/// Filtering boundary for a similarity search: one document or one whole
/// collection, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    Document(DocumentId),
    Collection(CollectionId),
}

impl SearchScope {
    fn filter(self) -> VectorFilter {
        let condition = match self {
            Self::Document(id) => FieldCondition {
                field: "document_id".into(),
                value: FieldValue::Integer(id.0),
            },
            Self::Collection(id) => FieldCondition {
                field: "collection_id".into(),
                value: FieldValue::Integer(id.0),
            },
        };
        VectorFilter {
            must: vec![condition],
        }
    }

    fn cache_prefix(self) -> String {
        match self {
            Self::Document(id) => format!("search:doc:{id}:"),
            Self::Collection(id) => format!("search:col:{id}:"),
        }
    }
}

/// Document-level context attached to every chunk of an `add` call.
#[derive(Debug, Clone)]
pub struct DocumentMeta {
    pub document_id: DocumentId,
    pub collection_id: CollectionId,
    pub doc_name: String,
    pub display_name: String,
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub document_id: DocumentId,
    pub collection_id: CollectionId,
    pub doc_name: String,
    pub display_name: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub page_number: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub content: String,
    pub metadata: ResultMetadata,
    pub score: f32,
}

/// Scoped similarity search over enhanced, embedded passages.
///
/// Indexing and querying share the enhancement function, the embedding
/// provider, and the vector store; search results for a `(query, scope)`
/// pair are cached with a short TTL, and every mutation invalidates the
/// affected scope's cache entries and emits a collection-keyed invalidation
/// signal for downstream consumers.
pub struct SimilarityIndex {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbedProvider>,
    cache: Arc<dyn CacheService>,
    collection: String,
    search_ttl: Duration,
    invalidation_tx: broadcast::Sender<CollectionId>,
}

impl std::fmt::Debug for SimilarityIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityIndex")
            .field("collection", &self.collection)
            .field("embedder", &self.embedder.name())
            .finish_non_exhaustive()
    }
}

impl SimilarityIndex {
    #[must_use]
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbedProvider>,
        cache: Arc<dyn CacheService>,
        collection: impl Into<String>,
        search_ttl: Duration,
    ) -> Self {
        let (invalidation_tx, _) = broadcast::channel(16);
        Self {
            store,
            embedder,
            cache,
            collection: collection.into(),
            search_ttl,
            invalidation_tx,
        }
    }

    /// Ensure the backing collection exists with this embedder's dimension.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or creation fails.
    pub async fn ensure_ready(&self) -> Result<(), IndexError> {
        self.store
            .ensure_collection(&self.collection, self.embedder.dimension())
            .await?;
        Ok(())
    }

    /// Subscribe to collection-keyed invalidation signals emitted after
    /// successful `add` and `delete` calls.
    #[must_use]
    pub fn subscribe_invalidations(&self) -> broadcast::Receiver<CollectionId> {
        self.invalidation_tx.subscribe()
    }

    /// Index a document's chunks.
    ///
    /// Each chunk is enhanced with the same contextual tags used at query
    /// time, the whole batch is embedded in one provider call, and all rows
    /// are persisted atomically: a failure anywhere leaves no partial chunk
    /// set for this call.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or persistence fails. On error, no
    /// rows from this call survive.
    pub async fn add(&self, chunks: &[Chunk], meta: &DocumentMeta) -> Result<(), IndexError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let topic = derive_topic(&meta.doc_name);
        let enhanced: Vec<String> = chunks
            .iter()
            .map(|c| enhance_chunk(&c.text, meta.subject.as_deref(), topic.as_deref(), c.page))
            .collect();

        let vectors = self.embedder.embed_batch(&enhanced).await?;
        if vectors.len() != chunks.len() {
            return Err(IndexError::Embed(EmbedError::BatchMismatch {
                expected: chunks.len(),
                got: vectors.len(),
            }));
        }

        let points: Vec<VectorPoint> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| {
                let mut payload = HashMap::from([
                    ("document_id".to_owned(), serde_json::json!(meta.document_id.0)),
                    (
                        "collection_id".to_owned(),
                        serde_json::json!(meta.collection_id.0),
                    ),
                    ("doc_name".to_owned(), serde_json::json!(meta.doc_name)),
                    (
                        "display_name".to_owned(),
                        serde_json::json!(meta.display_name),
                    ),
                    ("content".to_owned(), serde_json::json!(chunk.text)),
                    ("chunk_index".to_owned(), serde_json::json!(chunk.index)),
                    ("total_chunks".to_owned(), serde_json::json!(chunk.total)),
                ]);
                if let Some(page) = chunk.page {
                    payload.insert("page_number".to_owned(), serde_json::json!(page));
                }
                VectorPoint {
                    id: uuid::Uuid::new_v4().to_string(),
                    vector,
                    payload,
                }
            })
            .collect();

        self.store.upsert(&self.collection, points).await?;

        tracing::info!(
            document = %meta.document_id,
            collection = %meta.collection_id,
            chunks = chunks.len(),
            "indexed document chunks"
        );
        self.invalidate(meta.document_id, meta.collection_id).await;
        Ok(())
    }

    /// Search for the `k` most similar passages within `scope`.
    ///
    /// When `subject` or `topic` is given, the query is enhanced with the
    /// same tags used at indexing time. Results carry raw similarity scores
    /// in descending order; apply a [`crate::RelevancePolicy`] for a
    /// relevance cutoff.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the query or the store search fails,
    /// so callers can distinguish "no relevant passages" from "retrieval
    /// failed".
    pub async fn search(
        &self,
        query: &str,
        scope: SearchScope,
        k: usize,
        subject: Option<&str>,
        topic: Option<&str>,
    ) -> Result<Vec<SearchResult>, IndexError> {
        let enhanced = if subject.is_some() || topic.is_some() {
            enhance_query(query, subject, topic)
        } else {
            query.to_owned()
        };

        let cache_key = format!("{}{}:{k}", scope.cache_prefix(), fingerprint(&enhanced));
        if let Some(json) = self.cache.get(&cache_key).await
            && let Ok(results) = serde_json::from_str::<Vec<SearchResult>>(&json)
        {
            tracing::debug!(scope = ?scope, "serving cached search results");
            return Ok(results);
        }

        let vectors = self
            .embedder
            .embed_batch(std::slice::from_ref(&enhanced))
            .await?;
        let vector = vectors
            .into_iter()
            .next()
            .ok_or(IndexError::Embed(EmbedError::EmptyResponse {
                provider: "embedder",
            }))?;

        let limit = u64::try_from(k).unwrap_or(u64::MAX);
        let points = self
            .store
            .search(&self.collection, vector, limit, Some(scope.filter()))
            .await?;
        let results: Vec<SearchResult> = points.into_iter().filter_map(point_to_result).collect();

        if let Ok(json) = serde_json::to_string(&results) {
            self.cache.set(&cache_key, json, self.search_ttl).await;
        }
        Ok(results)
    }

    /// Number of indexed chunks within `scope`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store count fails.
    pub async fn count(&self, scope: SearchScope) -> Result<u64, IndexError> {
        let count = self
            .store
            .count(&self.collection, Some(scope.filter()))
            .await?;
        Ok(count)
    }

    /// Remove every chunk owned by `document_id` atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the store delete fails; no partial delete is
    /// applied.
    pub async fn delete(
        &self,
        document_id: DocumentId,
        collection_id: CollectionId,
    ) -> Result<(), IndexError> {
        self.store
            .delete_by_filter(&self.collection, SearchScope::Document(document_id).filter())
            .await?;

        tracing::info!(document = %document_id, "deleted document chunks");
        self.invalidate(document_id, collection_id).await;
        Ok(())
    }

    /// Drop cached search results scoped to `collection_id` and notify
    /// downstream consumers. Fire-and-forget: nobody listening is fine.
    pub async fn invalidate_collection(&self, collection_id: CollectionId) {
        self.cache
            .remove_prefix(&SearchScope::Collection(collection_id).cache_prefix())
            .await;
        if self.invalidation_tx.send(collection_id).is_err() {
            tracing::debug!(collection = %collection_id, "no invalidation subscribers");
        }
    }

    async fn invalidate(&self, document_id: DocumentId, collection_id: CollectionId) {
        self.cache
            .remove_prefix(&SearchScope::Document(document_id).cache_prefix())
            .await;
        self.invalidate_collection(collection_id).await;
    }
}

fn point_to_result(point: ScoredVectorPoint) -> Option<SearchResult> {
    let payload = point.payload;
    Some(SearchResult {
        content: payload.get("content")?.as_str()?.to_owned(),
        metadata: ResultMetadata {
            document_id: DocumentId(payload.get("document_id")?.as_i64()?),
            collection_id: CollectionId(payload.get("collection_id")?.as_i64()?),
            doc_name: payload.get("doc_name")?.as_str()?.to_owned(),
            display_name: payload.get("display_name")?.as_str()?.to_owned(),
            chunk_index: usize::try_from(payload.get("chunk_index")?.as_i64()?).ok()?,
            total_chunks: usize::try_from(payload.get("total_chunks")?.as_i64()?).ok()?,
            page_number: payload
                .get("page_number")
                .and_then(serde_json::Value::as_u64)
                .and_then(|v| u32::try_from(v).ok()),
        },
        score: point.score,
    })
}
