#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("vector store error: {0}")]
    Store(#[from] crate::vector_store::VectorStoreError),

    #[error("embedding failed: {0}")]
    Embed(#[from] passim_embed::EmbedError),

    #[error("database error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
