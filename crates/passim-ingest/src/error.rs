use passim_core::JobId;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("invalid document reference: {0}")]
    InvalidReference(String),

    #[error("source unavailable: {0}")]
    Source(String),

    #[error("parse failure: {0}")]
    Parse(String),

    #[error("summary generation failed: {0}")]
    Summary(String),

    #[error("chunking failed: {0}")]
    Chunk(#[from] passim_chunk::ChunkError),

    #[error("index error: {0}")]
    Index(#[from] passim_index::IndexError),

    #[error("job {0} not found")]
    JobNotFound(JobId),

    #[error("ingestion scheduler is stopped")]
    Stopped,
}
