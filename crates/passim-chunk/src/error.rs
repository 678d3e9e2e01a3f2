#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("overlap {overlap} must be smaller than chunk size {chunk_size}")]
    OverlapExceedsChunkSize { chunk_size: usize, overlap: usize },
}
