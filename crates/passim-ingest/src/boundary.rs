//! External collaborator boundaries consumed by the ingestion pipeline.

use std::future::Future;
use std::pin::Pin;

use passim_chunk::ParsedContent;

use crate::error::IngestError;
use crate::job::DocumentRef;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Resolves a document reference to its raw bytes.
pub trait SourceResolver: Send + Sync {
    /// # Errors
    ///
    /// Returns [`IngestError::Source`] when the reference cannot be
    /// resolved to retrievable bytes.
    fn fetch(&self, reference: &DocumentRef) -> BoxFuture<'_, Result<Vec<u8>, IngestError>>;
}

/// Extracts text and page layout from raw document bytes.
pub trait DocumentParser: Send + Sync {
    /// # Errors
    ///
    /// Returns [`IngestError::Parse`] when the bytes cannot be parsed.
    fn parse(&self, bytes: &[u8]) -> BoxFuture<'_, Result<ParsedContent, IngestError>>;
}
