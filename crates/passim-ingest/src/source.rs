use crate::boundary::{BoxFuture, SourceResolver};
use crate::error::IngestError;
use crate::job::DocumentRef;

/// Resolves document references against the local filesystem, treating
/// `location` as a path.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileResolver;

impl SourceResolver for FileResolver {
    fn fetch(&self, reference: &DocumentRef) -> BoxFuture<'_, Result<Vec<u8>, IngestError>> {
        let location = reference.location.clone();
        Box::pin(async move {
            tokio::fs::read(&location)
                .await
                .map_err(|e| IngestError::Source(format!("{location}: {e}")))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use passim_core::{CollectionId, DocumentId};

    use super::*;

    fn reference(location: &str) -> DocumentRef {
        DocumentRef {
            document_id: DocumentId(1),
            collection_id: CollectionId(1),
            location: location.into(),
            doc_name: "doc.txt".into(),
            display_name: "Doc".into(),
            subject: None,
        }
    }

    #[tokio::test]
    async fn reads_existing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "file body").unwrap();

        let bytes = FileResolver
            .fetch(&reference(file.path().to_str().unwrap()))
            .await
            .unwrap();
        assert_eq!(bytes, b"file body");
    }

    #[tokio::test]
    async fn missing_file_is_source_unavailable() {
        let err = FileResolver
            .fetch(&reference("/nonexistent/never/here.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Source(_)));
    }
}
