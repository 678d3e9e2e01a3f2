use crate::boundary::BoxFuture;
use crate::error::IngestError;

/// Generates a per-document summary for later retrieval context.
///
/// The pipeline truncates very long content before calling this, so
/// implementations backed by a remote model stay within input limits.
pub trait Summarizer: Send + Sync {
    /// # Errors
    ///
    /// Returns [`IngestError::Summary`] when generation fails.
    fn summarize(
        &self,
        content: &str,
        doc_name: &str,
        display_name: &str,
    ) -> BoxFuture<'_, Result<String, IngestError>>;
}

/// Deterministic summarizer that previews the document's opening content.
///
/// Serves as the offline stand-in for a model-backed summarizer.
#[derive(Debug, Clone, Copy)]
pub struct PreviewSummarizer {
    preview_chars: usize,
}

impl PreviewSummarizer {
    #[must_use]
    pub fn new(preview_chars: usize) -> Self {
        Self { preview_chars }
    }
}

impl Default for PreviewSummarizer {
    fn default() -> Self {
        Self::new(500)
    }
}

impl Summarizer for PreviewSummarizer {
    fn summarize(
        &self,
        content: &str,
        doc_name: &str,
        display_name: &str,
    ) -> BoxFuture<'_, Result<String, IngestError>> {
        let preview: String = content.chars().take(self.preview_chars).collect();
        let truncated = content.chars().count() > self.preview_chars;
        let doc_name = doc_name.to_owned();
        let display_name = display_name.to_owned();
        Box::pin(async move {
            let ellipsis = if truncated { "..." } else { "" };
            Ok(format!(
                "Document: {doc_name} ({display_name}). Content preview: {preview}{ellipsis}"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn short_content_is_kept_whole() {
        let summary = PreviewSummarizer::default()
            .summarize("brief body", "notes.txt", "Notes")
            .await
            .unwrap();
        assert_eq!(
            summary,
            "Document: notes.txt (Notes). Content preview: brief body"
        );
    }

    #[tokio::test]
    async fn long_content_is_truncated_with_ellipsis() {
        let content = "x".repeat(600);
        let summary = PreviewSummarizer::default()
            .summarize(&content, "big.txt", "Big")
            .await
            .unwrap();
        assert!(summary.ends_with("..."));
        assert!(summary.chars().count() < 600);
    }

    #[tokio::test]
    async fn summarizer_is_deterministic() {
        let s = PreviewSummarizer::default();
        let a = s.summarize("same input", "d.txt", "D").await.unwrap();
        let b = s.summarize("same input", "d.txt", "D").await.unwrap();
        assert_eq!(a, b);
    }
}
