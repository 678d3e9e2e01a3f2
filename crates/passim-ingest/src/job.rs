use chrono::{DateTime, Utc};
use passim_core::{CollectionId, DocumentId, JobId};

/// Reference to a source document awaiting ingestion.
///
/// `location` is opaque to the scheduler; only the configured
/// [`crate::SourceResolver`] interprets it.
#[derive(Debug, Clone)]
pub struct DocumentRef {
    pub document_id: DocumentId,
    pub collection_id: CollectionId,
    pub location: String,
    pub doc_name: String,
    pub display_name: String,
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Terminal states never revert.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one ingestion job.
///
/// Mutated only by the scheduler's consumer task; progress is monotonically
/// non-decreasing until a terminal state is reached.
#[derive(Debug, Clone)]
pub struct IngestJob {
    pub job_id: JobId,
    pub document_ref: DocumentRef,
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl IngestJob {
    #[must_use]
    pub fn queued(job_id: JobId, document_ref: DocumentRef) -> Self {
        Self {
            job_id,
            document_ref,
            status: JobStatus::Queued,
            progress: 0,
            message: "queued for processing".into(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }
}
