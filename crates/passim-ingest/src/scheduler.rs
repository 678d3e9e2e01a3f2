use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use passim_chunk::{ChunkConfig, chunk};
use passim_core::{DocumentId, JobId};
use passim_index::{DocumentMeta, SimilarityIndex, SummaryStore};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::boundary::{DocumentParser, SourceResolver};
use crate::error::IngestError;
use crate::job::{DocumentRef, IngestJob, JobStatus};
use crate::summarizer::Summarizer;

/// Content longer than this is truncated before summarization.
const MAX_SUMMARY_INPUT: usize = 12_000;

type JobTable = Arc<RwLock<HashMap<JobId, IngestJob>>>;

/// Collaborators wired into the per-job pipeline.
pub struct IngestPipeline {
    pub resolver: Arc<dyn SourceResolver>,
    pub parser: Arc<dyn DocumentParser>,
    pub summarizer: Arc<dyn Summarizer>,
    pub index: Arc<SimilarityIndex>,
    pub summaries: Arc<SummaryStore>,
    pub chunking: ChunkConfig,
}

/// Asynchronous ingestion scheduler.
///
/// `submit` validates and enqueues, returning immediately; exactly one
/// background consumer drains the queue in submission order, so producers
/// never block on processing. The job table is written only by the consumer
/// and snapshot-read by any number of concurrent callers.
pub struct IngestScheduler {
    jobs: JobTable,
    queue_tx: mpsc::UnboundedSender<JobId>,
    queue_rx: Mutex<Option<mpsc::UnboundedReceiver<JobId>>>,
    shutdown_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    pipeline: Arc<IngestPipeline>,
}

impl std::fmt::Debug for IngestScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestScheduler")
            .field("jobs", &self.jobs.read().map(|j| j.len()).unwrap_or(0))
            .finish_non_exhaustive()
    }
}

impl IngestScheduler {
    #[must_use]
    pub fn new(pipeline: IngestPipeline) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            queue_tx,
            queue_rx: Mutex::new(Some(queue_rx)),
            shutdown_tx,
            handle: Mutex::new(None),
            pipeline: Arc::new(pipeline),
        }
    }

    /// Spawn the background consumer. Idempotent: later calls are no-ops.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let Ok(mut rx_slot) = self.queue_rx.lock() else {
            return;
        };
        let Some(queue_rx) = rx_slot.take() else {
            return;
        };

        let consumer = Consumer {
            jobs: self.jobs.clone(),
            pipeline: self.pipeline.clone(),
            shutdown_rx: self.shutdown_tx.subscribe(),
        };
        let handle = tokio::spawn(consumer.run(queue_rx));
        if let Ok(mut slot) = self.handle.lock() {
            *slot = Some(handle);
        }
        tracing::info!("ingestion scheduler started");
    }

    /// Signal the consumer to stop and wait for it to finish its current
    /// job. Queued jobs that have not started remain `Queued`.
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
        let handle = self.handle.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle
            && handle.await.is_err()
        {
            tracing::warn!("ingest consumer task panicked during shutdown");
        }
        tracing::info!("ingestion scheduler stopped");
    }

    /// Validate a document reference and enqueue it for ingestion.
    ///
    /// Returns as soon as the job is queued. The same document may be
    /// submitted more than once; each submission is an independent job.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::InvalidReference`] when the reference lacks a
    /// retrievable location or a name, and [`IngestError::Stopped`] after
    /// the scheduler has shut down.
    pub fn submit(&self, reference: DocumentRef) -> Result<JobId, IngestError> {
        if reference.location.trim().is_empty() {
            return Err(IngestError::InvalidReference(format!(
                "document {} has no retrievable source",
                reference.document_id
            )));
        }
        if reference.doc_name.trim().is_empty() {
            return Err(IngestError::InvalidReference(format!(
                "document {} has no name",
                reference.document_id
            )));
        }

        let job_id = JobId::new();
        let job = IngestJob::queued(job_id, reference);
        if let Ok(mut jobs) = self.jobs.write() {
            jobs.insert(job_id, job);
        }

        if self.queue_tx.send(job_id).is_err() {
            if let Ok(mut jobs) = self.jobs.write() {
                jobs.remove(&job_id);
            }
            return Err(IngestError::Stopped);
        }

        tracing::info!(job = %job_id, "document ingestion queued");
        Ok(job_id)
    }

    /// Snapshot of one job.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::JobNotFound`] for an unknown id.
    pub fn status(&self, job_id: JobId) -> Result<IngestJob, IngestError> {
        self.jobs
            .read()
            .ok()
            .and_then(|jobs| jobs.get(&job_id).cloned())
            .ok_or(IngestError::JobNotFound(job_id))
    }

    /// Snapshot of all known jobs, optionally filtered by document, oldest
    /// first.
    #[must_use]
    pub fn list(&self, document: Option<DocumentId>) -> Vec<IngestJob> {
        let mut jobs: Vec<IngestJob> = self
            .jobs
            .read()
            .map(|jobs| {
                jobs.values()
                    .filter(|job| {
                        document.is_none_or(|id| job.document_ref.document_id == id)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        jobs.sort_by_key(|job| job.created_at);
        jobs
    }
}

struct Consumer {
    jobs: JobTable,
    pipeline: Arc<IngestPipeline>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Consumer {
    async fn run(mut self, mut queue_rx: mpsc::UnboundedReceiver<JobId>) {
        loop {
            tokio::select! {
                job = queue_rx.recv() => {
                    match job {
                        Some(job_id) => self.process(job_id).await,
                        None => break,
                    }
                }
                changed = self.shutdown_rx.changed() => {
                    // A dropped sender also means shutdown.
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        tracing::info!("ingest consumer shutting down");
                        break;
                    }
                }
            }
        }
    }

    async fn process(&self, job_id: JobId) {
        let Some(reference) = self
            .jobs
            .read()
            .ok()
            .and_then(|jobs| jobs.get(&job_id).map(|j| j.document_ref.clone()))
        else {
            tracing::warn!(job = %job_id, "queued job missing from table, skipping");
            return;
        };

        self.mark_started(job_id);
        tracing::info!(
            job = %job_id,
            document = %reference.document_id,
            doc_name = %reference.doc_name,
            "processing document"
        );

        match self.run_stages(job_id, &reference).await {
            Ok(chunk_count) => {
                self.mark_completed(job_id, chunk_count);
                tracing::info!(job = %job_id, chunks = chunk_count, "document processed");
            }
            Err(e) => {
                tracing::error!(job = %job_id, document = %reference.document_id, "ingestion failed: {e}");
                self.mark_failed(job_id, &e.to_string());
            }
        }
    }

    async fn run_stages(
        &self,
        job_id: JobId,
        reference: &DocumentRef,
    ) -> Result<usize, IngestError> {
        self.update_progress(job_id, 15, "fetching and parsing source");
        let bytes = self.pipeline.resolver.fetch(reference).await?;
        let parsed = self.pipeline.parser.parse(&bytes).await?;

        self.update_progress(job_id, 30, "generating document summary");
        let summary_input: String = parsed.text.chars().take(MAX_SUMMARY_INPUT).collect();
        let summary = self
            .pipeline
            .summarizer
            .summarize(&summary_input, &reference.doc_name, &reference.display_name)
            .await?;

        self.update_progress(job_id, 45, "chunking document content");
        let page_map = (!parsed.page_map.is_empty()).then_some(parsed.page_map.as_slice());
        let chunks = chunk(&parsed.text, &self.pipeline.chunking, page_map)?;

        self.update_progress(job_id, 60, "preparing chunk metadata");
        let meta = DocumentMeta {
            document_id: reference.document_id,
            collection_id: reference.collection_id,
            doc_name: reference.doc_name.clone(),
            display_name: reference.display_name.clone(),
            subject: reference.subject.clone(),
        };

        self.update_progress(job_id, 75, "storing chunks in vector index");
        self.pipeline.index.add(&chunks, &meta).await?;

        self.update_progress(job_id, 90, "storing document summary");
        self.pipeline
            .summaries
            .store(
                reference.document_id,
                reference.collection_id,
                &reference.doc_name,
                &reference.display_name,
                &summary,
            )
            .await?;

        self.update_progress(job_id, 95, "invalidating downstream caches");
        self.pipeline
            .index
            .invalidate_collection(reference.collection_id)
            .await;

        Ok(chunks.len())
    }

    fn mark_started(&self, job_id: JobId) {
        if let Ok(mut jobs) = self.jobs.write()
            && let Some(job) = jobs.get_mut(&job_id)
        {
            job.status = JobStatus::Processing;
            job.started_at = Some(Utc::now());
            job.progress = 5;
            job.message = "starting document processing".into();
        }
    }

    fn update_progress(&self, job_id: JobId, progress: u8, message: &str) {
        if let Ok(mut jobs) = self.jobs.write()
            && let Some(job) = jobs.get_mut(&job_id)
            && !job.status.is_terminal()
        {
            job.progress = job.progress.max(progress);
            job.message = message.into();
            tracing::debug!(job = %job_id, progress, "{message}");
        }
    }

    fn mark_completed(&self, job_id: JobId, chunk_count: usize) {
        if let Ok(mut jobs) = self.jobs.write()
            && let Some(job) = jobs.get_mut(&job_id)
        {
            job.status = JobStatus::Completed;
            job.progress = 100;
            job.message = format!("successfully processed {chunk_count} chunks");
            job.completed_at = Some(Utc::now());
        }
    }

    fn mark_failed(&self, job_id: JobId, error: &str) {
        if let Ok(mut jobs) = self.jobs.write()
            && let Some(job) = jobs.get_mut(&job_id)
        {
            job.status = JobStatus::Failed;
            job.message = format!("processing failed: {error}");
            job.error_message = Some(error.to_owned());
            job.completed_at = Some(Utc::now());
        }
    }
}
