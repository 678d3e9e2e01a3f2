//! End-to-end pipeline test: local file → parse → chunk → embed → index →
//! scoped search with the relevance policy applied.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use passim_chunk::ChunkConfig;
use passim_core::{CollectionId, DocumentId, InMemoryCache, JobId};
use passim_embed::MockEmbedder;
use passim_index::{
    InMemoryVectorStore, RelevancePolicy, SearchScope, SimilarityIndex, SummaryStore,
};
use passim_ingest::{
    DocumentRef, FileResolver, IngestPipeline, IngestScheduler, JobStatus, PlainTextParser,
    PreviewSummarizer,
};

const PAGE_ONE: &str = "Photosynthesis converts light energy into chemical energy. \
     Chlorophyll pigments absorb mostly red and blue wavelengths of light.";
const PAGE_TWO: &str = "Cellular respiration in mitochondria breaks down glucose \
     molecules and releases adenosine triphosphate for the cell.";

async fn build() -> (IngestScheduler, Arc<SimilarityIndex>, Arc<SummaryStore>) {
    let index = Arc::new(SimilarityIndex::new(
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(MockEmbedder::default()),
        Arc::new(InMemoryCache::new()),
        "e2e_chunks",
        Duration::from_secs(60),
    ));
    index.ensure_ready().await.unwrap();
    let summaries = Arc::new(SummaryStore::connect(":memory:").await.unwrap());

    let scheduler = IngestScheduler::new(IngestPipeline {
        resolver: Arc::new(FileResolver),
        parser: Arc::new(PlainTextParser),
        summarizer: Arc::new(PreviewSummarizer::default()),
        index: index.clone(),
        summaries: summaries.clone(),
        chunking: ChunkConfig {
            chunk_size: 120,
            overlap: 30,
        },
    });
    (scheduler, index, summaries)
}

async fn wait_terminal(scheduler: &IngestScheduler, job_id: JobId) -> passim_ingest::IngestJob {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let job = scheduler.status(job_id).unwrap();
            if job.status.is_terminal() {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("job should finish")
}

#[tokio::test]
async fn file_to_search_roundtrip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{PAGE_ONE}\u{c}{PAGE_TWO}").unwrap();

    let (scheduler, index, summaries) = build().await;
    scheduler.start();

    let job_id = scheduler
        .submit(DocumentRef {
            document_id: DocumentId(7),
            collection_id: CollectionId(3),
            location: file.path().display().to_string(),
            doc_name: "cell_energy_overview.txt".into(),
            display_name: "Cell Energy Overview".into(),
            subject: Some("Biology".into()),
        })
        .unwrap();

    let job = wait_terminal(&scheduler, job_id).await;
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100);

    // Chunks landed in the index, attributed to their source pages.
    let indexed = index
        .count(SearchScope::Document(DocumentId(7)))
        .await
        .unwrap();
    assert!(indexed >= 2);

    let results = index
        .search(
            "how do chlorophyll pigments absorb light",
            SearchScope::Collection(CollectionId(3)),
            5,
            Some("Biology"),
            None,
        )
        .await
        .unwrap();

    let relevant = RelevancePolicy::default().apply(&results, 5);
    assert!(!relevant.is_empty());
    assert!(relevant[0].content.contains("Chlorophyll"));
    assert!(relevant[0].score > 0.4);
    assert_eq!(relevant[0].metadata.page_number, Some(1));

    // Passages from the second page keep their own attribution.
    let respiration = index
        .search(
            "mitochondria glucose respiration",
            SearchScope::Collection(CollectionId(3)),
            5,
            None,
            None,
        )
        .await
        .unwrap();
    assert_eq!(respiration[0].metadata.page_number, Some(2));

    // The document summary was persisted alongside the chunks.
    let summary = summaries.get(DocumentId(7)).await.unwrap().unwrap();
    assert!(summary.contains("cell_energy_overview.txt"));

    scheduler.stop().await;
}

#[tokio::test]
async fn delete_removes_document_from_retrieval() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{PAGE_ONE}").unwrap();

    let (scheduler, index, _) = build().await;
    scheduler.start();

    let job_id = scheduler
        .submit(DocumentRef {
            document_id: DocumentId(7),
            collection_id: CollectionId(3),
            location: file.path().display().to_string(),
            doc_name: "notes.txt".into(),
            display_name: "Notes".into(),
            subject: None,
        })
        .unwrap();
    wait_terminal(&scheduler, job_id).await;

    index.delete(DocumentId(7), CollectionId(3)).await.unwrap();

    assert_eq!(
        index
            .count(SearchScope::Document(DocumentId(7)))
            .await
            .unwrap(),
        0
    );
    let results = index
        .search(
            "chlorophyll light",
            SearchScope::Collection(CollectionId(3)),
            5,
            None,
            None,
        )
        .await
        .unwrap();
    assert!(results.is_empty());

    scheduler.stop().await;
}
