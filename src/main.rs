use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use passim_chunk::ChunkConfig;
use passim_core::{CollectionId, DocumentId, PassimConfig};
use passim_index::{RelevancePolicy, SearchScope};
use passim_ingest::{
    DocumentRef, FileResolver, IngestPipeline, IngestScheduler, PlainTextParser, PreviewSummarizer,
};

mod init;

#[derive(Parser)]
#[command(name = "passim", about = "Document ingestion and passage retrieval", version)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "passim.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a local document into a collection.
    Ingest {
        path: PathBuf,
        #[arg(long)]
        document_id: i64,
        #[arg(long)]
        collection_id: i64,
        #[arg(long)]
        subject: Option<String>,
        /// Display name; defaults to the file name.
        #[arg(long)]
        name: Option<String>,
    },
    /// Search a collection or a single document for relevant passages.
    Search {
        query: String,
        #[arg(long, conflicts_with = "document_id")]
        collection_id: Option<i64>,
        #[arg(long)]
        document_id: Option<i64>,
        #[arg(long)]
        subject: Option<String>,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Count indexed chunks in a scope.
    Count {
        #[arg(long, conflicts_with = "document_id")]
        collection_id: Option<i64>,
        #[arg(long)]
        document_id: Option<i64>,
    },
    /// Delete every indexed chunk of a document.
    Delete {
        #[arg(long)]
        document_id: i64,
        #[arg(long)]
        collection_id: i64,
    },
}

fn scope_from(collection_id: Option<i64>, document_id: Option<i64>) -> anyhow::Result<SearchScope> {
    match (document_id, collection_id) {
        (Some(id), None) => Ok(SearchScope::Document(DocumentId(id))),
        (None, Some(id)) => Ok(SearchScope::Collection(CollectionId(id))),
        _ => bail!("pass exactly one of --document-id or --collection-id"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init::init_tracing();

    let cli = Cli::parse();
    let config = PassimConfig::load(&cli.config)?;
    let (index, summaries) = init::build_components(&config).await?;

    match cli.command {
        Command::Ingest {
            path,
            document_id,
            collection_id,
            subject,
            name,
        } => {
            let doc_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .context("path has no usable file name")?
                .to_owned();
            let display_name = name.unwrap_or_else(|| doc_name.clone());

            let scheduler = IngestScheduler::new(IngestPipeline {
                resolver: Arc::new(FileResolver),
                parser: Arc::new(PlainTextParser),
                summarizer: Arc::new(PreviewSummarizer::default()),
                index: index.clone(),
                summaries,
                chunking: ChunkConfig {
                    chunk_size: config.chunking.chunk_size,
                    overlap: config.chunking.overlap,
                },
            });
            scheduler.start();

            let job_id = scheduler.submit(DocumentRef {
                document_id: DocumentId(document_id),
                collection_id: CollectionId(collection_id),
                location: path.display().to_string(),
                doc_name,
                display_name,
                subject,
            })?;
            println!("submitted job {job_id}");

            let mut last_progress = 0;
            let job = loop {
                let job = scheduler.status(job_id)?;
                if job.progress > last_progress {
                    println!("[{:>3}%] {}", job.progress, job.message);
                    last_progress = job.progress;
                }
                if job.status.is_terminal() {
                    break job;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            };
            scheduler.stop().await;

            match job.error_message {
                None => println!("{}: {}", job.status, job.message),
                Some(error) => bail!("ingestion failed: {error}"),
            }
        }
        Command::Search {
            query,
            collection_id,
            document_id,
            subject,
            top_k,
        } => {
            let scope = scope_from(collection_id, document_id)?;
            let k = top_k.unwrap_or(config.index.top_k);
            let results = index
                .search(&query, scope, k, subject.as_deref(), None)
                .await?;
            let policy = RelevancePolicy::from(config.index.relevance);
            let relevant = policy.apply(&results, k);

            if relevant.is_empty() {
                println!("no relevant passages (candidates seen: {})", results.len());
            }
            for (rank, result) in relevant.iter().enumerate() {
                let page = result
                    .metadata
                    .page_number
                    .map_or(String::new(), |p| format!(", page {p}"));
                println!(
                    "{}. [{:.3}] {} (chunk {}/{}{page})",
                    rank + 1,
                    result.score,
                    result.metadata.display_name,
                    result.metadata.chunk_index + 1,
                    result.metadata.total_chunks,
                );
                println!("   {}", result.content);
            }
        }
        Command::Count {
            collection_id,
            document_id,
        } => {
            let scope = scope_from(collection_id, document_id)?;
            println!("{}", index.count(scope).await?);
        }
        Command::Delete {
            document_id,
            collection_id,
        } => {
            index
                .delete(DocumentId(document_id), CollectionId(collection_id))
                .await?;
            println!("deleted chunks for document {document_id}");
        }
    }

    Ok(())
}
