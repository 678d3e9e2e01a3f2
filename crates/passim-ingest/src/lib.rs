//! Drives documents from raw source to fully indexed passages.
//!
//! Submissions enqueue immediately and never block on processing; a single
//! background consumer drains the queue in FIFO order, walking each job
//! through fetch → summarize → chunk → embed → persist → invalidate with
//! per-stage progress. A failing job is recorded and the consumer moves on
//! to the next one.

mod boundary;
mod error;
mod job;
mod parser;
mod scheduler;
mod source;
mod summarizer;

pub use boundary::{DocumentParser, SourceResolver};
pub use error::IngestError;
pub use job::{DocumentRef, IngestJob, JobStatus};
pub use parser::PlainTextParser;
pub use scheduler::{IngestPipeline, IngestScheduler};
pub use source::FileResolver;
pub use summarizer::{PreviewSummarizer, Summarizer};
