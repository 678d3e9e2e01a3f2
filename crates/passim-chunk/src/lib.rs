//! Splits document text into ordered, overlapping passages.
//!
//! Windows prefer to end on a sentence boundary when one falls near the end
//! of the window, and each passage carries the source page containing its
//! start offset when a page map is available. All offsets are char offsets;
//! document text is never byte-sliced.

mod chunker;
mod error;
mod types;

pub use chunker::{ChunkConfig, chunk};
pub use error::ChunkError;
pub use types::{Chunk, PageSpan, ParsedContent};
