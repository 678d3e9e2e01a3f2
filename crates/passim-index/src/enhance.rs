//! Contextual tagging applied before embedding.
//!
//! Chunks and queries get the same `Subject:`/`Topic:`/`Content:` prefix
//! lines, so both sides of a similarity comparison are embedded in the same
//! semantic space. Both functions are deterministic and side-effect-free.

/// Derive a topic from a document name, e.g.
/// `"Chapter_5_Photosynthesis.pdf"` → `"Chapter 5 Photosynthesis"`.
#[must_use]
pub fn derive_topic(doc_name: &str) -> Option<String> {
    let stem = doc_name.rsplit_once('.').map_or(doc_name, |(stem, _)| stem);
    let topic = stem.replace(['_', '-'], " ").trim().to_owned();
    (!topic.is_empty()).then_some(topic)
}

/// Prefix a chunk with its contextual tags for indexing.
#[must_use]
pub fn enhance_chunk(
    text: &str,
    subject: Option<&str>,
    topic: Option<&str>,
    page: Option<u32>,
) -> String {
    let mut parts = Vec::new();
    if let Some(subject) = subject {
        parts.push(format!("Subject: {subject}"));
    }
    if let Some(topic) = topic {
        parts.push(format!("Topic: {topic}"));
    }
    if let Some(page) = page {
        parts.push(format!("Page: {page}"));
    }
    parts.push(format!("Content: {text}"));
    parts.join("\n")
}

/// Prefix a query with the same tags used when chunks were indexed.
#[must_use]
pub fn enhance_query(query: &str, subject: Option<&str>, topic: Option<&str>) -> String {
    let mut parts = Vec::new();
    if let Some(subject) = subject {
        parts.push(format!("Subject: {subject}"));
    }
    if let Some(topic) = topic {
        parts.push(format!("Topic: {topic}"));
    }
    parts.push(format!("Content: {query}"));
    parts.join("\n")
}
