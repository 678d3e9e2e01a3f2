use passim_chunk::{PageSpan, ParsedContent};

use crate::boundary::{BoxFuture, DocumentParser};
use crate::error::IngestError;

/// Parser for UTF-8 plain text.
///
/// Form feeds (`\x0c`) mark page breaks and produce a page map; text without
/// any yields an empty map. A break char belongs to the page it opens, so a
/// chunk starting on the break is attributed to the new page. Offsets are
/// char offsets into the returned text, which is passed through unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextParser;

fn page_map_from_form_feeds(text: &str) -> Vec<PageSpan> {
    if !text.contains('\u{c}') {
        return Vec::new();
    }

    let mut spans = Vec::new();
    let mut page: u32 = 1;
    let mut span_start = 0;

    for (offset, c) in text.chars().enumerate() {
        if c == '\u{c}' {
            if offset > span_start {
                spans.push(PageSpan {
                    start: span_start,
                    end: offset,
                    page,
                });
            }
            span_start = offset;
            page += 1;
        }
    }

    let len = text.chars().count();
    let tail_has_content = text.chars().skip(span_start).any(|c| c != '\u{c}');
    if span_start < len && tail_has_content {
        spans.push(PageSpan {
            start: span_start,
            end: len,
            page,
        });
    }
    spans
}

impl DocumentParser for PlainTextParser {
    fn parse(&self, bytes: &[u8]) -> BoxFuture<'_, Result<ParsedContent, IngestError>> {
        let bytes = bytes.to_vec();
        Box::pin(async move {
            let text = String::from_utf8(bytes)
                .map_err(|e| IngestError::Parse(format!("document is not valid UTF-8: {e}")))?;
            let page_map = page_map_from_form_feeds(&text);
            Ok(ParsedContent { text, page_map })
        })
    }
}
