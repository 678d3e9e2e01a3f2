use crate::error::ChunkError;
use crate::types::{Chunk, PageSpan};

/// How far back from the window end to look for a sentence boundary.
const SENTENCE_LOOKBACK: usize = 100;

#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

/// Split `text` into ordered overlapping passages.
///
/// Texts no longer than `chunk_size` yield a single passage. Longer texts
/// are windowed; a window that would cut mid-sentence is shortened to the
/// last sentence-terminal char in its trailing 100 chars when one exists.
/// Passages are trimmed and empty ones dropped. Each
/// passage carries the page whose span contains its start offset, falling
/// back to the map's last page when the offset lies beyond every span.
///
/// # Errors
///
/// Returns [`ChunkError::OverlapExceedsChunkSize`] when
/// `overlap >= chunk_size`, which would prevent the window from advancing.
pub fn chunk(
    text: &str,
    config: &ChunkConfig,
    page_map: Option<&[PageSpan]>,
) -> Result<Vec<Chunk>, ChunkError> {
    if config.overlap >= config.chunk_size {
        return Err(ChunkError::OverlapExceedsChunkSize {
            chunk_size: config.chunk_size,
            overlap: config.overlap,
        });
    }

    if text.is_empty() {
        return Ok(Vec::new());
    }

    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let mut pieces: Vec<(usize, String)> = Vec::new();

    if len <= config.chunk_size {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            pieces.push((0, trimmed.to_owned()));
        }
    } else {
        let mut start = 0;
        while start < len {
            let mut end = (start + config.chunk_size).min(len);

            if end < len
                && let Some(cut) = sentence_cut(&chars, start, end, config.chunk_size)
            {
                end = cut;
            }

            let piece: String = chars[start..end].iter().collect();
            let trimmed = piece.trim();
            if !trimmed.is_empty() {
                pieces.push((start, trimmed.to_owned()));
            }

            // Guarantee forward progress even when the sentence cut lands
            // inside the overlap region.
            let next = end.saturating_sub(config.overlap);
            start = if next > start { next } else { end };
        }
    }

    let total = pieces.len();
    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(index, (offset, text))| Chunk {
            text,
            index,
            total,
            page: page_map.and_then(|map| page_for_offset(map, offset)),
        })
        .collect())
}

/// Find the last sentence-terminal char in the window's trailing lookback
/// region, returning the cut position just past it.
fn sentence_cut(chars: &[char], start: usize, end: usize, chunk_size: usize) -> Option<usize> {
    let threshold = (start + chunk_size).saturating_sub(SENTENCE_LOOKBACK);
    let pos = chars[start..end]
        .iter()
        .rposition(|c| matches!(c, '.' | '!' | '?'))
        .map(|rel| start + rel)?;
    (pos > threshold).then_some(pos + 1)
}

/// Page containing `offset`, or the map's last page when `offset` lies
/// beyond every span.
fn page_for_offset(map: &[PageSpan], offset: usize) -> Option<u32> {
    if map.is_empty() {
        return None;
    }
    let idx = map.partition_point(|span| span.start <= offset);
    if idx > 0 {
        let span = &map[idx - 1];
        if offset < span.end {
            return Some(span.page);
        }
    }
    map.last().map(|span| span.page)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(chunk_size: usize, overlap: usize) -> ChunkConfig {
        ChunkConfig {
            chunk_size,
            overlap,
        }
    }

    #[test]
    fn empty_text_yields_nothing() {
        let chunks = chunk("", &ChunkConfig::default(), None).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn short_text_yields_single_trimmed_chunk() {
        let chunks = chunk("  Hello world.  ", &ChunkConfig::default(), None).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello world.");
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].total, 1);
        assert_eq!(chunks[0].page, None);
    }

    #[test]
    fn overlap_equal_to_chunk_size_is_rejected() {
        let err = chunk("some text", &cfg(10, 10), None).unwrap_err();
        assert!(matches!(
            err,
            ChunkError::OverlapExceedsChunkSize {
                chunk_size: 10,
                overlap: 10
            }
        ));
    }

    #[test]
    fn overlap_greater_than_chunk_size_is_rejected() {
        assert!(chunk("some text", &cfg(10, 50), None).is_err());
    }

    #[test]
    fn long_text_produces_overlapping_windows() {
        let text = "a".repeat(2500);
        let chunks = chunk(&text, &cfg(1000, 200), None).unwrap();
        assert!(chunks.len() > 1);
        let total = chunks.len();
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i);
            assert_eq!(c.total, total);
        }
        // Windows advance by chunk_size - overlap, so consecutive chunks share text.
        assert_eq!(&chunks[0].text[800..1000], &chunks[1].text[..200]);
    }

    #[test]
    fn window_prefers_sentence_boundary() {
        // Period at offset 550 of a 1200-char text; with a 600-char window it
        // falls inside the 100-char lookback, so the first chunk ends there.
        let mut text = "b".repeat(550);
        text.push('.');
        text.push_str(&"c".repeat(649));
        assert_eq!(text.chars().count(), 1200);

        let chunks = chunk(&text, &cfg(600, 150), None).unwrap();
        assert_eq!(chunks[0].text.chars().count(), 551);
        assert!(chunks[0].text.ends_with('.'));
    }

    #[test]
    fn boundary_outside_lookback_is_ignored() {
        // Period at offset 100 is far before the lookback region; the window
        // cuts at the hard boundary instead.
        let mut text = "b".repeat(100);
        text.push('.');
        text.push_str(&"c".repeat(1099));

        let chunks = chunk(&text, &cfg(600, 150), None).unwrap();
        assert_eq!(chunks[0].text.chars().count(), 600);
    }

    #[test]
    fn question_and_exclamation_end_sentences() {
        let mut text = "b".repeat(549);
        text.push('?');
        text.push_str(&"c".repeat(650));

        let chunks = chunk(&text, &cfg(600, 150), None).unwrap();
        assert!(chunks[0].text.ends_with('?'));
    }

    #[test]
    fn page_attribution_uses_start_offset() {
        let map = vec![
            PageSpan {
                start: 0,
                end: 600,
                page: 1,
            },
            PageSpan {
                start: 600,
                end: 1300,
                page: 2,
            },
        ];
        let text = "d".repeat(1300);
        let chunks = chunk(&text, &cfg(500, 100), Some(&map)).unwrap();

        assert_eq!(chunks[0].page, Some(1)); // starts at 0
        assert_eq!(chunks[1].page, Some(1)); // starts at 400
        assert_eq!(chunks[2].page, Some(2)); // starts at 800
    }

    #[test]
    fn offset_beyond_spans_falls_back_to_last_page() {
        let map = vec![PageSpan {
            start: 0,
            end: 10,
            page: 3,
        }];
        assert_eq!(page_for_offset(&map, 999), Some(3));
    }

    #[test]
    fn short_text_gets_first_page() {
        let map = vec![
            PageSpan {
                start: 0,
                end: 50,
                page: 1,
            },
            PageSpan {
                start: 50,
                end: 80,
                page: 2,
            },
        ];
        let chunks = chunk("tiny text", &ChunkConfig::default(), Some(&map)).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].page, Some(1));
    }

    #[test]
    fn whitespace_only_text_yields_nothing() {
        let chunks = chunk("   \n\t  ", &ChunkConfig::default(), None).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn multibyte_text_is_not_byte_sliced() {
        let text = "é".repeat(1500);
        let chunks = chunk(&text, &cfg(1000, 200), None).unwrap();
        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].text.chars().count(), 1000);
    }

    mod proptest_chunker {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(500))]

            #[test]
            fn never_panics_and_always_terminates(
                text in "\\PC{0,3000}",
                chunk_size in 1usize..1500,
                overlap in 0usize..500,
            ) {
                let config = ChunkConfig { chunk_size, overlap };
                let _ = chunk(&text, &config, None);
            }

            #[test]
            fn indices_sequential_and_total_consistent(
                text in "[a-z. ]{0,2000}",
                chunk_size in 10usize..400,
            ) {
                let config = ChunkConfig { chunk_size, overlap: chunk_size / 4 };
                let chunks = chunk(&text, &config, None).unwrap();
                let total = chunks.len();
                for (i, c) in chunks.iter().enumerate() {
                    prop_assert_eq!(c.index, i);
                    prop_assert_eq!(c.total, total);
                }
            }

            #[test]
            fn no_empty_chunks(
                text in "[a-z.!? \\n]{0,2000}",
                chunk_size in 5usize..300,
            ) {
                let config = ChunkConfig { chunk_size, overlap: 0 };
                let chunks = chunk(&text, &config, None).unwrap();
                for c in &chunks {
                    prop_assert!(!c.text.is_empty());
                }
            }

            #[test]
            fn short_input_single_chunk(
                text in "[a-z]{1,50}",
            ) {
                let chunks = chunk(&text, &ChunkConfig::default(), None).unwrap();
                prop_assert_eq!(chunks.len(), 1);
                prop_assert_eq!(&chunks[0].text, &text);
            }
        }
    }
}
