use crate::index::SearchResult;

/// Two-tier relevance cutoff applied on top of raw similarity scores.
///
/// Results at or above `primary` are always kept. When fewer than
/// `min_results` clear the primary tier, results at or above `secondary`
/// are merged in as well, up to the caller's `k`. The index itself always
/// returns raw-scored candidates; this policy is the documented convention
/// for callers that need a cutoff rather than a plain top-k.
#[derive(Debug, Clone, Copy)]
pub struct RelevancePolicy {
    pub primary: f32,
    pub secondary: f32,
    pub min_results: usize,
}

impl Default for RelevancePolicy {
    fn default() -> Self {
        Self {
            primary: 0.4,
            secondary: 0.3,
            min_results: 2,
        }
    }
}

impl From<passim_core::config::RelevanceConfig> for RelevancePolicy {
    fn from(config: passim_core::config::RelevanceConfig) -> Self {
        Self {
            primary: config.primary,
            secondary: config.secondary,
            min_results: config.min_results,
        }
    }
}

impl RelevancePolicy {
    /// Filter `results` (sorted by descending score) down to at most `k`
    /// relevant ones.
    #[must_use]
    pub fn apply(&self, results: &[SearchResult], k: usize) -> Vec<SearchResult> {
        let mut kept: Vec<SearchResult> = results
            .iter()
            .filter(|r| r.score >= self.primary)
            .cloned()
            .collect();

        if kept.len() < self.min_results {
            kept.extend(
                results
                    .iter()
                    .filter(|r| r.score >= self.secondary && r.score < self.primary)
                    .cloned(),
            );
            kept.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        kept.truncate(k);
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ResultMetadata;
    use passim_core::{CollectionId, DocumentId};

    fn result(content: &str, score: f32) -> SearchResult {
        SearchResult {
            content: content.into(),
            metadata: ResultMetadata {
                document_id: DocumentId(1),
                collection_id: CollectionId(1),
                doc_name: "doc.pdf".into(),
                display_name: "Doc".into(),
                chunk_index: 0,
                total_chunks: 1,
                page_number: None,
            },
            score,
        }
    }

    #[test]
    fn primary_tier_is_preferred() {
        let results = vec![
            result("a", 0.9),
            result("b", 0.5),
            result("c", 0.35),
            result("d", 0.1),
        ];
        let kept = RelevancePolicy::default().apply(&results, 5);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].content, "a");
        assert_eq!(kept[1].content, "b");
    }

    #[test]
    fn falls_back_to_secondary_tier_when_primary_is_thin() {
        // Nothing clears 0.4, two candidates clear 0.3: the fallback
        // returns exactly those two.
        let results = vec![
            result("a", 0.38),
            result("b", 0.31),
            result("c", 0.12),
        ];
        let kept = RelevancePolicy::default().apply(&results, 5);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].content, "a");
        assert_eq!(kept[1].content, "b");
    }

    #[test]
    fn fallback_merges_tiers_in_score_order() {
        let results = vec![
            result("a", 0.45),
            result("b", 0.36),
            result("c", 0.33),
        ];
        let kept = RelevancePolicy::default().apply(&results, 5);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].content, "a");
        assert_eq!(kept[1].content, "b");
        assert_eq!(kept[2].content, "c");
    }

    #[test]
    fn below_secondary_is_always_dropped() {
        let results = vec![result("a", 0.2), result("b", 0.05)];
        let kept = RelevancePolicy::default().apply(&results, 5);
        assert!(kept.is_empty());
    }

    #[test]
    fn k_caps_the_merged_set() {
        let results = vec![
            result("a", 0.39),
            result("b", 0.38),
            result("c", 0.37),
            result("d", 0.36),
        ];
        let kept = RelevancePolicy::default().apply(&results, 2);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].content, "a");
    }

    #[test]
    fn custom_thresholds_are_honored() {
        let policy = RelevancePolicy {
            primary: 0.8,
            secondary: 0.6,
            min_results: 1,
        };
        let results = vec![result("a", 0.7), result("b", 0.5)];
        let kept = policy.apply(&results, 5);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].content, "a");
    }
}
