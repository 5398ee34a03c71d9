//! Brute-force cosine similarity ranking
//!
//! Every record is scored against the query and the results are sorted.
//! No index is built. Corpora up to tens of thousands of vectors rank in
//! O(n·d + n log n), which is fast enough for a personal bookmark library.

use tracing::{debug, warn};

use bmchat_core::{EmbeddingRecord, Error, RankedResult, Result};

/// Default number of results returned per query
pub const DEFAULT_TOP_K: usize = 5;

/// What to do with a record whose vector length differs from the query's
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DimensionPolicy {
    /// Reject the whole call
    #[default]
    Strict,
    /// Leave the record out and count it
    Lenient,
}

/// Outcome of a ranking call
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    /// Top results, best first
    pub results: Vec<RankedResult>,
    /// Records left out because of a dimension mismatch (lenient mode only)
    pub skipped: usize,
}

/// Ranks embedded segments against a query vector
#[derive(Debug, Clone, Copy, Default)]
pub struct RetrievalEngine {
    policy: DimensionPolicy,
}

impl RetrievalEngine {
    /// Strict engine: any dimension mismatch fails the call
    pub fn new() -> Self {
        Self {
            policy: DimensionPolicy::Strict,
        }
    }

    /// Lenient engine: mismatched records are skipped and reported
    pub fn lenient() -> Self {
        Self {
            policy: DimensionPolicy::Lenient,
        }
    }

    pub fn with_policy(policy: DimensionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DimensionPolicy {
        self.policy
    }

    /// Return the `k` records most similar to `query`, best first.
    ///
    /// Ties keep the order in which `records` yields them.
    pub fn rank<'a, I>(&self, records: I, query: &[f32], k: usize) -> Result<Ranking>
    where
        I: IntoIterator<Item = &'a EmbeddingRecord>,
    {
        if query.is_empty() {
            return Err(Error::InvalidInput(
                "query vector must have at least one dimension".to_string(),
            ));
        }

        let mut candidates = Vec::new();
        let mut skipped = 0;

        for record in records {
            if record.vector.len() == query.len() {
                candidates.push(record);
                continue;
            }

            match self.policy {
                DimensionPolicy::Strict => {
                    return Err(Error::DimensionMismatch {
                        record: record.label(),
                        expected: query.len(),
                        actual: record.vector.len(),
                    });
                }
                DimensionPolicy::Lenient => {
                    warn!(
                        record = %record.label(),
                        expected = query.len(),
                        actual = record.vector.len(),
                        "skipping record with mismatched dimension"
                    );
                    skipped += 1;
                }
            }
        }

        if k == 0 || candidates.is_empty() {
            return Ok(Ranking {
                results: Vec::new(),
                skipped,
            });
        }

        let mut scored: Vec<(f32, &EmbeddingRecord)> = candidates
            .into_iter()
            .map(|record| (cosine_similarity(query, &record.vector), record))
            .collect();

        // `sort_by` is stable, so equal scores stay in corpus order.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(k);

        debug!(
            results = scored.len(),
            skipped,
            top_score = ?scored.first().map(|(score, _)| *score),
            "ranked corpus"
        );

        Ok(Ranking {
            results: scored
                .into_iter()
                .map(|(score, record)| RankedResult {
                    segment: record.segment.clone(),
                    score,
                })
                .collect(),
            skipped,
        })
    }
}

/// Cosine similarity of two equal-length vectors.
///
/// A zero-norm vector has no direction, so the pair scores negative
/// infinity and sorts after every real score. The same applies to any
/// non-finite result.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return f32::NEG_INFINITY;
    }

    let score = dot_product / (norm_a * norm_b);
    if score.is_finite() {
        score.clamp(-1.0, 1.0)
    } else {
        f32::NEG_INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmchat_core::Segment;

    fn record(url: &str, index: usize, vector: Vec<f32>) -> EmbeddingRecord {
        EmbeddingRecord::new(
            Segment {
                sequence_index: index,
                text: format!("{} chunk {}", url, index),
                token_count: 3,
                source_url: url.to_string(),
                source_title: url.to_uppercase(),
            },
            vector,
        )
    }

    fn keys(ranking: &Ranking) -> Vec<(String, usize)> {
        ranking
            .results
            .iter()
            .map(|r| (r.segment.source_url.clone(), r.segment.sequence_index))
            .collect()
    }

    #[test]
    fn test_self_similarity_is_one() {
        let v: Vec<f32> = vec![0.3, -1.2, 4.5, 0.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let a: Vec<f32> = vec![1.0, 2.0, 3.0];
        let b: Vec<f32> = vec![-2.0, 0.5, 1.0];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_orthogonal_and_opposite() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-3.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_scores_negative_infinity() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), f32::NEG_INFINITY);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 0.0]), f32::NEG_INFINITY);
    }

    #[test]
    fn test_top_k_ordering() {
        // Scores against [1, 0]: 0.9, 0.95, 0.2
        let corpus = vec![
            record("a", 0, vec![0.9, (1.0f32 - 0.81).sqrt()]),
            record("b", 0, vec![0.95, (1.0f32 - 0.9025).sqrt()]),
            record("c", 0, vec![0.2, (1.0f32 - 0.04).sqrt()]),
        ];

        let ranking = RetrievalEngine::new().rank(&corpus, &[1.0, 0.0], 2).unwrap();

        assert_eq!(
            keys(&ranking),
            vec![("b".to_string(), 0), ("a".to_string(), 0)]
        );
        assert!((ranking.results[0].score - 0.95).abs() < 1e-5);
        assert!((ranking.results[1].score - 0.9).abs() < 1e-5);
        assert_eq!(ranking.skipped, 0);
    }

    #[test]
    fn test_k_zero_and_empty_corpus() {
        let engine = RetrievalEngine::new();
        let corpus = vec![record("a", 0, vec![1.0, 0.0])];

        assert!(engine.rank(&corpus, &[1.0, 0.0], 0).unwrap().results.is_empty());
        let empty: Vec<EmbeddingRecord> = Vec::new();
        assert!(engine.rank(&empty, &[1.0, 0.0], 5).unwrap().results.is_empty());
    }

    #[test]
    fn test_k_larger_than_corpus() {
        let corpus = vec![
            record("a", 0, vec![1.0, 0.0]),
            record("a", 1, vec![0.0, 1.0]),
        ];
        let ranking = RetrievalEngine::new().rank(&corpus, &[1.0, 1.0], 10).unwrap();
        assert_eq!(ranking.results.len(), 2);
    }

    #[test]
    fn test_results_sorted_non_increasing() {
        let corpus: Vec<EmbeddingRecord> = (0..20)
            .map(|i| {
                let x = (i as f32 * 0.7).sin();
                let y = (i as f32 * 1.3).cos();
                record("doc", i, vec![x, y, 0.5])
            })
            .collect();

        let ranking = RetrievalEngine::new().rank(&corpus, &[0.2, -0.4, 1.0], 7).unwrap();

        assert_eq!(ranking.results.len(), 7);
        assert!(ranking
            .results
            .windows(2)
            .all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_ties_keep_corpus_order() {
        let corpus = vec![
            record("first", 0, vec![3.0, 4.0]),
            record("second", 0, vec![3.0, 4.0]),
            record("third", 0, vec![3.0, 4.0]),
            record("best", 0, vec![1.0, 0.0]),
        ];

        let ranking = RetrievalEngine::new().rank(&corpus, &[1.0, 0.0], 4).unwrap();

        assert_eq!(
            keys(&ranking),
            vec![
                ("best".to_string(), 0),
                ("first".to_string(), 0),
                ("second".to_string(), 0),
                ("third".to_string(), 0),
            ]
        );
    }

    #[test]
    fn test_zero_vectors_sort_last() {
        let corpus = vec![
            record("zero1", 0, vec![0.0, 0.0]),
            record("opposite", 0, vec![-1.0, 0.0]),
            record("zero2", 0, vec![0.0, 0.0]),
            record("same", 0, vec![1.0, 0.0]),
        ];

        let ranking = RetrievalEngine::new().rank(&corpus, &[1.0, 0.0], 4).unwrap();

        assert_eq!(
            keys(&ranking),
            vec![
                ("same".to_string(), 0),
                ("opposite".to_string(), 0),
                ("zero1".to_string(), 0),
                ("zero2".to_string(), 0),
            ]
        );
        assert_eq!(ranking.results[3].score, f32::NEG_INFINITY);
    }

    #[test]
    fn test_zero_query_keeps_corpus_order() {
        let corpus = vec![
            record("a", 0, vec![1.0, 0.0]),
            record("b", 0, vec![0.0, 1.0]),
        ];
        let ranking = RetrievalEngine::new().rank(&corpus, &[0.0, 0.0], 2).unwrap();
        assert_eq!(
            keys(&ranking),
            vec![("a".to_string(), 0), ("b".to_string(), 0)]
        );
    }

    #[test]
    fn test_strict_mode_rejects_mismatch() {
        let corpus = vec![
            record("good", 0, vec![1.0, 0.0]),
            record("bad", 3, vec![1.0, 0.0, 0.0]),
        ];

        let err = RetrievalEngine::new().rank(&corpus, &[1.0, 0.0], 1).unwrap_err();

        match err {
            Error::DimensionMismatch {
                record,
                expected,
                actual,
            } => {
                assert_eq!(record, "bad#3");
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_strict_mode_rejects_mismatch_even_with_k_zero() {
        let corpus = vec![record("bad", 0, vec![1.0])];
        let result = RetrievalEngine::new().rank(&corpus, &[1.0, 0.0], 0);
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_lenient_mode_skips_mismatch() {
        let corpus = vec![
            record("good", 0, vec![1.0, 0.0]),
            record("bad", 0, vec![1.0]),
            record("also_good", 0, vec![0.0, 1.0]),
        ];

        let engine = RetrievalEngine::lenient();
        assert_eq!(engine.policy(), DimensionPolicy::Lenient);
        let ranking = engine.rank(&corpus, &[1.0, 0.0], 5).unwrap();

        assert_eq!(ranking.skipped, 1);
        assert_eq!(
            keys(&ranking),
            vec![("good".to_string(), 0), ("also_good".to_string(), 0)]
        );
    }

    #[test]
    fn test_empty_query_rejected() {
        let empty: Vec<EmbeddingRecord> = Vec::new();
        let result = RetrievalEngine::new().rank(&empty, &[], 3);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_rank_is_deterministic() {
        let corpus: Vec<EmbeddingRecord> = (0..10)
            .map(|i| record("doc", i, vec![(i % 3) as f32, 1.0]))
            .collect();
        let engine = RetrievalEngine::new();

        let first = engine.rank(&corpus, &[1.0, 0.5], 6).unwrap();
        let second = engine.rank(&corpus, &[1.0, 0.5], 6).unwrap();
        assert_eq!(first, second);
    }
}
