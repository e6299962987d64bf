use std::collections::HashMap;

use anyhow::Result;

/// Fixed per-strategy weights for the hybrid merge. Must sum to 1.0.
#[derive(Debug, Clone, Copy)]
pub struct FusionWeights {
    pub lexical: f32,
    pub semantic: f32,
}

impl FusionWeights {
    pub fn new(lexical: f32, semantic: f32) -> Result<Self> {
        let sum = lexical + semantic;
        if !(0.999..=1.001).contains(&sum) {
            anyhow::bail!("fusion weights must sum to 1.0, got {sum}");
        }
        if lexical < 0.0 || semantic < 0.0 {
            anyhow::bail!("fusion weights must be non-negative");
        }
        Ok(Self { lexical, semantic })
    }
}

/// One chunk's merged ranking produced by [`weighted_rank_fusion`].
#[derive(Debug, Clone)]
pub struct FusedHit {
    pub ordinal: usize,
    pub lexical_score: f32,
    pub semantic_score: f32,
    pub combined_score: f32,
    lexical_rank: Option<usize>,
}

const RRF_K: f32 = 60.0;

/// Weighted reciprocal-rank fusion of the lexical and semantic result lists.
///
/// Each list contributes `weight × 1/(60 + rank + 1)` per chunk; chunks in
/// both lists accumulate both contributions. Results are re-ranked by
/// combined score with ties broken by lexical rank (absent ranks last),
/// then by ordinal, so the ordering is fully deterministic.
pub fn weighted_rank_fusion(
    lexical: &[(usize, f32)],
    semantic: &[(usize, f32)],
    weights: FusionWeights,
    limit: usize,
) -> Vec<FusedHit> {
    let mut merged: HashMap<usize, FusedHit> = HashMap::new();

    for (rank, &(ordinal, score)) in lexical.iter().enumerate() {
        let entry = merged.entry(ordinal).or_insert_with(|| FusedHit {
            ordinal,
            lexical_score: 0.0,
            semantic_score: 0.0,
            combined_score: 0.0,
            lexical_rank: None,
        });
        entry.lexical_score = score;
        entry.lexical_rank = Some(rank);
        entry.combined_score += weights.lexical * rrf(rank);
    }

    for (rank, &(ordinal, score)) in semantic.iter().enumerate() {
        let entry = merged.entry(ordinal).or_insert_with(|| FusedHit {
            ordinal,
            lexical_score: 0.0,
            semantic_score: 0.0,
            combined_score: 0.0,
            lexical_rank: None,
        });
        entry.semantic_score = score;
        entry.combined_score += weights.semantic * rrf(rank);
    }

    let mut results: Vec<FusedHit> = merged.into_values().collect();
    results.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let a_rank = a.lexical_rank.unwrap_or(usize::MAX);
                let b_rank = b.lexical_rank.unwrap_or(usize::MAX);
                a_rank.cmp(&b_rank)
            })
            .then_with(|| a.ordinal.cmp(&b.ordinal))
    });
    results.truncate(limit);
    results
}

fn rrf(rank: usize) -> f32 {
    1.0 / (RRF_K + rank as f32 + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> FusionWeights {
        FusionWeights::new(0.4, 0.6).unwrap()
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        assert!(FusionWeights::new(0.5, 0.6).is_err());
        assert!(FusionWeights::new(0.4, 0.6).is_ok());
        assert!(FusionWeights::new(-0.2, 1.2).is_err());
    }

    #[test]
    fn test_empty_inputs() {
        let results = weighted_rank_fusion(&[], &[], weights(), 10);
        assert!(results.is_empty());
    }

    #[test]
    fn test_lexical_only_preserves_rank_order() {
        let lexical = vec![(2, 5.0), (0, 3.0), (1, 1.0)];
        let results = weighted_rank_fusion(&lexical, &[], weights(), 10);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].ordinal, 2);
        assert_eq!(results[1].ordinal, 0);
        assert_eq!(results[2].ordinal, 1);
    }

    #[test]
    fn test_chunk_in_both_lists_outranks_single_list_chunks() {
        // Chunk 0 is rank 1 in both lists; chunks 1 and 2 lead one list each.
        let lexical = vec![(1, 9.0), (0, 5.0)];
        let semantic = vec![(2, 0.95), (0, 0.90)];
        let results = weighted_rank_fusion(&lexical, &semantic, weights(), 10);
        assert_eq!(results[0].ordinal, 0);
    }

    #[test]
    fn test_per_strategy_scores_carried_through() {
        let lexical = vec![(0, 7.5)];
        let semantic = vec![(0, 0.88)];
        let results = weighted_rank_fusion(&lexical, &semantic, weights(), 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].lexical_score, 7.5);
        assert_eq!(results[0].semantic_score, 0.88);
    }

    #[test]
    fn test_combined_score_is_weighted_rrf_sum() {
        let lexical = vec![(0, 1.0)];
        let semantic = vec![(0, 1.0)];
        let results = weighted_rank_fusion(&lexical, &semantic, weights(), 10);
        let expected = 0.4 * (1.0 / 61.0) + 0.6 * (1.0 / 61.0);
        assert!((results[0].combined_score - expected).abs() < 1e-6);
    }

    #[test]
    fn test_tie_broken_by_lexical_rank() {
        // Symmetric weights so two chunks leading one list each tie exactly.
        let even = FusionWeights::new(0.5, 0.5).unwrap();
        let lexical = vec![(7, 2.0)];
        let semantic = vec![(3, 0.9)];
        let results = weighted_rank_fusion(&lexical, &semantic, even, 10);
        assert_eq!(results.len(), 2);
        // Chunk 7 has a lexical rank, chunk 3 does not; 7 wins the tie.
        assert_eq!(results[0].ordinal, 7);
        assert_eq!(results[1].ordinal, 3);
    }

    #[test]
    fn test_deterministic_across_runs() {
        let lexical = vec![(0, 3.0), (1, 2.0), (2, 1.0)];
        let semantic = vec![(2, 0.9), (1, 0.8), (0, 0.7)];
        let first: Vec<usize> = weighted_rank_fusion(&lexical, &semantic, weights(), 10)
            .iter()
            .map(|h| h.ordinal)
            .collect();
        for _ in 0..20 {
            let again: Vec<usize> = weighted_rank_fusion(&lexical, &semantic, weights(), 10)
                .iter()
                .map(|h| h.ordinal)
                .collect();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_limit_respected() {
        let lexical: Vec<(usize, f32)> = (0..50).map(|i| (i, 50.0 - i as f32)).collect();
        let results = weighted_rank_fusion(&lexical, &[], weights(), 5);
        assert_eq!(results.len(), 5);
    }
}
