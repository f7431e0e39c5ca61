//! Second-pass reordering by lexical overlap with the query.

use crate::bm25::tokenize;
use ragdb_core::types::{assign_ranks, SearchResult};
use std::collections::HashSet;

/// Blend of the first-pass score and the count of query terms present in
/// the chunk content.
const SCORE_WEIGHT: f32 = 0.7;
const OVERLAP_WEIGHT: f32 = 0.3;

/// Rerank an over-fetched candidate list down to `top_k`.
///
/// A no-op when the list is already within `top_k`: there is nothing to cut,
/// so the first-pass order stands.
pub fn rerank(query: &str, mut results: Vec<SearchResult>, top_k: usize) -> Vec<SearchResult> {
    if results.len() <= top_k {
        return results;
    }

    let query_terms: HashSet<String> = tokenize(query).into_iter().collect();
    for result in &mut results {
        let content_terms: HashSet<String> = tokenize(&result.content).into_iter().collect();
        let overlap = query_terms.intersection(&content_terms).count() as f32;
        result.score = result.score * SCORE_WEIGHT + overlap * OVERLAP_WEIGHT;
    }

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk_id.cmp(&b.chunk_id))
    });
    results.truncate(top_k);
    assign_ranks(&mut results);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragdb_core::types::RetrievalMethod;

    fn result(chunk_id: &str, content: &str, score: f32) -> SearchResult {
        SearchResult {
            chunk_id: chunk_id.to_string(),
            content: content.to_string(),
            score,
            metadata: Default::default(),
            method: RetrievalMethod::Hybrid,
            rank: 0,
        }
    }

    #[test]
    fn overlap_promotes_lexically_matching_chunks() {
        let results = vec![
            result("a", "completely unrelated text", 0.9),
            result("b", "rust borrow checker details", 0.6),
            result("c", "also unrelated", 0.5),
        ];
        let reranked = rerank("rust borrow checker", results, 2);
        assert_eq!(reranked.len(), 2);
        // b: 0.6*0.7 + 3*0.3 = 1.32 beats a: 0.9*0.7 = 0.63
        assert_eq!(reranked[0].chunk_id, "b");
        assert_eq!(reranked[0].rank, 1);
        assert_eq!(reranked[1].rank, 2);
    }

    #[test]
    fn short_lists_pass_through_untouched() {
        let results = vec![result("a", "text", 0.4)];
        let reranked = rerank("query", results.clone(), 5);
        assert_eq!(reranked[0].score, results[0].score);
    }
}
