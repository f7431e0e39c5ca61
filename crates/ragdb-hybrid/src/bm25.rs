//! Classic BM25 over the in-memory chunk corpus.
//!
//! Document frequencies and the average document length are recomputed per
//! query from the live corpus; no persistent inverted index is kept. That
//! keeps scoring correct under concurrent index/delete traffic at the cost
//! of a linear pass, which is the same trade the reference vector store
//! makes.

use ragdb_core::types::{Chunk, ChunkId};
use std::collections::HashSet;

pub const K1: f32 = 1.5;
pub const B: f32 = 0.75;

/// Lowercased whitespace tokens with surrounding ASCII punctuation stripped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| c.is_ascii_punctuation())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

/// Score every chunk against `query`; only positive scores are returned,
/// sorted descending (chunk id breaks ties), truncated to `limit`.
pub fn rank<'a, I>(query: &str, corpus: I, limit: usize) -> Vec<(ChunkId, f32)>
where
    I: Iterator<Item = &'a Chunk>,
{
    let mut terms: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for term in tokenize(query) {
        if seen.insert(term.clone()) {
            terms.push(term);
        }
    }
    if terms.is_empty() {
        return Vec::new();
    }

    let docs: Vec<(&ChunkId, Vec<String>)> =
        corpus.map(|c| (&c.id, tokenize(&c.content))).collect();
    if docs.is_empty() {
        return Vec::new();
    }

    let n = docs.len() as f32;
    let avg_doc_len =
        docs.iter().map(|(_, tokens)| tokens.len() as f32).sum::<f32>() / n;

    // Per-term document frequency against the current corpus.
    let df: Vec<f32> = terms
        .iter()
        .map(|term| {
            docs.iter()
                .filter(|(_, tokens)| tokens.contains(term))
                .count() as f32
        })
        .collect();

    let mut scored: Vec<(ChunkId, f32)> = Vec::new();
    for (id, tokens) in &docs {
        let doc_len = tokens.len() as f32;
        let mut score = 0f32;
        for (term, df) in terms.iter().zip(&df) {
            let tf = tokens.iter().filter(|t| *t == term).count() as f32;
            if tf == 0.0 {
                continue;
            }
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
            let denom = tf + K1 * (1.0 - B + B * doc_len / avg_doc_len.max(1e-6));
            score += idf * tf * (K1 + 1.0) / denom;
        }
        if score > 0.0 {
            scored.push(((*id).clone(), score));
        }
    }

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    scored.truncate(limit);
    scored
}
