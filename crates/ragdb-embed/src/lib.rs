//! ragdb-embed
//!
//! Turns text into embeddings through a pluggable provider, memoized by a
//! bounded cache, with cumulative usage accounting. Provider failures are
//! never retried here; the caller owns retry policy.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod cache;
pub mod provider;

use cache::EmbeddingCache;
use chrono::Utc;
use ragdb_core::tokens::estimate_tokens;
use ragdb_core::traits::EmbeddingProvider;
use ragdb_core::types::Embedding;
use ragdb_core::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Snapshot of cumulative usage counters.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddingUsage {
    pub requests: u64,
    pub cache_hits: u64,
    pub provider_calls: u64,
    pub tokens: u64,
    /// tokens x price-per-million / 1_000_000
    pub cost: f64,
}

pub struct EmbeddingService {
    provider: Arc<dyn EmbeddingProvider>,
    cache: EmbeddingCache,
    price_per_million: f64,
    requests: AtomicU64,
    cache_hits: AtomicU64,
    provider_calls: AtomicU64,
    tokens: AtomicU64,
}

impl EmbeddingService {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        cache_capacity: usize,
        price_per_million: f64,
    ) -> Self {
        Self {
            provider,
            cache: EmbeddingCache::new(cache_capacity),
            price_per_million,
            requests: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            provider_calls: AtomicU64::new(0),
            tokens: AtomicU64::new(0),
        }
    }

    pub fn dim(&self) -> usize {
        self.provider.dim()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Embed one text, cache-first. The returned embedding is chunk-agnostic;
    /// bind it with [`Embedding::bound_to`] before persisting.
    pub async fn embed(&self, text: &str) -> Result<Embedding> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if let Some(hit) = self.cache.get(text, self.provider.model()) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(hit);
        }

        let (vector, token_count) = self.provider.embed(text).await?;
        self.check_dim(vector.len())?;
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
        self.tokens.fetch_add(token_count as u64, Ordering::Relaxed);

        let embedding = self.build(text, vector, token_count);
        self.cache.put(text, self.provider.model(), embedding.clone());
        Ok(embedding)
    }

    /// Embed many texts. Cached entries are served from cache and excluded
    /// from the single provider call; fresh results are cached individually.
    ///
    /// The merged output carries one embedding per distinct input text, but
    /// cached hits are not guaranteed to occupy their original positions:
    /// callers correlate by content, not by index.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        self.requests.fetch_add(texts.len() as u64, Ordering::Relaxed);

        let mut out = Vec::with_capacity(texts.len());
        let mut misses: Vec<String> = Vec::new();
        for text in texts {
            if let Some(hit) = self.cache.get(text, self.provider.model()) {
                self.cache_hits.fetch_add(1, Ordering::Relaxed);
                out.push(hit);
            } else if !misses.contains(text) {
                misses.push(text.clone());
            }
        }
        if misses.is_empty() {
            return Ok(out);
        }

        let (vectors, total_tokens) = self.provider.embed_batch(&misses).await?;
        if vectors.len() != misses.len() {
            return Err(Error::Operation(format!(
                "provider returned {} vectors for {} texts",
                vectors.len(),
                misses.len()
            )));
        }
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
        self.tokens.fetch_add(total_tokens as u64, Ordering::Relaxed);

        for (text, vector) in misses.iter().zip(vectors) {
            self.check_dim(vector.len())?;
            // Per-text token attribution uses the local estimator; the
            // provider only reports a batch total.
            let embedding = self.build(text, vector, estimate_tokens(text));
            self.cache.put(text, self.provider.model(), embedding.clone());
            out.push(embedding);
        }
        tracing::debug!(
            requested = texts.len(),
            provider_texts = misses.len(),
            "embedded batch"
        );
        Ok(out)
    }

    pub fn usage(&self) -> EmbeddingUsage {
        let tokens = self.tokens.load(Ordering::Relaxed);
        EmbeddingUsage {
            requests: self.requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            provider_calls: self.provider_calls.load(Ordering::Relaxed),
            tokens,
            cost: tokens as f64 * self.price_per_million / 1_000_000.0,
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    fn build(&self, text: &str, vector: Vec<f32>, token_count: usize) -> Embedding {
        Embedding {
            id: EmbeddingCache::key(text, self.provider.model()),
            chunk_id: String::new(),
            vector,
            model: self.provider.model().to_string(),
            tokens_used: token_count,
            created_at: Utc::now(),
        }
    }

    fn check_dim(&self, got: usize) -> Result<()> {
        if got != self.provider.dim() {
            return Err(Error::Operation(format!(
                "provider returned dimension {got}, expected {}",
                self.provider.dim()
            )));
        }
        Ok(())
    }
}
