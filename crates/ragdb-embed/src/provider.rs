//! Deterministic offline provider.
//!
//! Buckets whitespace tokens into a fixed-dimension vector by hash and
//! L2-normalizes the result. No network, no model files; used by tests and
//! as a degraded offline mode. Texts sharing vocabulary land near each
//! other, which is all the retrieval tests need.

use async_trait::async_trait;
use ragdb_core::tokens::estimate_tokens;
use ragdb_core::traits::EmbeddingProvider;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

pub struct HashingProvider {
    dim: usize,
    model: String,
}

impl HashingProvider {
    pub fn new(dim: usize) -> Self {
        Self { dim, model: format!("hashing-{dim}") }
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.to_lowercase().split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for HashingProvider {
    fn model(&self) -> &str {
        &self.model
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> anyhow::Result<(Vec<f32>, usize)> {
        Ok((self.embed_sync(text), estimate_tokens(text)))
    }

    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<(Vec<Vec<f32>>, usize)> {
        let vectors = texts.iter().map(|t| self.embed_sync(t)).collect();
        let tokens = texts.iter().map(|t| estimate_tokens(t)).sum();
        Ok((vectors, tokens))
    }
}
