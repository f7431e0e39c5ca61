//! ragdb-engine
//!
//! The RAG orchestrator: decides when to retrieve, filters low-relevance
//! evidence, builds the citation-annotated prompt and a quality score, and
//! keeps aggregate counters. Stateless per call; everything is driven by
//! [`RagConfig`].

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod prompt;

use chrono::Utc;
use ragdb_core::config::RagConfig;
use ragdb_core::tokens::estimate_tokens;
use ragdb_core::types::{assign_ranks, Citation, EnhancedPrompt, SearchResult};
use ragdb_core::Result;
use ragdb_hybrid::Retriever;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotone aggregate counters.
#[derive(Debug, Clone, Copy)]
pub struct EngineStats {
    pub total_calls: u64,
    pub enhanced_calls: u64,
    pub passthrough_calls: u64,
}

pub struct RagEngine {
    config: RagConfig,
    retriever: Arc<Retriever>,
    total_calls: AtomicU64,
    enhanced_calls: AtomicU64,
    passthrough_calls: AtomicU64,
}

impl RagEngine {
    /// Build an engine over a retriever. The config is normalized (weights
    /// clamped into range) and then strictly validated.
    pub fn new(config: RagConfig, retriever: Arc<Retriever>) -> Result<Self> {
        let config = config.normalized();
        config.validate()?;
        Ok(Self {
            config,
            retriever,
            total_calls: AtomicU64::new(0),
            enhanced_calls: AtomicU64::new(0),
            passthrough_calls: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Retrieval runs when enabled and either auto-trigger is off or the
    /// query is long enough to be worth a lookup.
    pub fn should_use_rag(&self, query: &str) -> bool {
        self.config.enabled
            && (!self.config.auto_trigger
                || query.chars().count() >= self.config.min_query_length)
    }

    /// The whole pipeline for one query. Retrieval errors fail the call;
    /// a closed gate or an empty corpus yields a valid pass-through result
    /// so the caller can always proceed to completion.
    pub async fn enhance_prompt(&self, query: &str) -> Result<EnhancedPrompt> {
        self.total_calls.fetch_add(1, Ordering::Relaxed);

        if !self.should_use_rag(query) {
            self.passthrough_calls.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(query_len = query.chars().count(), "rag gate closed, passing through");
            return Ok(self.passthrough(query));
        }

        let results = self
            .retriever
            .search(
                query,
                self.config.retrieval_method,
                self.config.top_k,
                self.config.vector_weight,
                self.config.enable_reranking,
            )
            .await?;

        let filtered = filter_results(results, self.config.min_relevance);
        let citations: Vec<Citation> = filtered.iter().map(prompt::citation_for).collect();
        let quality_score = quality_score(&filtered);
        let body = prompt::render(&self.config, query, &filtered);
        let tokens_used = estimate_tokens(&body);

        self.enhanced_calls.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            surviving = filtered.len(),
            quality = f64::from(quality_score),
            "enhanced prompt built"
        );
        Ok(EnhancedPrompt {
            original_query: query.to_string(),
            results: filtered,
            prompt: body,
            citations,
            quality_score,
            method: self.config.retrieval_method,
            tokens_used,
            created_at: Utc::now(),
        })
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            total_calls: self.total_calls.load(Ordering::Relaxed),
            enhanced_calls: self.enhanced_calls.load(Ordering::Relaxed),
            passthrough_calls: self.passthrough_calls.load(Ordering::Relaxed),
        }
    }

    fn passthrough(&self, query: &str) -> EnhancedPrompt {
        EnhancedPrompt {
            original_query: query.to_string(),
            results: Vec::new(),
            prompt: query.to_string(),
            citations: Vec::new(),
            quality_score: 0.0,
            method: self.config.retrieval_method,
            tokens_used: estimate_tokens(query),
            created_at: Utc::now(),
        }
    }
}

/// Drop results below the relevance floor and re-rank the survivors
/// densely.
pub fn filter_results(results: Vec<SearchResult>, min_relevance: f32) -> Vec<SearchResult> {
    let mut surviving: Vec<SearchResult> =
        results.into_iter().filter(|r| r.score >= min_relevance).collect();
    assign_ranks(&mut surviving);
    surviving
}

/// Mean of surviving scores, clamped into [0, 1]; 0 when nothing survives.
pub fn quality_score(results: &[SearchResult]) -> f32 {
    if results.is_empty() {
        return 0.0;
    }
    let mean = results.iter().map(|r| r.score).sum::<f32>() / results.len() as f32;
    mean.clamp(0.0, 1.0)
}
