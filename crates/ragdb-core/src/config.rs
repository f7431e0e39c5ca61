//! Retrieval configuration and loader.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `RAGDB_*`
//! env vars. Values may also be constructed programmatically; either way
//! they pass through [`RagConfig::normalized`] before use.

use crate::types::RetrievalMethod;
use crate::{Error, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_PROMPT_TEMPLATE: &str = "Answer the question using the \
context below. Cite the sources you rely on.\n\nContext:\n{context}\n\n\
Question: {query}";

/// Process-wide (or per-call) retrieval configuration.
///
/// `vector_weight` is the weight of the vector arm in hybrid fusion; the
/// BM25 weight is implicitly `1 - vector_weight`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub enabled: bool,
    pub retrieval_method: RetrievalMethod,
    pub top_k: usize,
    pub vector_weight: f32,
    pub min_relevance: f32,
    pub auto_trigger: bool,
    pub min_query_length: usize,
    pub enable_reranking: bool,
    /// Token budget for the evidence section of the synthesized prompt.
    pub max_context_length: usize,
    /// Template with `{context}` and `{query}` placeholders.
    pub prompt_template: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retrieval_method: RetrievalMethod::Hybrid,
            top_k: 5,
            vector_weight: 0.7,
            min_relevance: 0.3,
            auto_trigger: true,
            min_query_length: 10,
            enable_reranking: true,
            max_context_length: 2000,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

impl RagConfig {
    /// Load from `config.toml`, an env-specific overlay and `RAGDB_*` env
    /// vars, on top of the defaults.
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(RagConfig::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("RAGDB_"));

        let config: RagConfig = figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;
        Ok(config.normalized())
    }

    /// Clamp the weight and relevance knobs into [0, 1]. Loaded configs are
    /// always normalized; out-of-range values are clamped with a warning
    /// rather than rejected.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if !(0.0..=1.0).contains(&self.vector_weight) {
            tracing::warn!(
                vector_weight = f64::from(self.vector_weight),
                "clamping vector_weight into [0,1]"
            );
            self.vector_weight = self.vector_weight.clamp(0.0, 1.0);
        }
        if !(0.0..=1.0).contains(&self.min_relevance) {
            tracing::warn!(
                min_relevance = f64::from(self.min_relevance),
                "clamping min_relevance into [0,1]"
            );
            self.min_relevance = self.min_relevance.clamp(0.0, 1.0);
        }
        self
    }

    /// Strict validation for programmatically supplied configs.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.vector_weight) {
            return Err(Error::InvalidConfig(format!(
                "vector_weight must be in [0,1], got {}",
                self.vector_weight
            )));
        }
        if !(0.0..=1.0).contains(&self.min_relevance) {
            return Err(Error::InvalidConfig(format!(
                "min_relevance must be in [0,1], got {}",
                self.min_relevance
            )));
        }
        if self.top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be at least 1".to_string()));
        }
        if !self.prompt_template.contains("{query}") {
            return Err(Error::InvalidConfig(
                "prompt_template must contain a {query} placeholder".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bm25_weight(&self) -> f32 {
        1.0 - self.vector_weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = RagConfig::default();
        cfg.validate().expect("defaults are valid");
        assert!((cfg.bm25_weight() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn normalization_clamps_weight() {
        let cfg = RagConfig { vector_weight: 1.7, ..RagConfig::default() }.normalized();
        assert_eq!(cfg.vector_weight, 1.0);
    }

    #[test]
    fn out_of_range_weight_is_invalid() {
        let cfg = RagConfig { vector_weight: -0.1, ..RagConfig::default() };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn zero_top_k_is_invalid() {
        let cfg = RagConfig { top_k: 0, ..RagConfig::default() };
        assert!(cfg.validate().is_err());
    }
}
