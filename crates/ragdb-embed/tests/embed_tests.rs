use async_trait::async_trait;
use ragdb_core::traits::EmbeddingProvider;
use ragdb_core::Error;
use ragdb_embed::provider::HashingProvider;
use ragdb_embed::EmbeddingService;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Provider wrapper that counts calls, so cache behavior is observable.
struct CountingProvider {
    inner: HashingProvider,
    calls: AtomicU64,
}

impl CountingProvider {
    fn new(dim: usize) -> Self {
        Self { inner: HashingProvider::new(dim), calls: AtomicU64::new(0) }
    }
}

#[async_trait]
impl EmbeddingProvider for CountingProvider {
    fn model(&self) -> &str {
        self.inner.model()
    }
    fn dim(&self) -> usize {
        self.inner.dim()
    }
    async fn embed(&self, text: &str) -> anyhow::Result<(Vec<f32>, usize)> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text).await
    }
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<(Vec<Vec<f32>>, usize)> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed_batch(texts).await
    }
}

struct FailingProvider;

#[async_trait]
impl EmbeddingProvider for FailingProvider {
    fn model(&self) -> &str {
        "failing"
    }
    fn dim(&self) -> usize {
        8
    }
    async fn embed(&self, _text: &str) -> anyhow::Result<(Vec<f32>, usize)> {
        anyhow::bail!("provider unavailable")
    }
    async fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<(Vec<Vec<f32>>, usize)> {
        anyhow::bail!("provider unavailable")
    }
}

#[tokio::test]
async fn repeated_embed_hits_the_cache() {
    let provider = Arc::new(CountingProvider::new(32));
    let service = EmbeddingService::new(provider.clone(), 16, 0.02);

    let first = service.embed("hello world").await.expect("embed");
    let second = service.embed("hello world").await.expect("embed");
    assert_eq!(first.vector, second.vector);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1, "second call served from cache");

    let usage = service.usage();
    assert_eq!(usage.requests, 2);
    assert_eq!(usage.cache_hits, 1);
    assert_eq!(usage.provider_calls, 1);
}

#[tokio::test]
async fn batch_sends_only_misses_to_the_provider() {
    let provider = Arc::new(CountingProvider::new(32));
    let service = EmbeddingService::new(provider.clone(), 16, 0.02);

    service.embed("alpha").await.expect("prime cache");
    let calls_before = provider.calls.load(Ordering::SeqCst);

    let texts = vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()];
    let embeddings = service.embed_batch(&texts).await.expect("batch");
    assert_eq!(embeddings.len(), 3);
    assert_eq!(
        provider.calls.load(Ordering::SeqCst),
        calls_before + 1,
        "one provider call for the two misses"
    );

    // Correlate by content hash id, not by position.
    for text in &texts {
        assert!(
            embeddings.iter().any(|e| e.id.contains(&blake3_hex(text))),
            "missing embedding for {text:?}"
        );
    }
}

fn blake3_hex(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

#[tokio::test]
async fn usage_tracks_tokens_and_cost() {
    let service = EmbeddingService::new(Arc::new(HashingProvider::new(16)), 16, 2.0);
    service.embed("one two three four").await.expect("embed");
    let usage = service.usage();
    assert!(usage.tokens >= 4);
    let expected = usage.tokens as f64 * 2.0 / 1_000_000.0;
    assert!((usage.cost - expected).abs() < 1e-12);
}

#[tokio::test]
async fn provider_failure_propagates_as_provider_error() {
    let service = EmbeddingService::new(Arc::new(FailingProvider), 16, 0.0);
    let err = service.embed("anything").await.expect_err("must fail");
    assert!(matches!(err, Error::Provider(_)));
}

#[tokio::test]
async fn cache_capacity_bounds_service_cache() {
    let service = EmbeddingService::new(Arc::new(HashingProvider::new(16)), 4, 0.0);
    for i in 0..10 {
        service.embed(&format!("text number {i}")).await.expect("embed");
        assert!(service.cache_len() <= 4);
    }
}
