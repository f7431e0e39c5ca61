//! Bounded embedding cache keyed by `(content hash, model)`.
//!
//! The cache is consulted prior to calling a provider and written through on
//! cache misses. Eviction is approximate-LRU: when full, the entry with the
//! lowest access counter goes, ties broken arbitrarily. Cached embeddings
//! are never mutated.

use ragdb_core::types::Embedding;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

struct Slot {
    embedding: Embedding,
    access: u64,
}

pub struct EmbeddingCache {
    capacity: usize,
    inner: Mutex<HashMap<String, Slot>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cache key: content hash plus model id, so the same text embedded by
    /// two models never collides.
    pub fn key(text: &str, model: &str) -> String {
        format!("{}:{}", model, blake3::hash(text.as_bytes()).to_hex())
    }

    pub fn get(&self, text: &str, model: &str) -> Option<Embedding> {
        let key = Self::key(text, model);
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match inner.get_mut(&key) {
            Some(slot) => {
                slot.access += 1;
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(slot.embedding.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn put(&self, text: &str, model: &str, embedding: Embedding) {
        if self.capacity == 0 {
            return;
        }
        let key = Self::key(text, model);
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if !inner.contains_key(&key) && inner.len() >= self.capacity {
            // Evict the least-used entry.
            if let Some(victim) = inner
                .iter()
                .min_by_key(|(_, slot)| slot.access)
                .map(|(k, _)| k.clone())
            {
                tracing::debug!(key = %victim, "evicting least-used cache entry");
                inner.remove(&victim);
            }
        }
        inner.insert(key, Slot { embedding, access: 0 });
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn embedding(text: &str) -> Embedding {
        Embedding {
            id: EmbeddingCache::key(text, "m"),
            chunk_id: String::new(),
            vector: vec![1.0, 0.0],
            model: "m".to_string(),
            tokens_used: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let cache = EmbeddingCache::new(3);
        for i in 0..10 {
            let text = format!("text-{i}");
            cache.put(&text, "m", embedding(&text));
            assert!(cache.len() <= 3);
        }
    }

    #[test]
    fn frequently_read_entries_survive_eviction() {
        let cache = EmbeddingCache::new(2);
        cache.put("hot", "m", embedding("hot"));
        cache.put("cold", "m", embedding("cold"));
        for _ in 0..5 {
            assert!(cache.get("hot", "m").is_some());
        }
        cache.put("new", "m", embedding("new"));
        assert!(cache.get("hot", "m").is_some(), "hot entry must survive");
        assert!(cache.get("cold", "m").is_none(), "cold entry was evicted");
    }

    #[test]
    fn reinserting_a_key_does_not_grow_the_cache() {
        let cache = EmbeddingCache::new(2);
        cache.put("a", "m", embedding("a"));
        cache.put("a", "m", embedding("a"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn keys_differ_per_model() {
        assert_ne!(EmbeddingCache::key("t", "m1"), EmbeddingCache::key("t", "m2"));
    }
}
