//! ragdb-vector
//!
//! Reference vector store: an in-memory map with linear-scan cosine search.
//! A correctness baseline, not an ANN index; production backends implement
//! the same [`VectorStore`] contract behind the trait.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod similarity;

use async_trait::async_trait;
use ragdb_core::traits::VectorStore;
use ragdb_core::types::Embedding;
use ragdb_core::{Error, Result};
use similarity::cosine_similarity;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct InMemoryVectorStore {
    records: RwLock<HashMap<String, Embedding>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn save_embedding(&self, embedding: Embedding) -> Result<()> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.insert(embedding.id.clone(), embedding);
        Ok(())
    }

    async fn save_embeddings(&self, embeddings: Vec<Embedding>) -> Result<()> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        for embedding in embeddings {
            records.insert(embedding.id.clone(), embedding);
        }
        Ok(())
    }

    async fn get_embedding(&self, id: &str) -> Result<Embedding> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        records
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("embedding {id}")))
    }

    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Embedding>> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        let mut scored: Vec<(f32, &Embedding)> = records
            .values()
            .map(|e| (cosine_similarity(query, &e.vector), e))
            .collect();
        // Stable order under score ties so searches are deterministic.
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.id.cmp(&b.1.id))
        });
        Ok(scored.into_iter().take(top_k).map(|(_, e)| e.clone()).collect())
    }

    async fn delete_embedding(&self, id: &str) -> Result<()> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.remove(id);
        Ok(())
    }

    async fn delete_by_chunk_id(&self, chunk_id: &str) -> Result<()> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let before = records.len();
        records.retain(|_, e| e.chunk_id != chunk_id);
        let removed = before - records.len();
        if removed > 0 {
            tracing::debug!(chunk_id, removed, "deleted embeddings for chunk");
        }
        Ok(())
    }

    async fn len(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}
