//! ragdb-hybrid
//!
//! The retriever: maintains a chunk index in lock-step with the vector
//! store, answers vector, BM25 and hybrid queries, and owns the reranker.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod bm25;
pub mod rerank;

use ragdb_core::traits::VectorStore;
use ragdb_core::types::{assign_ranks, Chunk, ChunkId, RetrievalMethod, SearchResult};
use ragdb_core::Result;
use ragdb_embed::cache::EmbeddingCache;
use ragdb_embed::EmbeddingService;
use ragdb_vector::similarity::cosine_similarity;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Monotone counters exposed alongside the live chunk count.
#[derive(Debug, Clone, Copy)]
pub struct RetrieverStats {
    pub searches: u64,
    pub chunks_indexed: u64,
    pub chunk_count: usize,
}

pub struct Retriever {
    embedder: Arc<EmbeddingService>,
    store: Arc<dyn VectorStore>,
    chunks: RwLock<HashMap<ChunkId, Chunk>>,
    searches: AtomicU64,
    chunks_indexed: AtomicU64,
}

impl Retriever {
    pub fn new(embedder: Arc<EmbeddingService>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            chunks: RwLock::new(HashMap::new()),
            searches: AtomicU64::new(0),
            chunks_indexed: AtomicU64::new(0),
        }
    }

    /// Embed one chunk and persist it to both the vector store and the
    /// local chunk index. Re-indexing the same chunk id upserts.
    pub async fn index_chunk(&self, chunk: Chunk) -> Result<()> {
        let embedding = self.embedder.embed(&chunk.content).await?;
        self.store.save_embedding(embedding.bound_to(&chunk.id)).await?;
        self.insert_chunks(vec![chunk]);
        Ok(())
    }

    /// Batch variant: one provider call for all uncached contents.
    pub async fn index_chunks(&self, chunks: Vec<Chunk>) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        // Batch output is not positionally aligned with the input; correlate
        // through the content-derived embedding id.
        let by_id: HashMap<&str, &ragdb_core::types::Embedding> =
            embeddings.iter().map(|e| (e.id.as_str(), e)).collect();

        let mut bound = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let key = EmbeddingCache::key(&chunk.content, self.embedder.model());
            let embedding = by_id.get(key.as_str()).ok_or_else(|| {
                ragdb_core::Error::Operation(format!(
                    "no embedding produced for chunk {}",
                    chunk.id
                ))
            })?;
            bound.push(embedding.bound_to(&chunk.id));
        }
        self.store.save_embeddings(bound).await?;
        tracing::info!(count = chunks.len(), "indexed chunk batch");
        self.insert_chunks(chunks);
        Ok(())
    }

    /// Remove a chunk from both the vector store and the chunk index.
    pub async fn delete_chunk(&self, chunk_id: &str) -> Result<()> {
        self.store.delete_by_chunk_id(chunk_id).await?;
        let mut chunks = self.chunks.write().unwrap_or_else(|e| e.into_inner());
        chunks.remove(chunk_id);
        Ok(())
    }

    /// Remove every chunk belonging to a document.
    pub async fn delete_document(&self, doc_id: &str) -> Result<()> {
        let ids: Vec<ChunkId> = {
            let chunks = self.chunks.read().unwrap_or_else(|e| e.into_inner());
            chunks
                .values()
                .filter(|c| c.doc_id == doc_id)
                .map(|c| c.id.clone())
                .collect()
        };
        for id in &ids {
            self.delete_chunk(id).await?;
        }
        tracing::info!(doc_id, removed = ids.len(), "deleted document chunks");
        Ok(())
    }

    /// Dispatch on the retrieval method; when `enable_reranking` is set the
    /// chosen arm over-fetches `2 x top_k` candidates and the reranker cuts
    /// the list back down.
    pub async fn search(
        &self,
        query: &str,
        method: RetrievalMethod,
        top_k: usize,
        vector_weight: f32,
        enable_reranking: bool,
    ) -> Result<Vec<SearchResult>> {
        self.searches.fetch_add(1, Ordering::Relaxed);
        let fetch = if enable_reranking { top_k * 2 } else { top_k };
        let results = match method {
            RetrievalMethod::Vector => self.vector_search(query, fetch).await?,
            RetrievalMethod::Bm25 => self.bm25_search(query, fetch),
            RetrievalMethod::Hybrid => {
                self.hybrid_search(query, fetch, vector_weight).await?
            }
        };
        if enable_reranking {
            Ok(rerank::rerank(query, results, top_k))
        } else {
            Ok(results)
        }
    }

    /// Embed the query and search the vector store, recomputing similarity
    /// locally so an unscored store still yields correct ordering. Hits
    /// whose chunk has disappeared from the index are skipped.
    pub async fn vector_search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed(query).await?;
        let hits = self.store.search(&query_embedding.vector, top_k).await?;

        let chunks = self.chunks.read().unwrap_or_else(|e| e.into_inner());
        let mut results: Vec<SearchResult> = hits
            .into_iter()
            .filter_map(|hit| {
                let chunk = match chunks.get(&hit.chunk_id) {
                    Some(c) => c,
                    None => {
                        tracing::warn!(chunk_id = %hit.chunk_id, "stale vector hit, skipping");
                        return None;
                    }
                };
                Some(SearchResult {
                    chunk_id: chunk.id.clone(),
                    content: chunk.content.clone(),
                    score: cosine_similarity(&query_embedding.vector, &hit.vector),
                    metadata: chunk.metadata.clone(),
                    method: RetrievalMethod::Vector,
                    rank: 0,
                })
            })
            .collect();
        sort_results(&mut results);
        assign_ranks(&mut results);
        Ok(results)
    }

    /// Lexical BM25 over the chunk index. Pure CPU work, no await points.
    pub fn bm25_search(&self, query: &str, top_k: usize) -> Vec<SearchResult> {
        let chunks = self.chunks.read().unwrap_or_else(|e| e.into_inner());
        let ranked = bm25::rank(query, chunks.values(), top_k);
        let mut results: Vec<SearchResult> = ranked
            .into_iter()
            .filter_map(|(chunk_id, score)| {
                let chunk = chunks.get(&chunk_id)?;
                Some(SearchResult {
                    chunk_id,
                    content: chunk.content.clone(),
                    score,
                    metadata: chunk.metadata.clone(),
                    method: RetrievalMethod::Bm25,
                    rank: 0,
                })
            })
            .collect();
        assign_ranks(&mut results);
        results
    }

    /// Weighted fusion of both arms over `2 x top_k` candidates each. The
    /// arms are independent reads and run concurrently; scores sum when a
    /// chunk appears in both.
    pub async fn hybrid_search(
        &self,
        query: &str,
        top_k: usize,
        vector_weight: f32,
    ) -> Result<Vec<SearchResult>> {
        let vector_weight = vector_weight.clamp(0.0, 1.0);
        let fetch = top_k * 2;
        let (vector_hits, bm25_hits) = futures::join!(
            self.vector_search(query, fetch),
            async { self.bm25_search(query, fetch) },
        );
        let vector_hits = vector_hits?;

        let mut fused: HashMap<ChunkId, SearchResult> = HashMap::new();
        for mut hit in vector_hits {
            hit.score *= vector_weight;
            hit.method = RetrievalMethod::Hybrid;
            hit.rank = 0;
            fused.insert(hit.chunk_id.clone(), hit);
        }
        for mut hit in bm25_hits {
            hit.score *= 1.0 - vector_weight;
            hit.method = RetrievalMethod::Hybrid;
            hit.rank = 0;
            match fused.get_mut(&hit.chunk_id) {
                Some(existing) => existing.score += hit.score,
                None => {
                    fused.insert(hit.chunk_id.clone(), hit);
                }
            }
        }

        let mut results: Vec<SearchResult> = fused.into_values().collect();
        sort_results(&mut results);
        results.truncate(top_k);
        assign_ranks(&mut results);
        Ok(results)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn stats(&self) -> RetrieverStats {
        RetrieverStats {
            searches: self.searches.load(Ordering::Relaxed),
            chunks_indexed: self.chunks_indexed.load(Ordering::Relaxed),
            chunk_count: self.chunk_count(),
        }
    }

    pub fn embedder(&self) -> &EmbeddingService {
        &self.embedder
    }

    fn insert_chunks(&self, new_chunks: Vec<Chunk>) {
        let count = new_chunks.len() as u64;
        let mut chunks = self.chunks.write().unwrap_or_else(|e| e.into_inner());
        for chunk in new_chunks {
            chunks.insert(chunk.id.clone(), chunk);
        }
        self.chunks_indexed.fetch_add(count, Ordering::Relaxed);
    }
}

/// Descending score with a stable chunk-id tie-break, so equal inputs
/// always produce the same ordering.
fn sort_results(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk_id.cmp(&b.chunk_id))
    });
}
