use crate::types::Embedding;
use crate::Result;
use async_trait::async_trait;

/// Narrow contract over whatever turns text into vectors. Supplied by the
/// caller; the core never depends on a specific vendor API. Provider failures
/// are not retried here, the caller owns retry policy.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier, used to key cached vectors.
    fn model(&self) -> &str;

    /// Fixed output dimension of this model.
    fn dim(&self) -> usize;

    /// Embed one text. Returns the vector and the token count billed.
    async fn embed(&self, text: &str) -> anyhow::Result<(Vec<f32>, usize)>;

    /// Embed several texts in one provider call. Returns one vector per
    /// input, in input order, plus the total token count billed.
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<(Vec<Vec<f32>>, usize)>;
}

/// Persistence contract for embeddings plus similarity search.
///
/// The reference implementation is in-memory; a production backend may be a
/// persistent vector index but must preserve these semantics, in particular
/// the descending-similarity ordering of `search`.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Idempotent upsert by `Embedding::id`.
    async fn save_embedding(&self, embedding: Embedding) -> Result<()>;

    /// Bulk upsert, equivalent to `save_embedding` per element.
    async fn save_embeddings(&self, embeddings: Vec<Embedding>) -> Result<()>;

    /// Fails with [`crate::Error::NotFound`] when the id is absent.
    async fn get_embedding(&self, id: &str) -> Result<Embedding>;

    /// Top `top_k` embeddings by descending cosine similarity to `query`.
    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Embedding>>;

    async fn delete_embedding(&self, id: &str) -> Result<()>;

    /// Remove every embedding derived from the given chunk.
    async fn delete_by_chunk_id(&self, chunk_id: &str) -> Result<()>;

    /// Number of stored embeddings.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
