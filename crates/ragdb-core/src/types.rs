//! Domain types shared by the chunking, embedding and retrieval engines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type ChunkId = String;
pub type Meta = HashMap<String, String>;

/// A bounded fragment of a source document that is independently indexed.
///
/// - `id`: globally unique chunk identifier (`doc_id:chunk_index`)
/// - `doc_id`: stable document identity (external id)
/// - `chunk_index`: position within the parent document
/// - `content`: the text payload of the chunk
/// - `token_count`: heuristic token estimate of `content`
/// - `start`/`end`: character offsets of the chunk's source span in the
///   original document; overlap suffixes are not counted
/// - `metadata`: open key/value map (document title, page, structure tags)
///
/// Immutable once produced by the chunker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub doc_id: String,
    pub chunk_index: usize,
    pub content: String,
    pub token_count: usize,
    pub start: usize,
    pub end: usize,
    pub metadata: Meta,
    pub created_at: DateTime<Utc>,
}

/// A vector produced by an embedding provider for one piece of text.
///
/// `chunk_id` is a back-reference, not ownership: the vector store owns the
/// persisted copy, the cache holds chunk-agnostic copies keyed by content.
/// Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub id: String,
    pub chunk_id: ChunkId,
    pub vector: Vec<f32>,
    pub model: String,
    pub tokens_used: usize,
    pub created_at: DateTime<Utc>,
}

impl Embedding {
    /// Bind a chunk-agnostic embedding (e.g. a cache entry) to a chunk.
    /// The bound copy takes the chunk id as its storage id so repeated
    /// indexing of the same chunk upserts a single record.
    #[must_use]
    pub fn bound_to(&self, chunk_id: &str) -> Embedding {
        Embedding {
            id: chunk_id.to_string(),
            chunk_id: chunk_id.to_string(),
            vector: self.vector.clone(),
            model: self.model.clone(),
            tokens_used: self.tokens_used,
            created_at: self.created_at,
        }
    }
}

/// Which retrieval arm produced (or fused) a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMethod {
    Vector,
    Bm25,
    Hybrid,
}

impl std::str::FromStr for RetrievalMethod {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vector" => Ok(RetrievalMethod::Vector),
            "bm25" => Ok(RetrievalMethod::Bm25),
            "hybrid" => Ok(RetrievalMethod::Hybrid),
            other => Err(crate::Error::UnsupportedStrategy(other.to_string())),
        }
    }
}

impl std::fmt::Display for RetrievalMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrievalMethod::Vector => write!(f, "vector"),
            RetrievalMethod::Bm25 => write!(f, "bm25"),
            RetrievalMethod::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// One scored hit, ephemeral per query.
///
/// `score` is method-specific until fused; higher is always better.
/// `rank` is a dense 1-based sequence assigned after the final sort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk_id: ChunkId,
    pub content: String,
    pub score: f32,
    pub metadata: Meta,
    pub method: RetrievalMethod,
    pub rank: usize,
}

/// A user-facing pointer back to the evidence behind an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub id: String,
    pub source_name: String,
    pub page: Option<u32>,
    pub excerpt: String,
    pub relevance: f32,
}

/// Terminal artifact of one orchestrated retrieval call, handed to the
/// external completion caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedPrompt {
    pub original_query: String,
    pub results: Vec<SearchResult>,
    pub prompt: String,
    pub citations: Vec<Citation>,
    pub quality_score: f32,
    pub method: RetrievalMethod,
    pub tokens_used: usize,
    pub created_at: DateTime<Utc>,
}

/// Assign dense 1-based ranks in place, in current order.
pub fn assign_ranks(results: &mut [SearchResult]) {
    for (i, r) in results.iter_mut().enumerate() {
        r.rank = i + 1;
    }
}
