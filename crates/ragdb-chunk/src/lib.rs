//! ragdb-chunk
//!
//! Splits raw text into bounded, possibly overlapping chunks using a
//! selectable strategy. Token budgets use the same heuristic estimator
//! the rest of the system uses (`ragdb_core::tokens`), so a chunk that
//! fits here fits downstream too.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod splitter;
pub mod structure;

use chrono::Utc;
use ragdb_core::tokens::estimate_tokens;
use ragdb_core::types::{Chunk, Meta};
use serde::{Deserialize, Serialize};

/// Closed set of chunking strategies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    /// One chunk per blank-line-separated paragraph.
    Paragraph,
    /// Sentences greedily merged up to the token budget.
    Sentence,
    /// Fixed-size character windows, semantics-blind.
    Fixed,
    /// Paragraphs, with oversized paragraphs re-split by sentence.
    Hybrid,
}

impl std::str::FromStr for ChunkStrategy {
    type Err = ragdb_core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paragraph" => Ok(ChunkStrategy::Paragraph),
            "sentence" => Ok(ChunkStrategy::Sentence),
            "fixed" => Ok(ChunkStrategy::Fixed),
            "hybrid" => Ok(ChunkStrategy::Hybrid),
            other => Err(ragdb_core::Error::UnsupportedStrategy(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub strategy: ChunkStrategy,
    /// Token budget per chunk.
    pub chunk_size: usize,
    /// Characters of the next chunk appended to each chunk for continuity.
    pub chunk_overlap: usize,
    /// Window width in characters for the fixed strategy.
    pub fixed_window: usize,
    /// Tag chunks with `is_title` / `is_code` / `is_table` metadata.
    pub tag_structure: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::Hybrid,
            chunk_size: 500,
            chunk_overlap: 0,
            fixed_window: 1000,
            tag_structure: true,
        }
    }
}

pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Chunk loose text with no document linkage. Empty input yields an
    /// empty vec, never an error.
    pub fn chunk_text(&self, text: &str) -> Vec<Chunk> {
        self.chunk_document("adhoc", None, text, Meta::new())
    }

    /// Chunk a document, merging its identity and title into each chunk's
    /// metadata.
    pub fn chunk_document(
        &self,
        doc_id: &str,
        title: Option<&str>,
        content: &str,
        metadata: Meta,
    ) -> Vec<Chunk> {
        let pieces = self.split(content);
        if pieces.is_empty() {
            return Vec::new();
        }

        let mut contents = pieces;
        if self.config.chunk_overlap > 0 {
            apply_overlap(&mut contents, self.config.chunk_overlap);
        }

        let mut base_meta = metadata;
        if let Some(title) = title {
            base_meta.insert("title".to_string(), title.to_string());
        }

        let now = Utc::now();
        let mut chunks = Vec::with_capacity(contents.len());
        for (chunk_index, piece) in contents.into_iter().enumerate() {
            let mut chunk = Chunk {
                id: format!("{doc_id}:{chunk_index}"),
                doc_id: doc_id.to_string(),
                chunk_index,
                token_count: estimate_tokens(&piece.content),
                start: piece.start,
                end: piece.end,
                content: piece.content,
                metadata: base_meta.clone(),
                created_at: now,
            };
            if self.config.tag_structure {
                structure::tag(&mut chunk);
            }
            chunks.push(chunk);
        }
        tracing::debug!(doc_id, chunks = chunks.len(), "chunked document");
        chunks
    }

    /// Split `content` into chunk payloads per the configured strategy.
    fn split(&self, content: &str) -> Vec<Piece> {
        match self.config.strategy {
            ChunkStrategy::Paragraph => splitter::paragraphs(content)
                .into_iter()
                .map(|(at, p)| Piece::new(at, p))
                .collect(),
            ChunkStrategy::Sentence => {
                merge_units(splitter::sentences(content), self.config.chunk_size)
            }
            ChunkStrategy::Fixed => splitter::fixed_windows(content, self.config.fixed_window)
                .into_iter()
                .map(|(at, w)| Piece::new(at, w))
                .collect(),
            ChunkStrategy::Hybrid => {
                let mut out = Vec::new();
                for (at, paragraph) in splitter::paragraphs(content) {
                    if estimate_tokens(&paragraph) <= self.config.chunk_size {
                        out.push(Piece::new(at, paragraph));
                    } else {
                        let units = splitter::sentences(&paragraph)
                            .into_iter()
                            .map(|(s, t)| (at + s, t))
                            .collect();
                        out.extend(merge_units(units, self.config.chunk_size));
                    }
                }
                out
            }
        }
    }
}

/// A chunk payload before metadata assembly. `start`/`end` are character
/// offsets of the source span the payload was drawn from; overlap suffixes
/// do not move them.
struct Piece {
    content: String,
    start: usize,
    end: usize,
}

impl Piece {
    fn new(start: usize, content: String) -> Self {
        let end = start + content.chars().count();
        Self { content, start, end }
    }
}

/// Greedily concatenate units (joined by newline) until the next unit would
/// push the chunk past the token budget. A merged piece spans from the first
/// unit's start to the last unit's end in the source.
fn merge_units(units: Vec<(usize, String)>, chunk_size: usize) -> Vec<Piece> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_tokens = 0usize;
    let mut span = (0usize, 0usize);
    for (at, unit) in units {
        let unit_tokens = estimate_tokens(&unit);
        if !current.is_empty() && current_tokens + unit_tokens > chunk_size {
            out.push(Piece {
                content: std::mem::take(&mut current),
                start: span.0,
                end: span.1,
            });
            current_tokens = 0;
        }
        if current.is_empty() {
            span.0 = at;
        } else {
            current.push('\n');
        }
        current.push_str(&unit);
        span.1 = at + unit.chars().count();
        current_tokens += unit_tokens;
    }
    if !current.is_empty() {
        out.push(Piece { content: current, start: span.0, end: span.1 });
    }
    out
}

/// Append the head of each following chunk to its predecessor so that
/// consecutive chunks share context. The last chunk is left as-is.
fn apply_overlap(pieces: &mut [Piece], overlap: usize) {
    for i in 0..pieces.len().saturating_sub(1) {
        let suffix: String = pieces[i + 1].content.chars().take(overlap).collect();
        if !suffix.is_empty() {
            pieces[i].content.push('\n');
            pieces[i].content.push_str(&suffix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(strategy: ChunkStrategy) -> Chunker {
        Chunker::new(ChunkingConfig { strategy, ..ChunkingConfig::default() })
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(chunker(ChunkStrategy::Paragraph).chunk_text("").is_empty());
        assert!(chunker(ChunkStrategy::Hybrid).chunk_text("   \n\n  ").is_empty());
    }

    #[test]
    fn sentence_units_merge_under_budget() {
        let c = Chunker::new(ChunkingConfig {
            strategy: ChunkStrategy::Sentence,
            chunk_size: 500,
            ..ChunkingConfig::default()
        });
        let chunks = c.chunk_text("One sentence. Another sentence. A third.");
        assert_eq!(chunks.len(), 1, "short sentences merge into one chunk");
    }

    #[test]
    fn overlap_appends_next_chunk_head() {
        let c = Chunker::new(ChunkingConfig {
            strategy: ChunkStrategy::Paragraph,
            chunk_overlap: 6,
            ..ChunkingConfig::default()
        });
        let chunks = c.chunk_text("first paragraph\n\nsecond paragraph");
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].content.ends_with("second"));
        assert_eq!(chunks[1].content, "second paragraph");
    }
}
