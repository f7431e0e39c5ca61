//! Structure-aware tagging pass.
//!
//! Purely additive metadata; chunk boundaries are never changed here.

use ragdb_core::types::Chunk;

/// Tag a chunk with lightweight markdown structure hints.
pub fn tag(chunk: &mut Chunk) {
    if chunk.content.trim_start().starts_with('#') {
        chunk.metadata.insert("is_title".to_string(), "true".to_string());
    }
    if chunk.content.contains("```") {
        chunk.metadata.insert("is_code".to_string(), "true".to_string());
    }
    if chunk.content.contains('|') {
        chunk.metadata.insert("is_table".to_string(), "true".to_string());
    }
}
