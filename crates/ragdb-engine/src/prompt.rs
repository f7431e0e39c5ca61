//! Prompt synthesis and citation assembly.

use ragdb_core::config::RagConfig;
use ragdb_core::tokens::estimate_tokens;
use ragdb_core::types::{Citation, SearchResult};

/// Longest excerpt carried into a citation, in characters.
const EXCERPT_CHARS: usize = 200;

/// One citation per surviving result. `title` and `page` come from chunk
/// metadata when the parser provided them; the chunk id is the fallback
/// source name.
pub fn citation_for(result: &SearchResult) -> Citation {
    let source_name = result
        .metadata
        .get("title")
        .cloned()
        .unwrap_or_else(|| result.chunk_id.clone());
    let page = result.metadata.get("page").and_then(|p| p.parse().ok());
    Citation {
        id: result.chunk_id.clone(),
        source_name,
        page,
        excerpt: result.content.chars().take(EXCERPT_CHARS).collect(),
        relevance: result.score,
    }
}

/// Interpolate the configured template. The evidence block lists surviving
/// results in rank order, numbered so citations can be traced, and stops
/// at the `max_context_length` token budget. With no survivors the
/// evidence block is simply empty.
pub fn render(config: &RagConfig, query: &str, results: &[SearchResult]) -> String {
    let mut context = String::new();
    let mut budget = 0usize;
    for result in results {
        let entry = format!("[{}] {}", result.rank, result.content);
        let cost = estimate_tokens(&entry);
        if budget + cost > config.max_context_length && budget > 0 {
            tracing::debug!(rank = result.rank, "context budget reached, truncating evidence");
            break;
        }
        if !context.is_empty() {
            context.push_str("\n\n");
        }
        context.push_str(&entry);
        budget += cost;
    }

    config
        .prompt_template
        .replace("{context}", &context)
        .replace("{query}", query)
}
