//! Language-aware token estimation.
//!
//! A deterministic heuristic, not a model tokenizer. The chunker uses the
//! same function to decide when to close a chunk, so the estimate must be
//! symmetric between indexing and budgeting, and appending text must never
//! lower the estimate.

/// Rough token estimate for `text`.
///
/// Latin text counts one token per word plus one per ASCII punctuation
/// mark. When CJK characters are present, each weighs a third of a token
/// and the remaining characters 0.6, floored by the word/punctuation
/// estimate of the non-CJK portion; pure CJK text therefore lands at one
/// token per three characters. The floor keeps the estimate monotone under
/// concatenation: `estimate_tokens(a + b) >= estimate_tokens(a)` for any
/// non-empty `a` and `b`.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let total_chars = text.chars().count();
    let cjk_chars = text.chars().filter(|c| is_cjk(*c)).count();
    if cjk_chars == 0 {
        return latin_estimate(text);
    }

    let other_chars = (total_chars - cjk_chars) as f32;
    let char_weighted = (cjk_chars as f32 / 3.0 + other_chars * 0.6).ceil() as usize;
    let stripped: String = text
        .chars()
        .map(|c| if is_cjk(c) { ' ' } else { c })
        .collect();
    char_weighted.max(latin_estimate(&stripped))
}

fn latin_estimate(text: &str) -> usize {
    let words = text.split_whitespace().count();
    let punctuation = text.chars().filter(char::is_ascii_punctuation).count();
    (words + punctuation).max(1)
}

/// CJK ideographs, kana and hangul.
pub fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF      // CJK unified ideographs
        | 0x3400..=0x4DBF    // CJK extension A
        | 0xF900..=0xFAFF    // CJK compatibility ideographs
        | 0x3040..=0x309F    // hiragana
        | 0x30A0..=0x30FF    // katakana
        | 0xAC00..=0xD7AF    // hangul syllables
        | 0x3000..=0x303F    // CJK punctuation
    )
}
