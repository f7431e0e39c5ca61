//! Low-level text splitting: paragraphs, sentences, fixed windows.
//!
//! Every unit carries the character offset of its first character in the
//! input, so chunk positions can point back into the source document.

/// Sentence terminators, CJK and Latin. A newline also closes a sentence.
const TERMINATORS: [char; 7] = ['。', '！', '？', '.', '!', '?', '\n'];

/// Split on blank-line boundaries, trim, drop empties.
pub fn paragraphs(text: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut char_pos = 0usize;
    for part in text.split("\n\n") {
        let trimmed = part.trim();
        if !trimmed.is_empty() {
            let lead = part.chars().take_while(|c| c.is_whitespace()).count();
            out.push((char_pos + lead, trimmed.to_string()));
        }
        // account for the part and the two-char separator
        char_pos += part.chars().count() + 2;
    }
    out
}

/// Split on the fixed terminator set; each terminator closes a sentence and
/// stays attached to it. Trailing text without a terminator is its own
/// sentence.
pub fn sentences(text: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut start = 0usize;
    for (i, c) in text.chars().enumerate() {
        if current.is_empty() {
            start = i;
        }
        current.push(c);
        if TERMINATORS.contains(&c) {
            push_trimmed(&mut out, start, &current);
            current.clear();
        }
    }
    push_trimmed(&mut out, start, &current);
    out
}

fn push_trimmed(out: &mut Vec<(usize, String)>, start: usize, raw: &str) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    let lead = raw.chars().take_while(|c| c.is_whitespace()).count();
    out.push((start + lead, trimmed.to_string()));
}

/// Fixed-size character windows, independent of semantics.
pub fn fixed_windows(text: &str, window: usize) -> Vec<(usize, String)> {
    if window == 0 {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(window)
        .enumerate()
        .map(|(i, w)| (i * window, w.iter().collect::<String>()))
        .filter(|(_, s)| !s.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(parts: &[(usize, String)]) -> Vec<&str> {
        parts.iter().map(|(_, s)| s.as_str()).collect()
    }

    #[test]
    fn paragraphs_drop_empties() {
        let parts = paragraphs("a\n\n\n\nb\n\n   \n\nc");
        assert_eq!(texts(&parts), vec!["a", "b", "c"]);
        assert_eq!(parts[0].0, 0);
        assert_eq!(parts[1].0, 5);
        assert_eq!(parts[2].0, 13);
    }

    #[test]
    fn paragraph_offsets_skip_leading_whitespace() {
        let parts = paragraphs("  padded\n\nnext");
        assert_eq!(parts[0], (2, "padded".to_string()));
        assert_eq!(parts[1], (10, "next".to_string()));
    }

    #[test]
    fn sentences_split_on_latin_and_cjk_terminators() {
        let parts = sentences("First. Second! 第三句。Fourth?");
        assert_eq!(
            parts,
            vec![
                (0, "First.".to_string()),
                (7, "Second!".to_string()),
                (15, "第三句。".to_string()),
                (19, "Fourth?".to_string()),
            ]
        );
    }

    #[test]
    fn sentences_keep_unterminated_tail() {
        let parts = sentences("Done. trailing words");
        assert_eq!(texts(&parts), vec!["Done.", "trailing words"]);
        assert_eq!(parts[1].0, 6);
    }

    #[test]
    fn fixed_windows_cover_all_characters() {
        let parts = fixed_windows("abcdefghij", 4);
        assert_eq!(
            parts,
            vec![
                (0, "abcd".to_string()),
                (4, "efgh".to_string()),
                (8, "ij".to_string()),
            ]
        );
    }
}
