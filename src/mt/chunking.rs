//! Splitting of over-long spans
//!
//! Free endpoints reject or truncate long queries. A span over the length
//! limit is cut, coarsest boundary first:
//!
//! 1. after sentence punctuation followed by whitespace
//! 2. pieces still too long: after clause punctuation followed by whitespace
//! 3. pieces still too long: fixed-size windows whose cut point floats back
//!    to the last whitespace within an overlap zone
//!
//! Pieces are trimmed and are meant to be rejoined with a single space.
//! Anchor tokens contain neither whitespace nor punctuation, so the first two
//! passes never cut one; the window pass is given the token pattern and moves
//! any cut that would land inside a token to the token's start.

use std::ops::Range;

use regex::Regex;

const SENTENCE_ENDS: &[char] = &['.', '!', '?', '…', '。', '！', '？'];
const CLAUSE_ENDS: &[char] = &[',', ';', ':', '，', '；'];

/// Split `text` into pieces of at most `max_chars` characters
pub fn split_for_translation(
    text: &str,
    max_chars: usize,
    overlap: usize,
    tokens: Option<&Regex>,
) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut pieces = Vec::new();
    for sentence in split_after(text, SENTENCE_ENDS) {
        if char_len(&sentence) <= max_chars {
            pieces.push(sentence);
            continue;
        }
        for clause in split_after(&sentence, CLAUSE_ENDS) {
            if char_len(&clause) <= max_chars {
                pieces.push(clause);
            } else {
                pieces.extend(split_windows(&clause, max_chars, overlap, tokens));
            }
        }
    }
    pieces
}

/// Split after any of `ends` when followed by whitespace
pub fn split_after(text: &str, ends: &[char]) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if !ends.contains(&c) {
            continue;
        }
        if let Some(&(next_i, next_c)) = chars.peek() {
            if next_c.is_whitespace() {
                push_trimmed(&mut pieces, &text[start..next_i]);
                start = next_i;
            }
        }
    }
    push_trimmed(&mut pieces, &text[start..]);
    pieces
}

/// Cut `text` into windows of at most `max_chars` characters
///
/// Each cut is moved back to the last whitespace found within the final
/// `overlap` characters of the window; failing that, the window is cut hard.
/// A cut falling inside a token match is moved to the start of that token.
pub fn split_windows(
    text: &str,
    max_chars: usize,
    overlap: usize,
    tokens: Option<&Regex>,
) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let protected: Vec<Range<usize>> = tokens
        .map(|re| re.find_iter(text).map(|m| m.range()).collect())
        .unwrap_or_default();

    let mut pieces = Vec::new();
    let mut start = 0;
    while char_len(&text[start..]) > max_chars {
        let rest = &text[start..];
        let hard = byte_offset(rest, max_chars);
        let floor = byte_offset(rest, max_chars.saturating_sub(overlap));

        let mut cut = rest[..hard]
            .rfind(char::is_whitespace)
            .filter(|&i| i >= floor && i > 0)
            .unwrap_or(hard)
            + start;

        if let Some(token) = protected.iter().find(|r| r.start < cut && cut < r.end) {
            cut = if token.start > start {
                token.start
            } else {
                token.end
            };
        }

        push_trimmed(&mut pieces, &text[start..cut]);
        start = cut;
    }
    push_trimmed(&mut pieces, &text[start..]);
    pieces
}

fn push_trimmed(pieces: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        pieces.push(piece.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset of the `n`th character, or the end of `text`
fn byte_offset(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map(|(i, _)| i).unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::anchor::token_pattern_for;

    #[test]
    fn test_split_sentences() {
        let pieces = split_after("Hola. ¿Qué tal?  Bien!", SENTENCE_ENDS);
        assert_eq!(pieces, vec!["Hola.", "¿Qué tal?", "Bien!"]);
    }

    #[test]
    fn test_decimal_point_not_a_boundary() {
        let pieces = split_after("Sube un 2.5 por ciento. Fin", SENTENCE_ENDS);
        assert_eq!(pieces, vec!["Sube un 2.5 por ciento.", "Fin"]);
    }

    #[test]
    fn test_short_text_single_piece() {
        assert_eq!(
            split_for_translation("Hola mundo", 2000, 100, None),
            vec!["Hola mundo"]
        );
    }

    #[test]
    fn test_clause_fallback() {
        let text = "uno uno uno, dos dos dos; tres tres tres.";
        let pieces = split_for_translation(text, 15, 5, None);
        assert_eq!(pieces, vec!["uno uno uno,", "dos dos dos;", "tres tres tres."]);
    }

    #[test]
    fn test_windows_respect_limit_and_lose_nothing() {
        let text = "palabra ".repeat(100);
        let pieces = split_for_translation(&text, 50, 10, None);
        assert!(pieces.iter().all(|p| p.chars().count() <= 50));
        assert_eq!(pieces.join(" "), text.trim());
    }

    #[test]
    fn test_windows_never_cut_tokens() {
        let token = "__PH0_AB12CD34__";
        let text = format!("{}{}{}", "x".repeat(45), token, "y".repeat(45));
        let re = token_pattern_for("AB12CD34");
        let pieces = split_windows(&text, 50, 10, Some(&re));
        assert_eq!(pieces.iter().filter(|p| p.contains(token)).count(), 1);
        assert_eq!(pieces.concat(), text);
    }

    #[test]
    fn test_hard_cut_without_whitespace() {
        let text = "a".repeat(25);
        let pieces = split_windows(&text, 10, 3, None);
        assert_eq!(pieces, vec!["a".repeat(10), "a".repeat(10), "a".repeat(5)]);
    }
}
