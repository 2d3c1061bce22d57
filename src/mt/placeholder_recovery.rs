//! Placeholder Recovery for translated text
//!
//! Puts the protected substrings back in place of their anchor tokens once a
//! provider has answered. Free endpoints are not gentle with tokens:
//!
//! ```text
//! Sent:       Hola __PH0_9F3A61C2__mundo
//! Received:   hello __ph0_9f3a61c2__world
//! Recovered:  Hello <x id="A" ctype="x-span"/>world
//! ```
//!
//! The recovery process, per token (last allocated first, so a token nested
//! inside a larger protected group is resolved after the group itself):
//! 1. exact-case replacement of every occurrence
//! 2. otherwise the first case-insensitive occurrence
//! 3. otherwise the first loose match (trimmed underscores, inserted spaces)
//!
//! A missing token never stops the remaining ones from being restored.
//! Afterwards lowercased protected literals in free text get their casing
//! back and the first visible character is uppercased. Markup and ICU groups
//! are never recased, so running the recovery twice changes nothing.

use tracing::debug;

use crate::mt::anchor::AnchorToken;
use crate::mt::protection::{CodecOptions, ProtectedSpan, markup_ranges};

/// Restore a translated span using the mapping from its protection call
pub fn restore(text: &str, protected: &ProtectedSpan, options: &CodecOptions) -> String {
    restore_tokens(text, &protected.mapping, &protected.nonce, options)
}

/// Restore `text` from an explicit token list
pub fn restore_tokens(
    text: &str,
    mapping: &[AnchorToken],
    nonce: &str,
    options: &CodecOptions,
) -> String {
    let mut result = text.to_string();

    // Literal casing is repaired before tokens are expanded so that restored
    // markup (attribute values, class names) is never rewritten.
    for literal in options.protected_literals.iter().filter(|l| !l.is_empty()) {
        result = fix_literal_casing(&result, literal);
    }

    for anchor in mapping.iter().rev() {
        if !restore_anchor(&mut result, anchor, nonce, options.case_insensitive_restore) {
            debug!("Anchor {} not found in translation", anchor.token);
        }
    }

    if options.capitalize_first {
        result = capitalize_first(&result);
    }
    result
}

fn restore_anchor(
    result: &mut String,
    anchor: &AnchorToken,
    nonce: &str,
    case_insensitive: bool,
) -> bool {
    if result.contains(&anchor.token) {
        *result = result.replace(&anchor.token, &anchor.original);
        return true;
    }
    if !case_insensitive {
        return false;
    }

    if let Some(pos) = find_ascii_ignore_case(result, &anchor.token) {
        result.replace_range(pos..pos + anchor.token.len(), &anchor.original);
        return true;
    }

    if let Some(re) = anchor.loose_pattern(nonce) {
        if let Some(m) = re.find(result) {
            let range = m.range();
            result.replace_range(range, &anchor.original);
            return true;
        }
    }
    false
}

/// Byte offset of the first ASCII-case-insensitive occurrence of `needle`
///
/// `needle` must be ASCII, which guarantees the match lies on char boundaries.
fn find_ascii_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

/// Replace all-lowercase occurrences of `literal` outside markup with its canonical form
pub fn fix_literal_casing(text: &str, literal: &str) -> String {
    let lower = literal.to_lowercase();
    if lower == literal || !text.contains(&lower) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for range in markup_ranges(text) {
        if range.end <= cursor {
            continue;
        }
        let start = range.start.max(cursor);
        out.push_str(&text[cursor..start].replace(&lower, literal));
        out.push_str(&text[start..range.end]);
        cursor = range.end;
    }
    out.push_str(&text[cursor..].replace(&lower, literal));
    out
}

/// Uppercase the first non-whitespace character if it is lowercase
pub fn capitalize_first(text: &str) -> String {
    let Some((idx, first)) = text.char_indices().find(|(_, c)| !c.is_whitespace()) else {
        return text.to_string();
    };
    if !first.is_lowercase() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 2);
    out.push_str(&text[..idx]);
    out.extend(first.to_uppercase());
    out.push_str(&text[idx + first.len_utf8()..]);
    out
}
