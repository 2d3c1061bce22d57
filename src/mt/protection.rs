//! Protection of non-translatable content before a span reaches a provider
//!
//! A span taken from an XLIFF `<source>` is raw XML: it may carry inline
//! placeholder elements (`<x id="INTERPOLATION"/>`), generic markup, Angular
//! ICU expressions and brand names. All of these are swapped for anchor tokens,
//! in this order:
//!
//! 1. self-closing elements with attributes
//! 2. any remaining opening/closing tags
//! 3. top-level brace groups that contain a nested group and an ICU keyword
//! 4. protected literals (brand names)
//!
//! Each match replaces the first occurrence of its text in the working string,
//! left to right, so repeated tags get distinct tokens.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::mt::anchor::{AnchorFactory, AnchorToken, token_pattern_for};

static SELF_CLOSING_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<[A-Za-z][\w:.\-]*(?:\s+[\w:.\-]+\s*=\s*(?:"[^"]*"|'[^']*'))+\s*/>"#)
        .expect("self-closing tag regex")
});

static MARKUP_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"</?[A-Za-z][\w:.\-]*(?:\s+[\w:.\-]+(?:\s*=\s*(?:"[^"]*"|'[^']*'))?)*\s*/?>"#)
        .expect("markup tag regex")
});

static ICU_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:select|plural|VAR_[A-Z0-9_]+|INTERPOLATION(?:_\d+)?|true|false|other)\b|=\d")
        .expect("icu keyword regex")
});

/// Options for the placeholder codec
///
/// `case_insensitive_restore` and `capitalize_first` exist to repair habits of
/// the free endpoints (lowercased markers, lowercased sentence starts). They
/// are heuristics and can be turned off. Restore also recases all-lowercase
/// occurrences of each protected literal found in free text; other casings
/// (`VISENTURE`) are left as the provider wrote them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecOptions {
    /// Literal tokens that must never be translated
    pub protected_literals: Vec<String>,
    /// Fall back to case-insensitive and loose marker search on restore
    pub case_insensitive_restore: bool,
    /// Uppercase the first non-whitespace character after restore
    pub capitalize_first: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions {
            protected_literals: vec!["Visenture".to_string()],
            case_insensitive_restore: true,
            capitalize_first: true,
        }
    }
}

/// A span with its protected content replaced by anchor tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedSpan {
    /// Text to hand to the translator
    pub text: String,
    /// Tokens in allocation order
    pub mapping: Vec<AnchorToken>,
    /// Nonce shared by every token of this span
    pub nonce: String,
}

impl ProtectedSpan {
    /// Whether anything is left to translate once the tokens are removed
    pub fn is_translatable(&self) -> bool {
        let stripped = self.token_pattern().replace_all(&self.text, "");
        !stripped.trim().is_empty()
    }

    /// Pattern matching this span's tokens
    pub fn token_pattern(&self) -> Regex {
        token_pattern_for(&self.nonce)
    }
}

/// Protect `span` with a fresh nonce
pub fn protect(span: &str, options: &CodecOptions) -> ProtectedSpan {
    protect_with(span, options, AnchorFactory::new())
}

/// Protect `span` using the given factory
pub fn protect_with(span: &str, options: &CodecOptions, mut factory: AnchorFactory) -> ProtectedSpan {
    let mut text = span.to_string();
    let mut mapping = Vec::new();

    let self_closing: Vec<String> = SELF_CLOSING_TAG_RE
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .collect();
    for original in self_closing {
        replace_first(&mut text, &original, &mut factory, &mut mapping);
    }

    let tags: Vec<String> = MARKUP_TAG_RE
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .collect();
    for original in tags {
        replace_first(&mut text, &original, &mut factory, &mut mapping);
    }

    for original in find_icu_expressions(&text) {
        replace_first(&mut text, &original, &mut factory, &mut mapping);
    }

    for literal in options.protected_literals.iter().filter(|l| !l.is_empty()) {
        let occurrences = text.matches(literal.as_str()).count();
        for _ in 0..occurrences {
            replace_first(&mut text, literal, &mut factory, &mut mapping);
        }
    }

    ProtectedSpan {
        text,
        mapping,
        nonce: factory.nonce().to_string(),
    }
}

fn replace_first(
    text: &mut String,
    original: &str,
    factory: &mut AnchorFactory,
    mapping: &mut Vec<AnchorToken>,
) {
    if let Some(pos) = text.find(original) {
        let anchor = factory.next_token(original);
        text.replace_range(pos..pos + original.len(), &anchor.token);
        mapping.push(anchor);
    }
}

/// Find top-level `{...}` groups that look like ICU plural/select expressions
///
/// A group qualifies when it contains a nested brace group and its content
/// mentions one of the ICU keywords. Unbalanced braces are ignored.
pub fn find_icu_expressions(text: &str) -> Vec<String> {
    icu_expression_ranges(text)
        .into_iter()
        .map(|range| text[range].to_string())
        .collect()
}

fn icu_expression_ranges(text: &str) -> Vec<Range<usize>> {
    let mut found = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut nested = false;

    for (i, c) in text.char_indices() {
        match c {
            '{' => {
                if depth == 0 {
                    start = i;
                    nested = false;
                } else {
                    nested = true;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    let inner = &text[start + 1..i];
                    if nested && ICU_KEYWORD_RE.is_match(inner) {
                        found.push(start..i + 1);
                    }
                }
            }
            _ => {}
        }
    }
    found
}

/// Byte ranges of markup tags and ICU groups in `text`, sorted by start
///
/// Ranges may overlap when a tag sits inside an ICU group.
pub fn markup_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = MARKUP_TAG_RE.find_iter(text).map(|m| m.range()).collect();
    ranges.extend(icu_expression_ranges(text));
    ranges.sort_by_key(|r| r.start);
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(span: &str) -> ProtectedSpan {
        protect_with(span, &CodecOptions::default(), AnchorFactory::with_nonce("N0NCE"))
    }

    #[test]
    fn test_self_closing_placeholder() {
        let p = fixed(r#"Hola <x id="A" ctype="x-span"/>mundo"#);
        assert_eq!(p.text, "Hola __PH0_N0NCE__mundo");
        assert_eq!(p.mapping[0].original, r#"<x id="A" ctype="x-span"/>"#);
    }

    #[test]
    fn test_repeated_tags_get_distinct_tokens() {
        let p = fixed(r#"<x id="LINE_BREAK"/>uno<x id="LINE_BREAK"/>dos"#);
        assert_eq!(p.text, "__PH0_N0NCE__uno__PH1_N0NCE__dos");
        assert_eq!(p.mapping.len(), 2);
    }

    #[test]
    fn test_generic_markup_tags() {
        let p = fixed("Haz <b>clic</b> aquí<br/>");
        assert_eq!(p.text, "Haz __PH0_N0NCE__clic__PH1_N0NCE__ aquí__PH2_N0NCE__");
        let originals: Vec<&str> = p.mapping.iter().map(|a| a.original.as_str()).collect();
        assert_eq!(originals, vec!["<b>", "</b>", "<br/>"]);
    }

    #[test]
    fn test_equiv_text_with_entities_stays_inside_tag() {
        let span = r#"Potencia tu Trading con <x id="START_TAG_SPAN" ctype="x-span" equiv-text="&lt;span class=&quot;text-emerald-600&quot;&gt;"/>Visenture<x id="CLOSE_TAG_SPAN" ctype="x-span" equiv-text="&lt;/span&gt;"/>"#;
        let p = fixed(span);
        assert_eq!(
            p.text,
            "Potencia tu Trading con __PH0_N0NCE____PH2_N0NCE____PH1_N0NCE__"
        );
        assert_eq!(p.mapping[2].original, "Visenture");
    }

    #[test]
    fn test_icu_expression_protected() {
        let span = "{VAR_PLURAL, plural, =0 {ninguno} =1 {uno} other {muchos}} elementos";
        let p = fixed(span);
        assert_eq!(p.text, "__PH0_N0NCE__ elementos");
        assert!(p.is_translatable());
    }

    #[test]
    fn test_interpolation_without_keyword_is_left_alone() {
        let exprs = find_icu_expressions("Hola {{ nombre }}");
        assert!(exprs.is_empty());
        let exprs = find_icu_expressions("{flag, select, true {sí} false {no}}");
        assert_eq!(exprs, vec!["{flag, select, true {sí} false {no}}"]);
    }

    #[test]
    fn test_markup_ranges_cover_tags_and_icu() {
        let text = r#"a <b>x</b> {n, plural, =1 {<i>uno</i>} other {más}} z"#;
        let covered: Vec<&str> = markup_ranges(text).into_iter().map(|r| &text[r]).collect();
        assert_eq!(covered[0], "<b>");
        assert_eq!(covered[1], "</b>");
        assert_eq!(covered[2], "{n, plural, =1 {<i>uno</i>} other {más}}");
        assert_eq!(covered.len(), 5);
    }

    #[test]
    fn test_flat_braces_not_icu() {
        assert!(find_icu_expressions("{other}").is_empty());
        assert!(find_icu_expressions("{ unbalanced {other} ").is_empty());
    }

    #[test]
    fn test_brand_literal_every_occurrence() {
        let p = fixed("Visenture y Visenture");
        assert_eq!(p.text, "__PH0_N0NCE__ y __PH1_N0NCE__");
    }

    #[test]
    fn test_all_marker_span_is_not_translatable() {
        let p = fixed(r#"<x id="INTERPOLATION" equiv-text="{{ n }}"/> Visenture "#);
        assert!(!p.is_translatable());
    }

    #[test]
    fn test_plain_text_untouched() {
        let p = fixed("Guardar cambios");
        assert_eq!(p.text, "Guardar cambios");
        assert!(p.mapping.is_empty());
        assert!(p.is_translatable());
    }
}
