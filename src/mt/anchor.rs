//! Anchor Token System for protecting non-translatable content during machine translation
//!
//! Anchor tokens are opaque strings that replace inline tags, ICU expressions and
//! protected literals before text is sent to a provider. Each token carries the
//! substring it stands for, so restoration needs nothing but the token list.
//!
//! Format: `__PH{index}_{nonce}__`, e.g. `__PH0_9F3A61C2__`.
//!
//! The nonce is drawn once per protected span, so tokens from two different
//! spans never match each other, and a natural-language reply is very unlikely
//! to contain one by accident. The index keeps tokens unique within a span.

use regex::Regex;

/// Number of hex characters taken from a fresh UUID for the nonce
const NONCE_LEN: usize = 8;

/// An anchor token stands in for one protected substring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorToken {
    /// Position of this token in the mapping (0-indexed)
    pub index: usize,
    /// The opaque marker string sent to the translator
    pub token: String,
    /// The protected substring the marker replaces
    pub original: String,
}

impl AnchorToken {
    /// Pattern matching this token after mild damage: lost or doubled
    /// underscores, whitespace inserted around the separators, any casing.
    pub fn loose_pattern(&self, nonce: &str) -> Option<Regex> {
        Regex::new(&format!(
            r"(?i)(?:_+\s?)?PH\s*{}\s*_\s*{}(?:\s?_+)?",
            self.index,
            regex::escape(nonce)
        ))
        .ok()
    }
}

/// Hands out anchor tokens that are unique within one protection call
#[derive(Debug, Clone)]
pub struct AnchorFactory {
    nonce: String,
    next_index: usize,
}

impl AnchorFactory {
    /// Create a factory with a freshly generated nonce
    pub fn new() -> Self {
        let nonce = uuid::Uuid::new_v4().simple().to_string()[..NONCE_LEN].to_uppercase();
        Self::with_nonce(nonce)
    }

    /// Create a factory with a fixed nonce (deterministic tests)
    pub fn with_nonce(nonce: impl Into<String>) -> Self {
        AnchorFactory {
            nonce: nonce.into(),
            next_index: 0,
        }
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Allocate the next token for `original`
    pub fn next_token(&mut self, original: &str) -> AnchorToken {
        let index = self.next_index;
        self.next_index += 1;
        AnchorToken {
            index,
            token: format!("__PH{}_{}__", index, self.nonce),
            original: original.to_string(),
        }
    }

    /// Pattern matching any intact token produced by this factory
    pub fn token_pattern(&self) -> Regex {
        token_pattern_for(&self.nonce)
    }
}

impl Default for AnchorFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Pattern matching any intact token carrying `nonce`, in any casing
pub fn token_pattern_for(nonce: &str) -> Regex {
    Regex::new(&format!(r"(?i)__PH\d+_{}__", regex::escape(nonce))).expect("token regex")
}
