//! In-memory translation cache
//!
//! Lives as long as one orchestrator and is never written to disk.

use std::collections::HashMap;

/// Cache key: language pair plus the trimmed source text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source_lang: String,
    pub target_lang: String,
    pub text: String,
}

impl CacheKey {
    pub fn new(source_lang: &str, target_lang: &str, text: &str) -> Self {
        CacheKey {
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            text: text.trim().to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct TranslationCache {
    entries: HashMap<CacheKey, String>,
    hits: usize,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<String> {
        let hit = self.entries.get(key).cloned();
        if hit.is_some() {
            self.hits += 1;
        }
        hit
    }

    pub fn insert(&mut self, key: CacheKey, translation: String) {
        self.entries.insert(key, translation);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lookups answered from the cache
    pub fn hits(&self) -> usize {
        self.hits
    }
}
