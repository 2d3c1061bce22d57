//! Mock Machine Translator for testing
//!
//! This module provides a deterministic, network-free translator for testing
//! the orchestrator and the document merger.
//!
//! # Example
//!
//! ```ignore
//! use xlf_mt::mt::{MachineTranslator, MockTranslator, MockMode};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockTranslator::new(MockMode::Suffix);
//!     let result = mock.translate("hola", "es", "fr").await.unwrap();
//!     assert_eq!(result, "hola_fr");
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::MachineTranslator;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append locale suffix: "hola" → "hola_fr"
    Suffix,

    /// Use predefined mappings: (text, target_locale) → translation.
    /// Unknown texts fall back to `Suffix`.
    Mappings(HashMap<(String, String), String>),

    /// Apply substring replacements in order, then optionally lowercase the
    /// whole reply, the way free endpoints tend to mangle marker casing
    Replace {
        pairs: Vec<(String, String)>,
        lowercase: bool,
    },

    /// Simulate API errors
    Error(String),

    /// No-op: return input unchanged
    NoOp,
}

/// Mock translator that simulates various translation scenarios
///
/// Every call is counted, including failing ones, so tests can assert that a
/// unit was never sent to a provider.
#[derive(Debug, Clone)]
pub struct MockTranslator {
    mode: MockMode,
    name: String,
    /// Optional simulated network delay (in milliseconds)
    delay_ms: u64,
    /// Number of leading calls that fail before `mode` takes over
    fail_first: usize,
    calls: Arc<AtomicUsize>,
}

impl MockTranslator {
    /// Create a new MockTranslator with the given mode
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            name: "Mock Translator".to_string(),
            delay_ms: 0,
            fail_first: 0,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a MockTranslator with simulated network delay
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self {
            delay_ms,
            ..Self::new(mode)
        }
    }

    /// Rename the mock, to tell several mocks apart in fallback tests
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Fail the first `n` calls with a network error
    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    /// Number of calls made so far (shared between clones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Handle to the shared call counter, usable after the mock is boxed
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    async fn apply_delay(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    fn apply_translation(&self, text: &str, _source: &str, target: &str) -> MtResult<String> {
        match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, target)),
            MockMode::Mappings(map) => {
                let key = (text.to_string(), target.to_string());
                Ok(map
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| format!("{}_{}", text, target)))
            }
            MockMode::Replace { pairs, lowercase } => {
                let mut out = text.to_string();
                for (from, to) in pairs {
                    out = out.replace(from.as_str(), to);
                }
                if *lowercase {
                    out = out.to_lowercase();
                }
                Ok(out)
            }
            MockMode::Error(msg) => Err(MtError::TranslationError(msg.clone())),
            MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

#[async_trait]
impl MachineTranslator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.apply_delay().await;

        if call < self.fail_first {
            return Err(MtError::NetworkError(format!(
                "simulated failure {} of {}",
                call + 1,
                self.fail_first
            )));
        }
        self.apply_translation(text, source_locale, target_locale)
    }

    fn provider_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_suffix_single_translation() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let result = mock.translate("hola", "es", "fr").await.unwrap();
        assert_eq!(result, "hola_fr");
    }

    #[tokio::test]
    async fn test_mapping_and_fallback() {
        let mut map = HashMap::new();
        map.insert(("hola".to_string(), "fr".to_string()), "bonjour".to_string());
        let mock = MockTranslator::new(MockMode::Mappings(map));
        assert_eq!(mock.translate("hola", "es", "fr").await.unwrap(), "bonjour");
        assert_eq!(
            mock.translate("adiós", "es", "fr").await.unwrap(),
            "adiós_fr"
        );
    }

    #[tokio::test]
    async fn test_replace_with_lowercase() {
        let mock = MockTranslator::new(MockMode::Replace {
            pairs: vec![("Hola".to_string(), "Hello".to_string())],
            lowercase: true,
        });
        let result = mock.translate("Hola __PH0_AB__", "es", "en").await.unwrap();
        assert_eq!(result, "hello __ph0_ab__");
    }

    #[tokio::test]
    async fn test_error_mode_returns_error() {
        let mock = MockTranslator::new(MockMode::Error("API unavailable".to_string()));
        match mock.translate("hola", "es", "fr").await {
            Err(MtError::TranslationError(msg)) => assert_eq!(msg, "API unavailable"),
            other => panic!("Expected TranslationError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_noop_returns_unchanged() {
        let mock = MockTranslator::new(MockMode::NoOp);
        assert_eq!(mock.translate("Hola", "es", "fr").await.unwrap(), "Hola");
    }

    #[tokio::test]
    async fn test_failing_first_then_succeeds() {
        let mock = MockTranslator::new(MockMode::Suffix).failing_first(2);
        assert!(mock.translate("hola", "es", "fr").await.is_err());
        assert!(mock.translate("hola", "es", "fr").await.is_err());
        assert_eq!(mock.translate("hola", "es", "fr").await.unwrap(), "hola_fr");
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_call_counter_shared_between_clones() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let counter = mock.call_counter();
        let boxed: Box<dyn MachineTranslator> = Box::new(mock.clone());
        boxed.translate("hola", "es", "fr").await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_delay_adds_latency() {
        let mock = MockTranslator::with_delay(MockMode::Suffix, 50);
        let start = std::time::Instant::now();
        let _ = mock.translate("hola", "es", "fr").await.unwrap();
        assert!(start.elapsed().as_millis() >= 50);
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(
            MockTranslator::new(MockMode::Suffix).provider_name(),
            "Mock Translator"
        );
        assert_eq!(
            MockTranslator::new(MockMode::Suffix).named("A").provider_name(),
            "A"
        );
    }
}
