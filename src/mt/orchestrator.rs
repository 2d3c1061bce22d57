//! Translation Orchestrator
//!
//! Drives one text span through the whole pipeline:
//!
//! ```text
//! span ─► trim ─► cache? ─► throttle ─► protect ─┬─► providers (A → B → C, rotated per retry round) ─► restore
//!                                                └─► over length: split, each piece protected, translated
//!                                                    and restored on its own, joined, then restored
//!                                                    (a failed piece stays untranslated)
//! ```
//!
//! The orchestrator owns every piece of run-wide mutable state (request
//! counter, cache, failure list). Calls are awaited strictly one after
//! another, so a provider call blocks the pipeline until it answers or times
//! out.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::TranslatorConfig;
use crate::mt::cache::{CacheKey, TranslationCache};
use crate::mt::chunking::split_for_translation;
use crate::mt::error::{MtError, MtResult};
use crate::mt::google_translate::GoogleTranslateProvider;
use crate::mt::libretranslate::LibreTranslateProvider;
use crate::mt::mymemory::MyMemoryProvider;
use crate::mt::placeholder_recovery::{restore, restore_tokens};
use crate::mt::protection::{CodecOptions, ProtectedSpan, protect};
use crate::mt::translator::{MachineTranslator, ensure_translated};

/// A span no provider could translate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTranslation {
    pub source_lang: String,
    pub target_lang: String,
    /// Trimmed source text
    pub text: String,
    /// Last error reported by a provider
    pub reason: String,
}

pub struct Orchestrator {
    providers: Vec<Box<dyn MachineTranslator>>,
    cache: TranslationCache,
    request_count: usize,
    config: TranslatorConfig,
    failures: Vec<FailedTranslation>,
}

impl Orchestrator {
    /// Orchestrator over an explicit, ordered provider list
    pub fn new(config: TranslatorConfig, providers: Vec<Box<dyn MachineTranslator>>) -> Self {
        Orchestrator {
            providers,
            cache: TranslationCache::new(),
            request_count: 0,
            config,
            failures: Vec::new(),
        }
    }

    /// Orchestrator over the three free web endpoints, in priority order
    pub fn with_default_providers(config: TranslatorConfig) -> MtResult<Self> {
        let mut google = GoogleTranslateProvider::with_timeout(config.request_timeout)?;
        let mut mymemory = MyMemoryProvider::with_timeout(config.request_timeout)?;
        let mut libre = LibreTranslateProvider::with_timeout(config.post_timeout)?;
        if !config.courtesy_pause {
            google = google.with_courtesy_pause(Duration::ZERO);
            mymemory = mymemory.with_courtesy_pause(Duration::ZERO);
            libre = libre.with_courtesy_pause(Duration::ZERO);
        }
        let providers: Vec<Box<dyn MachineTranslator>> =
            vec![Box::new(google), Box::new(mymemory), Box::new(libre)];
        Ok(Self::new(config, providers))
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.provider_name()).collect()
    }

    /// Provider calls made since the last cooldown
    pub fn request_count(&self) -> usize {
        self.request_count
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn failures(&self) -> &[FailedTranslation] {
        &self.failures
    }

    /// Drain the recorded failures, e.g. between two target languages
    pub fn take_failures(&mut self) -> Vec<FailedTranslation> {
        std::mem::take(&mut self.failures)
    }

    /// Translate `span` from the configured source language
    pub async fn translate(&mut self, span: &str, target_lang: &str) -> String {
        let source_lang = self.config.source_lang.clone();
        self.translate_from(span, &source_lang, target_lang).await
    }

    /// Translate `span`, returning it unchanged when nothing could be done
    ///
    /// Leading and trailing whitespace of `span` is kept as is. The result is
    /// never the protected form: on failure the original span comes back and
    /// the failure is recorded.
    pub async fn translate_from(&mut self, span: &str, source_lang: &str, target_lang: &str) -> String {
        let core = span.trim();
        if core.chars().count() < 2 {
            return span.to_string();
        }

        let key = CacheKey::new(source_lang, target_lang, core);
        if let Some(hit) = self.cache.get(&key) {
            debug!("Cache hit for {:?}", core);
            return with_edges(span, &hit);
        }

        self.throttle().await;

        let protected = protect(core, &self.config.codec);
        if !protected.is_translatable() {
            debug!("Nothing translatable in {:?}", core);
            return span.to_string();
        }

        let result = if core.chars().count() > self.config.max_span_len {
            self.translate_chunked(&protected, source_lang, target_lang).await
        } else {
            self.translate_protected(&protected, source_lang, target_lang).await
        };

        match result {
            Ok(translated) => {
                self.cache.insert(key, translated.clone());
                with_edges(span, &translated)
            }
            Err(err) => {
                self.record_failure(core, source_lang, target_lang, &err);
                span.to_string()
            }
        }
    }

    fn record_failure(&mut self, text: &str, source_lang: &str, target_lang: &str, err: &MtError) {
        warn!("Could not translate {:?} to {}: {}", text, target_lang, err);
        self.failures.push(FailedTranslation {
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            text: text.to_string(),
            reason: err.to_string(),
        });
    }

    async fn translate_protected(
        &mut self,
        protected: &ProtectedSpan,
        source_lang: &str,
        target_lang: &str,
    ) -> MtResult<String> {
        let reply = self.run_providers(&protected.text, source_lang, target_lang).await?;
        Ok(restore(&reply, protected, &self.config.codec))
    }

    /// Translate an over-long span piece by piece
    ///
    /// Each piece is cached and fails on its own: a piece no provider could
    /// translate is kept as is and recorded, the others keep their
    /// translation.
    async fn translate_chunked(
        &mut self,
        protected: &ProtectedSpan,
        source_lang: &str,
        target_lang: &str,
    ) -> MtResult<String> {
        let token_re = protected.token_pattern();
        let pieces = split_for_translation(
            &protected.text,
            self.config.max_span_len,
            self.config.window_overlap,
            Some(&token_re),
        );
        info!("Span of {} chars split into {} pieces", protected.text.chars().count(), pieces.len());

        let mut translated = Vec::with_capacity(pieces.len());
        for piece in &pieces {
            let inner = protect(piece, &self.config.codec);
            let stripped = token_re.replace_all(&inner.text, "");
            if !inner.is_translatable() || stripped.trim().chars().count() < 2 {
                translated.push(piece.clone());
                continue;
            }

            let key = CacheKey::new(source_lang, target_lang, piece);
            if let Some(hit) = self.cache.get(&key) {
                translated.push(hit);
                continue;
            }

            self.throttle().await;
            match self.translate_protected(&inner, source_lang, target_lang).await {
                Ok(out) => {
                    self.cache.insert(key, out.clone());
                    translated.push(out);
                }
                Err(err) => {
                    let options = CodecOptions {
                        capitalize_first: false,
                        ..self.config.codec.clone()
                    };
                    let original = restore_tokens(piece, &protected.mapping, &protected.nonce, &options);
                    self.record_failure(original.trim(), source_lang, target_lang, &err);
                    translated.push(piece.clone());
                }
            }
        }

        Ok(restore(&translated.join(" "), protected, &self.config.codec))
    }

    /// Try every provider, then up to `max_retries` further rounds
    ///
    /// Round `r` starts at provider `r` (mod provider count) and is preceded
    /// by an exponential backoff sleep.
    async fn run_providers(&mut self, text: &str, source_lang: &str, target_lang: &str) -> MtResult<String> {
        let count = self.providers.len();
        if count == 0 {
            return Err(MtError::ConfigError("no translation providers configured".to_string()));
        }

        let mut last_error = MtError::TranslationError("no attempt made".to_string());
        for round in 0..=self.config.max_retries {
            if round > 0 {
                let delay = self.config.backoff_delay(round);
                info!("Retry round {} of {} after {:?}", round, self.config.max_retries, delay);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }

            for offset in 0..count {
                let index = (offset + round as usize) % count;
                self.request_count += 1;
                let provider = &self.providers[index];
                let outcome = provider
                    .translate(text, source_lang, target_lang)
                    .await
                    .and_then(|reply| ensure_translated(text, &reply));
                match outcome {
                    Ok(reply) => {
                        debug!("{} translated {:?}", provider.provider_name(), text);
                        return Ok(reply);
                    }
                    Err(err) => {
                        debug!("{} failed: {}", provider.provider_name(), err);
                        last_error = err;
                    }
                }
            }
        }
        Err(last_error)
    }

    /// Sleep out the cooldown once the request ceiling is reached
    async fn throttle(&mut self) {
        if self.request_count < self.config.max_requests_before_cooldown {
            return;
        }
        warn!(
            "{} requests made, pausing {:?} to respect rate limits",
            self.request_count, self.config.cooldown
        );
        if !self.config.cooldown.is_zero() {
            tokio::time::sleep(self.config.cooldown).await;
        }
        self.request_count = 0;
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("providers", &self.provider_names())
            .field("request_count", &self.request_count)
            .field("cached", &self.cache.len())
            .field("failures", &self.failures.len())
            .finish()
    }
}

/// Put the whitespace around `span` back around `translated`
fn with_edges(span: &str, translated: &str) -> String {
    let leading = &span[..span.len() - span.trim_start().len()];
    let trailing = &span[span.trim_end().len()..];
    format!("{}{}{}", leading, translated, trailing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::mock::{MockMode, MockTranslator};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quick_config() -> TranslatorConfig {
        TranslatorConfig::default().without_delays()
    }

    fn mapping(pairs: &[(&str, &str, &str)]) -> MockMode {
        let map: HashMap<(String, String), String> = pairs
            .iter()
            .map(|(text, lang, out)| ((text.to_string(), lang.to_string()), out.to_string()))
            .collect();
        MockMode::Mappings(map)
    }

    fn boxed(mock: MockTranslator) -> (Box<dyn MachineTranslator>, Arc<AtomicUsize>) {
        let counter = mock.call_counter();
        (Box::new(mock), counter)
    }

    #[test]
    fn test_with_edges() {
        assert_eq!(with_edges("  hola\n", "hello"), "  hello\n");
        assert_eq!(with_edges("hola", "hello"), "hello");
    }

    #[tokio::test]
    async fn test_short_span_returned_unchanged() {
        let (mock, calls) = boxed(MockTranslator::new(MockMode::Suffix));
        let mut orch = Orchestrator::new(quick_config(), vec![mock]);
        assert_eq!(orch.translate(" a ", "en").await, " a ");
        assert_eq!(orch.translate("   ", "en").await, "   ");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_answers_repeat_requests() {
        let (mock, calls) = boxed(MockTranslator::new(mapping(&[("Hola mundo", "en", "hello world")])));
        let mut orch = Orchestrator::new(quick_config(), vec![mock]);
        assert_eq!(orch.translate("Hola mundo", "en").await, "Hello world");
        assert_eq!(orch.translate("  Hola mundo ", "en").await, "  Hello world ");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(orch.cache().hits(), 1);
    }

    #[tokio::test]
    async fn test_all_marker_span_not_sent() {
        let (mock, calls) = boxed(MockTranslator::new(MockMode::Suffix));
        let mut orch = Orchestrator::new(quick_config(), vec![mock]);
        let span = r#"<x id="INTERPOLATION" equiv-text="{{ n }}"/> Visenture"#;
        assert_eq!(orch.translate(span, "en").await, span);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_next_provider() {
        let (a, a_calls) = boxed(MockTranslator::new(MockMode::Error("down".into())).named("A"));
        let (b, b_calls) = boxed(MockTranslator::new(MockMode::NoOp).named("B"));
        let (c, c_calls) = boxed(
            MockTranslator::new(mapping(&[("Guardar cambios", "fr", "enregistrer les modifications")])).named("C"),
        );
        let mut orch = Orchestrator::new(quick_config(), vec![a, b, c]);
        let out = orch.translate("Guardar cambios", "fr").await;
        assert_eq!(out, "Enregistrer les modifications");
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
        assert_eq!(c_calls.load(Ordering::SeqCst), 1);
        assert_eq!(orch.request_count(), 3);
    }

    #[tokio::test]
    async fn test_retry_round_rotates_order() {
        // Both fail once; round 1 starts with B, which then succeeds.
        let (a, a_calls) = boxed(
            MockTranslator::new(mapping(&[("Hola", "en", "from a")])).named("A").failing_first(1),
        );
        let (b, b_calls) = boxed(
            MockTranslator::new(mapping(&[("Hola", "en", "from b")])).named("B").failing_first(1),
        );
        let mut orch = Orchestrator::new(quick_config(), vec![a, b]);
        assert_eq!(orch.translate("Hola", "en").await, "From b");
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_original_and_records_failure() {
        let (a, a_calls) = boxed(MockTranslator::new(MockMode::Error("down".into())));
        let mut config = quick_config();
        config.max_retries = 2;
        let mut orch = Orchestrator::new(config, vec![a]);
        let span = r#" Hola <b>mundo</b> "#;
        assert_eq!(orch.translate(span, "ru").await, span);
        assert_eq!(a_calls.load(Ordering::SeqCst), 3);
        assert_eq!(orch.failures().len(), 1);
        assert_eq!(orch.failures()[0].text, "Hola <b>mundo</b>");
        assert_eq!(orch.failures()[0].target_lang, "ru");
        assert_eq!(orch.take_failures().len(), 1);
        assert!(orch.failures().is_empty());
    }

    #[tokio::test]
    async fn test_zero_retries_single_round() {
        let (a, a_calls) = boxed(MockTranslator::new(MockMode::NoOp));
        let mut config = quick_config();
        config.max_retries = 0;
        let mut orch = Orchestrator::new(config, vec![a]);
        assert_eq!(orch.translate("Hola", "en").await, "Hola");
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_resets_counter() {
        let (a, _) = boxed(MockTranslator::new(MockMode::Suffix));
        let mut config = quick_config();
        config.max_requests_before_cooldown = 2;
        let mut orch = Orchestrator::new(config, vec![a]);
        orch.translate("uno", "en").await;
        orch.translate("dos", "en").await;
        assert_eq!(orch.request_count(), 2);
        orch.translate("tres", "en").await;
        assert_eq!(orch.request_count(), 1);
    }

    #[tokio::test]
    async fn test_no_providers_is_a_recorded_failure() {
        let mut orch = Orchestrator::new(quick_config(), Vec::new());
        assert_eq!(orch.translate("Hola", "en").await, "Hola");
        assert!(orch.failures()[0].reason.contains("no translation providers"));
    }

    #[tokio::test]
    async fn test_long_span_chunked_and_markup_kept_once() {
        let (a, calls) = boxed(MockTranslator::new(MockMode::Replace {
            pairs: vec![("frase".to_string(), "sentence".to_string())],
            lowercase: true,
        }));
        let mut config = quick_config();
        config.max_span_len = 60;
        config.window_overlap = 20;
        let mut orch = Orchestrator::new(config, vec![a]);

        let span = format!(
            "{} <b>Visenture</b> {}",
            "Esta es una frase. ".repeat(5).trim(),
            "Otra frase. ".repeat(5).trim()
        );
        let out = orch.translate(&span, "en").await;
        assert!(calls.load(Ordering::SeqCst) > 1);
        assert_eq!(out.matches("<b>").count(), 1);
        assert_eq!(out.matches("</b>").count(), 1);
        assert_eq!(out.matches("Visenture").count(), 1);
        assert!(!out.contains("__"));
        assert!(out.contains("sentence"));
        assert!(orch.failures().is_empty());
    }

    #[tokio::test]
    async fn test_failed_piece_kept_while_others_translated() {
        let (a, _) = boxed(MockTranslator::new(mapping(&[
            ("Primera frase larga.", "en", "First long sentence."),
            ("Segunda frase larga.", "en", "Segunda frase larga."),
        ])));
        let mut config = quick_config();
        config.max_span_len = 25;
        config.max_retries = 0;
        let mut orch = Orchestrator::new(config, vec![a]);

        let out = orch.translate("Primera frase larga. Segunda frase larga.", "en").await;
        assert_eq!(out, "First long sentence. Segunda frase larga.");
        assert_eq!(orch.failures().len(), 1);
        assert_eq!(orch.failures()[0].text, "Segunda frase larga.");
    }
}
