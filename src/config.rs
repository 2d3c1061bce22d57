//! Runtime configuration
//!
//! Defaults mirror the behaviour the tool has always had (Spanish source,
//! 30 requests per cooldown window, one-minute cooldown). Any field can be
//! overridden through `XLF_MT_*` environment variables, and the binary layers
//! its command-line flags on top.

use std::str::FromStr;
use std::time::Duration;

use crate::mt::error::{MtError, MtResult};
use crate::mt::protection::CodecOptions;

/// Target languages the command line accepts
pub const SUPPORTED_LANGUAGES: [&str; 3] = ["en", "fr", "ru"];

/// Source language assumed when neither the document nor the caller names one
pub const DEFAULT_SOURCE_LANG: &str = "es";

pub fn is_supported_language(code: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&code)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranslatorConfig {
    pub source_lang: String,
    /// Provider calls allowed before the orchestrator pauses
    pub max_requests_before_cooldown: usize,
    pub cooldown: Duration,
    /// Extra rounds over all providers after the first one fails
    pub max_retries: u32,
    /// Delay before retry round `n` is `backoff_base * 2^(n-1)`
    pub backoff_base: Duration,
    /// Spans longer than this many characters are chunked
    pub max_span_len: usize,
    /// Size of the zone in which a window cut may float back to whitespace
    pub window_overlap: usize,
    /// Timeout for the GET-based providers
    pub request_timeout: Duration,
    /// Timeout for the POST-based provider
    pub post_timeout: Duration,
    /// Pause briefly after each successful provider call
    pub courtesy_pause: bool,
    pub codec: CodecOptions,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        TranslatorConfig {
            source_lang: DEFAULT_SOURCE_LANG.to_string(),
            max_requests_before_cooldown: 30,
            cooldown: Duration::from_secs(60),
            max_retries: 2,
            backoff_base: Duration::from_secs(1),
            max_span_len: 2000,
            window_overlap: 200,
            request_timeout: Duration::from_secs(10),
            post_timeout: Duration::from_secs(15),
            courtesy_pause: true,
            codec: CodecOptions::default(),
        }
    }
}

impl TranslatorConfig {
    /// Defaults overridden by `XLF_MT_*` environment variables
    pub fn from_env() -> MtResult<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> MtResult<Self> {
        if let Some(lang) = lookup("XLF_MT_SOURCE_LANG") {
            self.source_lang = lang.trim().to_string();
        }
        if let Some(limit) = parse_var::<usize>(&lookup, "XLF_MT_RATE_LIMIT")? {
            self.max_requests_before_cooldown = limit;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "XLF_MT_COOLDOWN_SECS")? {
            self.cooldown = Duration::from_secs(secs);
        }
        if let Some(retries) = parse_var::<u32>(&lookup, "XLF_MT_MAX_RETRIES")? {
            self.max_retries = retries;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "XLF_MT_BACKOFF_MS")? {
            self.backoff_base = Duration::from_millis(ms);
        }
        if lookup("XLF_MT_NO_PAUSE").is_some() {
            self.courtesy_pause = false;
        }
        Ok(self)
    }

    /// Same configuration with every sleep removed
    pub fn without_delays(mut self) -> Self {
        self.cooldown = Duration::ZERO;
        self.backoff_base = Duration::ZERO;
        self.courtesy_pause = false;
        self
    }

    /// Backoff delay before retry round `round` (1-based)
    pub fn backoff_delay(&self, round: u32) -> Duration {
        let factor = 2u32.saturating_pow(round.saturating_sub(1));
        self.backoff_base.saturating_mul(factor)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> MtResult<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| MtError::ConfigError(format!("{} has an invalid value: {}", key, raw))),
    }
}
