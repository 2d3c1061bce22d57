//! Google Translate free endpoint provider
//!
//! Talks to the unauthenticated `translate_a/single` endpoint used by the
//! browser widget (`client=gtx`). No API key is needed, which makes it the
//! first provider tried, but the payload is an undocumented nested array whose
//! shape is checked before use.
//!
//! Payload shape:
//!
//! ```text
//! [[["Hello world","Hola mundo",null,null,10]],null,"es",...]
//! ```
//!
//! The translation is the first string of each segment in `payload[0]`.
//! Short strings come back as a single segment.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::{
    MachineTranslator, ensure_translated, normalize_locale, validate_locale,
};

pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Google Translate free web endpoint provider
#[derive(Clone)]
pub struct GoogleTranslateProvider {
    /// HTTP client, reused across calls so connections are pooled
    client: reqwest::Client,
    /// Endpoint URL
    base_url: String,
    /// Pause after a successful call
    courtesy_pause: Duration,
}

impl GoogleTranslateProvider {
    /// Default network timeout for a single request
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    const DEFAULT_BASE_URL: &'static str = "https://translate.googleapis.com/translate_a/single";

    /// Create a provider with the default endpoint and timeout
    pub fn new() -> MtResult<Self> {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    /// Create a provider with an explicit network timeout
    pub fn with_timeout(timeout: Duration) -> MtResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MtError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            courtesy_pause: Duration::from_millis(200),
        })
    }

    /// Point the provider at another endpoint (useful for local stubs)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the pause taken after a successful call
    pub fn with_courtesy_pause(mut self, pause: Duration) -> Self {
        self.courtesy_pause = pause;
        self
    }

    fn request_url(&self, text: &str, source_locale: &str, target_locale: &str) -> MtResult<Url> {
        let source = normalize_locale(source_locale);
        let target = normalize_locale(target_locale);
        Url::parse_with_params(
            &self.base_url,
            &[
                ("client", "gtx"),
                ("sl", source.as_str()),
                ("tl", target.as_str()),
                ("dt", "t"),
                ("q", text),
            ],
        )
        .map_err(|e| MtError::ConfigError(format!("Invalid endpoint URL: {}", e)))
    }
}

/// Extract the translated text from a `translate_a/single` payload
pub fn parse_google_payload(payload: &Value) -> MtResult<String> {
    let segments = payload
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            MtError::InvalidResponse("expected a nested array in payload[0]".to_string())
        })?;

    let mut translated = String::new();
    for segment in segments {
        match segment.get(0) {
            Some(Value::String(s)) => translated.push_str(s),
            Some(Value::Null) => {}
            _ => {
                return Err(MtError::InvalidResponse(format!(
                    "unexpected segment shape: {}",
                    segment
                )));
            }
        }
    }

    if translated.is_empty() {
        return Err(MtError::InvalidResponse(
            "payload contained no translated text".to_string(),
        ));
    }
    Ok(translated)
}

impl std::fmt::Debug for GoogleTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslateProvider")
            .field("base_url", &self.base_url)
            .field("courtesy_pause", &self.courtesy_pause)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for GoogleTranslateProvider {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        validate_locale(source_locale)?;
        validate_locale(target_locale)?;

        let url = self.request_url(text, source_locale, target_locale)?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(MtError::NetworkError(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await?;
        let translated = ensure_translated(text, &parse_google_payload(&payload)?)?;

        if !self.courtesy_pause.is_zero() {
            tokio::time::sleep(self.courtesy_pause).await;
        }
        Ok(translated)
    }

    fn provider_name(&self) -> &str {
        "Google Translate"
    }
}
