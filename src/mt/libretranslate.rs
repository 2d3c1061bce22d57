//! LibreTranslate provider
//!
//! `POST https://libretranslate.de/translate` with a JSON body
//! `{"q", "source", "target", "format": "text"}`. Public instances are slow,
//! so the default timeout is longer than for the GET-based providers.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::mt::error::{MtError, MtResult};
use crate::mt::google_translate::USER_AGENT;
use crate::mt::translator::{
    MachineTranslator, ensure_translated, normalize_locale, validate_locale,
};

#[derive(Debug, Deserialize)]
struct LibreTranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
    error: Option<String>,
}

/// Extract the translation from a LibreTranslate JSON body
pub fn parse_libretranslate_payload(body: &str, request: &str) -> MtResult<String> {
    let parsed: LibreTranslateResponse = serde_json::from_str(body)?;
    if let Some(error) = parsed.error {
        return Err(MtError::TranslationError(error));
    }
    let translated = parsed
        .translated_text
        .ok_or_else(|| MtError::InvalidResponse("missing 'translatedText'".to_string()))?;
    ensure_translated(request, &translated)
}

/// LibreTranslate provider
#[derive(Clone)]
pub struct LibreTranslateProvider {
    client: reqwest::Client,
    base_url: String,
    courtesy_pause: Duration,
}

impl LibreTranslateProvider {
    /// Default network timeout for a single request
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

    const DEFAULT_BASE_URL: &'static str = "https://libretranslate.de/translate";

    pub fn new() -> MtResult<Self> {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> MtResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MtError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            courtesy_pause: Duration::from_millis(300),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_courtesy_pause(mut self, pause: Duration) -> Self {
        self.courtesy_pause = pause;
        self
    }
}

impl std::fmt::Debug for LibreTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibreTranslateProvider")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for LibreTranslateProvider {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        validate_locale(source_locale)?;
        validate_locale(target_locale)?;

        let body = json!({
            "q": text,
            "source": normalize_locale(source_locale),
            "target": normalize_locale(target_locale),
            "format": "text"
        });

        let response = self.client.post(&self.base_url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(MtError::NetworkError(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        let translated = parse_libretranslate_payload(&body, text)?;

        if !self.courtesy_pause.is_zero() {
            tokio::time::sleep(self.courtesy_pause).await;
        }
        Ok(translated)
    }

    fn provider_name(&self) -> &str {
        "LibreTranslate"
    }
}
