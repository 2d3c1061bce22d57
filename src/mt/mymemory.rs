//! MyMemory translation API provider
//!
//! `GET https://api.mymemory.translated.net/get?q=...&langpair=es|en`
//!
//! The free tier needs no key. Some language codes differ from the ones used
//! in XLIFF files and are remapped before the request is built.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use crate::mt::error::{MtError, MtResult};
use crate::mt::google_translate::USER_AGENT;
use crate::mt::translator::{
    MachineTranslator, ensure_translated, normalize_locale, validate_locale,
};

#[derive(Debug, Deserialize)]
struct MyMemoryResponse {
    #[serde(rename = "responseData")]
    response_data: Option<MyMemoryData>,
    #[serde(rename = "responseStatus")]
    response_status: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct MyMemoryData {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

/// Map an XLIFF language code to the code MyMemory expects
pub fn mymemory_lang_code(locale: &str) -> String {
    let base = normalize_locale(locale);
    match base.as_str() {
        "zh" => "zh-CN".to_string(),
        "pt" => "pt-PT".to_string(),
        "he" => "iw".to_string(),
        _ => base,
    }
}

/// Extract the translation from a MyMemory JSON body
///
/// Fails if `responseData.translatedText` is missing, if the reported status
/// is not 200, or if the text equals the request ignoring case.
pub fn parse_mymemory_payload(body: &str, request: &str) -> MtResult<String> {
    let parsed: MyMemoryResponse = serde_json::from_str(body)?;

    if let Some(status) = &parsed.response_status {
        let ok = match status {
            serde_json::Value::Number(n) => n.as_u64() == Some(200),
            serde_json::Value::String(s) => s == "200",
            _ => false,
        };
        if !ok {
            return Err(MtError::InvalidResponse(format!(
                "responseStatus {}",
                status
            )));
        }
    }

    let translated = parsed
        .response_data
        .and_then(|data| data.translated_text)
        .ok_or_else(|| {
            MtError::InvalidResponse("missing 'responseData.translatedText'".to_string())
        })?;

    ensure_translated(request, &translated)
}

/// MyMemory provider
#[derive(Clone)]
pub struct MyMemoryProvider {
    client: reqwest::Client,
    base_url: String,
    courtesy_pause: Duration,
}

impl MyMemoryProvider {
    /// Default network timeout for a single request
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    const DEFAULT_BASE_URL: &'static str = "https://api.mymemory.translated.net/get";

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
            courtesy_pause: Duration::from_millis(100),
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

    fn request_url(&self, text: &str, source_locale: &str, target_locale: &str) -> MtResult<Url> {
        let langpair = format!(
            "{}|{}",
            mymemory_lang_code(source_locale),
            mymemory_lang_code(target_locale)
        );
        Url::parse_with_params(&self.base_url, &[("q", text), ("langpair", langpair.as_str())])
            .map_err(|e| MtError::ConfigError(format!("Invalid endpoint URL: {}", e)))
    }
}

impl std::fmt::Debug for MyMemoryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MyMemoryProvider")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for MyMemoryProvider {
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

        let body = response.text().await?;
        let translated = parse_mymemory_payload(&body, text)?;

        if !self.courtesy_pause.is_zero() {
            tokio::time::sleep(self.courtesy_pause).await;
        }
        Ok(translated)
    }

    fn provider_name(&self) -> &str {
        "MyMemory"
    }
}
