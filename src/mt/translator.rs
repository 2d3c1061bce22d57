//! Machine Translation trait and utilities
//!
//! This module defines the `MachineTranslator` trait for provider abstraction.
//! Each backend (Google's free endpoint, MyMemory, LibreTranslate, the mock)
//! implements it and converts its own transport and payload errors into
//! `MtError`, so the orchestrator can walk an ordered list of providers
//! without caring which one it is talking to.
//!
//! # Example
//!
//! ```ignore
//! use xlf_mt::mt::{MachineTranslator, GoogleTranslateProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GoogleTranslateProvider::new()?;
//!     let result = provider.translate("Hola mundo", "es", "fr").await?;
//!     println!("{}", result); // "Bonjour le monde"
//!     Ok(())
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use async_trait::async_trait;

/// Generic trait for machine translation providers
///
/// Implementations must never return a partial translation: either the whole
/// text was translated (`Ok`) or the attempt failed (`Err`).
#[async_trait]
pub trait MachineTranslator: Send + Sync {
    /// Translate a single text string from source to target locale
    ///
    /// # Arguments
    ///
    /// * `text` - The text to translate (already protected by the placeholder codec)
    /// * `source_locale` - Source language code (e.g., "es")
    /// * `target_locale` - Target language code (e.g., "fr")
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The translated text
    /// * `Err(MtError)` - On transport failure, malformed payload or echoed input
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String>;

    /// Get the name of this translation provider
    ///
    /// Used for logging to identify which provider handled a translation.
    fn provider_name(&self) -> &str;
}

/// Normalize a locale code by stripping region information
///
/// - `en-US` → `en`
/// - `fr-FR` → `fr`
/// - `en` → `en` (unchanged)
pub fn normalize_locale(locale: &str) -> String {
    locale.split(['-', '_']).next().unwrap_or(locale).to_lowercase()
}

/// Validate that a locale code is in acceptable format
///
/// Checks that the locale code contains only alphanumeric characters,
/// hyphens, and underscores.
pub fn validate_locale(locale: &str) -> MtResult<()> {
    if locale.is_empty() {
        return Err(MtError::InvalidLocale("Locale code is empty".to_string()));
    }

    if !locale
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(MtError::InvalidLocale(format!(
            "Invalid characters in locale code: {}",
            locale
        )));
    }

    Ok(())
}

/// Classify a provider reply against the request text
///
/// An empty reply, or one that equals the request ignoring case, means no real
/// translation happened and is reported as a failure.
pub fn ensure_translated(request: &str, reply: &str) -> MtResult<String> {
    if reply.trim().is_empty() {
        return Err(MtError::InvalidResponse("empty translation".to_string()));
    }
    if reply.to_lowercase() == request.to_lowercase() {
        return Err(MtError::Unchanged);
    }
    Ok(reply.to_string())
}
