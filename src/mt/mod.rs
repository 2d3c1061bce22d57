/// Machine Translation Module
///
/// Sends XLIFF text spans through free web translation services without
/// letting them damage inline markup, ICU expressions or brand names.
///
/// # Overview
///
/// 1. **Placeholder Codec** (`protection`, `placeholder_recovery`, `anchor`) -
///    swaps protected content for opaque anchor tokens and puts it back,
///    tolerating tokens the provider lowercased or mangled
/// 2. **MT Trait & Providers** - `MachineTranslator` with Google, MyMemory and
///    LibreTranslate implementations, plus a mock for tests
/// 3. **Orchestrator** - cache, rate limiting, chunking, provider fallback
///    and retry with backoff around the codec
///
/// # Example
///
/// ```ignore
/// use xlf_mt::config::TranslatorConfig;
/// use xlf_mt::mt::Orchestrator;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut orchestrator = Orchestrator::with_default_providers(TranslatorConfig::from_env()?)?;
///     let translated = orchestrator
///         .translate(r#"Hola <x id="INTERPOLATION"/>, bienvenido a Visenture"#, "en")
///         .await;
///     println!("{}", translated);
///     Ok(())
/// }
/// ```
pub mod anchor;
pub mod cache;
pub mod chunking;
pub mod error;
pub mod google_translate;
pub mod libretranslate;
pub mod mock;
pub mod mymemory;
pub mod orchestrator;
pub mod placeholder_recovery;
pub mod protection;
pub mod translator;


pub use anchor::{AnchorFactory, AnchorToken};
pub use cache::{CacheKey, TranslationCache};
pub use chunking::split_for_translation;
pub use error::{MtError, MtResult};
pub use google_translate::GoogleTranslateProvider;
pub use libretranslate::LibreTranslateProvider;
pub use mock::{MockMode, MockTranslator};
pub use mymemory::MyMemoryProvider;
pub use orchestrator::{FailedTranslation, Orchestrator};
pub use placeholder_recovery::{restore, restore_tokens};
pub use protection::{CodecOptions, ProtectedSpan, protect};
pub use translator::{MachineTranslator, ensure_translated, normalize_locale};
