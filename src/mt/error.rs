use thiserror::Error;

/// Error types for the Machine Translation module
///
/// Every provider failure is expressed as one of these variants. The
/// orchestrator treats all of them alike: the attempt failed and the next
/// provider is tried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MtError {
    /// Transport failure: connection refused, timeout, TLS, HTTP status
    #[error("Network error: {0}")]
    NetworkError(String),
    /// The provider answered with a payload we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// The provider echoed the request text back (case-insensitively)
    #[error("Provider returned the input unchanged")]
    Unchanged,
    /// Invalid locale code
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),
    /// Misconfigured provider or orchestrator
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Error during translation phase
    #[error("Translation error: {0}")]
    TranslationError(String),
}

impl From<reqwest::Error> for MtError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            MtError::InvalidResponse(err.to_string())
        } else {
            MtError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for MtError {
    fn from(err: serde_json::Error) -> Self {
        MtError::InvalidResponse(err.to_string())
    }
}

/// Result type for MT operations
pub type MtResult<T> = Result<T, MtError>;
