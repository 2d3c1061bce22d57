pub mod config;
pub mod mt;
pub mod xliff;

// Re-export the types a caller needs for a full run
pub use config::{DEFAULT_SOURCE_LANG, SUPPORTED_LANGUAGES, TranslatorConfig};
pub use mt::{CodecOptions, MachineTranslator, MtError, MtResult, Orchestrator};
pub use xliff::{
    DocumentMerger, MergeReport, RunOptions, RunSummary, XliffDocument, XliffError, XliffResult,
};
