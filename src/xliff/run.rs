//! Run driver: one input file, one or all target languages.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::{SUPPORTED_LANGUAGES, is_supported_language};
use crate::mt::orchestrator::Orchestrator;
use crate::mt::translator::normalize_locale;
use crate::xliff::document::XliffDocument;
use crate::xliff::error::{XliffError, XliffResult};
use crate::xliff::merger::DocumentMerger;
use crate::xliff::report::RunSummary;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Directory for outputs; defaults to the input's directory
    pub output_dir: Option<PathBuf>,
    /// Forces the source language over the document's `source-language`
    pub source_lang: Option<String>,
}

/// Check the request before anything touches the network
///
/// Returns the target languages to process: `all` expands to every supported
/// language.
pub fn validate_request(input: &Path, language: &str) -> XliffResult<Vec<String>> {
    if !input.is_file() {
        return Err(XliffError::MissingInput(input.to_path_buf()));
    }
    let language = language.trim().to_lowercase();
    if language == "all" {
        return Ok(SUPPORTED_LANGUAGES.iter().map(|l| l.to_string()).collect());
    }
    if is_supported_language(&language) {
        Ok(vec![language])
    } else {
        Err(XliffError::UnsupportedLanguage(language))
    }
}

/// `<dir>/<stem>.<lang>.xlf`
pub fn output_path_for(input: &Path, lang: &str, output_dir: Option<&Path>) -> PathBuf {
    sibling_path(input, lang, "xlf", output_dir)
}

/// `<dir>/<stem>.<lang>.log`
pub fn log_path_for(input: &Path, lang: &str, output_dir: Option<&Path>) -> PathBuf {
    sibling_path(input, lang, "log", output_dir)
}

fn sibling_path(input: &Path, lang: &str, extension: &str, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "messages".to_string());
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{}.{}.{}", stem, lang, extension))
}

/// Translate `input` into one target language and write output and log
pub async fn translate_file(
    orchestrator: &mut Orchestrator,
    input: &Path,
    target_lang: &str,
    options: &RunOptions,
) -> XliffResult<RunSummary> {
    let xml = fs::read_to_string(input)?;
    let mut doc = XliffDocument::parse(&xml)?;

    let source_lang = options
        .source_lang
        .clone()
        .or_else(|| doc.source_language().map(normalize_locale))
        .unwrap_or_else(|| orchestrator.config().source_lang.clone());
    info!("Translating {} from {} to {}", input.display(), source_lang, target_lang);

    orchestrator.take_failures();
    let report = DocumentMerger::new(orchestrator, &source_lang, target_lang)
        .merge(&mut doc)
        .await;

    let output_dir = options.output_dir.as_deref();
    if let Some(dir) = output_dir {
        fs::create_dir_all(dir)?;
    }
    let output = output_path_for(input, target_lang, output_dir);
    fs::write(&output, doc.to_xml_string())?;

    let summary = RunSummary {
        source_lang,
        target_lang: target_lang.to_string(),
        input: input.to_path_buf(),
        output: output.clone(),
        log: log_path_for(input, target_lang, output_dir),
        report,
        failures: orchestrator.take_failures(),
    };
    fs::write(&summary.log, summary.log_text())?;
    info!("Saved {}", output.display());
    Ok(summary)
}

/// Translate `input` into each language in turn
///
/// A failing language is logged and reported; the remaining ones still run.
pub async fn translate_all(
    orchestrator: &mut Orchestrator,
    input: &Path,
    languages: &[String],
    options: &RunOptions,
) -> Vec<(String, XliffResult<RunSummary>)> {
    let mut results = Vec::with_capacity(languages.len());
    for lang in languages {
        let result = translate_file(orchestrator, input, lang, options).await;
        if let Err(err) = &result {
            warn!("Translation to {} failed: {}", lang, err);
        }
        results.push((lang.clone(), result));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_paths() {
        let input = Path::new("src/locale/messages.xlf");
        assert_eq!(
            output_path_for(input, "fr", None),
            PathBuf::from("src/locale/messages.fr.xlf")
        );
        assert_eq!(
            log_path_for(input, "ru", Some(Path::new("out"))),
            PathBuf::from("out/messages.ru.log")
        );
        assert_eq!(
            output_path_for(Path::new("messages.xlf"), "en", None),
            PathBuf::from("messages.en.xlf")
        );
    }

    #[test]
    fn test_validate_missing_file() {
        let err = validate_request(Path::new("/nonexistent/messages.xlf"), "fr").unwrap_err();
        assert!(matches!(err, XliffError::MissingInput(_)));
    }

    #[test]
    fn test_validate_languages() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(validate_request(file.path(), "FR").unwrap(), vec!["fr"]);
        assert_eq!(validate_request(file.path(), "all").unwrap(), vec!["en", "fr", "ru"]);
        assert!(matches!(
            validate_request(file.path(), "de"),
            Err(XliffError::UnsupportedLanguage(lang)) if lang == "de"
        ));
    }
}
