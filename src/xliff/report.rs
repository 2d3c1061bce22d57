//! Per-language run summary and its plain-text log artifact.

use std::fmt;
use std::path::PathBuf;

use crate::mt::orchestrator::FailedTranslation;
use crate::xliff::merger::MergeReport;

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub source_lang: String,
    pub target_lang: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub log: PathBuf,
    pub report: MergeReport,
    /// Spans every provider gave up on, with the last error seen
    pub failures: Vec<FailedTranslation>,
}

impl RunSummary {
    /// Contents of the log file written next to the output
    pub fn log_text(&self) -> String {
        let mut text = self.to_string();
        text.push('\n');
        if self.report.missing_ids.is_empty() {
            text.push_str("All units needing translation were translated.\n");
        } else {
            text.push_str(&format!(
                "Untranslated units ({}), need manual attention:\n",
                self.report.missing_ids.len()
            ));
            for id in &self.report.missing_ids {
                text.push_str(&format!("  - {}\n", id));
            }
        }
        if !self.failures.is_empty() {
            text.push_str("\nProvider errors:\n");
            for failure in &self.failures {
                text.push_str(&format!("  - {:?}: {}\n", failure.text, failure.reason));
            }
        }
        text
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.report;
        writeln!(f, "=== Translation Summary ({} -> {}) ===", self.source_lang, self.target_lang)?;
        writeln!(f, "Input: {}", self.input.display())?;
        writeln!(f, "Total strings found: {}", r.total)?;
        writeln!(f, "Successfully translated: {}", r.translated)?;
        writeln!(f, "Already translated: {}", r.untouched)?;
        writeln!(f, "Skipped (empty): {}", r.skipped)?;
        writeln!(f, "Failed translations: {}", r.missing)?;
        writeln!(f, "Success rate: {:.1}%", r.success_rate())?;
        write!(f, "File saved: {}", self.output.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(missing_ids: Vec<&str>) -> RunSummary {
        RunSummary {
            source_lang: "es".to_string(),
            target_lang: "fr".to_string(),
            input: PathBuf::from("messages.xlf"),
            output: PathBuf::from("messages.fr.xlf"),
            log: PathBuf::from("messages.fr.log"),
            report: MergeReport {
                total: 4,
                translated: 2,
                skipped: 1,
                missing: missing_ids.len(),
                untouched: 0,
                missing_ids: missing_ids.into_iter().map(String::from).collect(),
            },
            failures: vec![FailedTranslation {
                source_lang: "es".to_string(),
                target_lang: "fr".to_string(),
                text: "Hola".to_string(),
                reason: "Network error: timeout".to_string(),
            }],
        }
    }

    #[test]
    fn test_display_counts() {
        let text = summary(vec!["u7"]).to_string();
        assert!(text.contains("Total strings found: 4"));
        assert!(text.contains("Success rate: 66.7%"));
        assert!(text.ends_with("File saved: messages.fr.xlf"));
    }

    #[test]
    fn test_log_lists_missing_ids() {
        let log = summary(vec!["u7", "u9"]).log_text();
        assert!(log.contains("Untranslated units (2)"));
        assert!(log.contains("  - u7\n  - u9\n"));
        assert!(log.contains("Network error: timeout"));
    }

    #[test]
    fn test_log_without_missing() {
        let log = summary(vec![]).log_text();
        assert!(log.contains("All units needing translation were translated."));
    }
}
