//! Document Merger
//!
//! Walks every `trans-unit` of a parsed document in document order and fills
//! in targets that are missing, empty, or still a copy of the source. Units
//! that already carry a real translation are never touched or sent anywhere.

use tracing::{debug, info, warn};

use crate::mt::orchestrator::Orchestrator;
use crate::xliff::document::{XliffDocument, XmlElement, XmlNode, sanitize_fragment};

/// Per-document counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Units found
    pub total: usize,
    /// Targets created or overwritten
    pub translated: usize,
    /// Units without a source, or with a blank one
    pub skipped: usize,
    /// Units that needed a translation but did not get one
    pub missing: usize,
    /// Units that already had a translation
    pub untouched: usize,
    /// Ids of the `missing` units, in document order
    pub missing_ids: Vec<String>,
}

impl MergeReport {
    /// Translated units as a percentage of the non-skipped ones
    pub fn success_rate(&self) -> f64 {
        let eligible = self.total - self.skipped;
        if eligible == 0 {
            return 0.0;
        }
        self.translated as f64 / eligible as f64 * 100.0
    }

    fn record_missing(&mut self, id: &str) {
        self.missing += 1;
        self.missing_ids.push(id.to_string());
    }
}

pub struct DocumentMerger<'a> {
    orchestrator: &'a mut Orchestrator,
    source_lang: String,
    target_lang: String,
}

impl<'a> DocumentMerger<'a> {
    pub fn new(orchestrator: &'a mut Orchestrator, source_lang: &str, target_lang: &str) -> Self {
        DocumentMerger {
            orchestrator,
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
        }
    }

    pub async fn merge(&mut self, doc: &mut XliffDocument) -> MergeReport {
        let mut report = MergeReport::default();

        for path in doc.unit_paths() {
            let Some(unit) = doc.element_at(&path) else {
                continue;
            };
            report.total += 1;
            let id = unit.attr("id").unwrap_or_default().to_string();

            let Some(source) = unit.child("source") else {
                debug!("Unit {:?} has no source", id);
                report.skipped += 1;
                continue;
            };
            let source_xml = source.inner_xml();
            let core = source_xml.trim();
            if core.is_empty() {
                debug!("Unit {:?} has an empty source", id);
                report.skipped += 1;
                continue;
            }

            if let Some(target) = unit.child("target") {
                let current = target.inner_xml();
                let current = current.trim();
                if !current.is_empty() && current != core {
                    report.untouched += 1;
                    continue;
                }
            }

            let translated = self
                .orchestrator
                .translate_from(core, &self.source_lang, &self.target_lang)
                .await;
            if translated.trim().is_empty() || translated.trim() == core {
                info!("✗ [{}] no translation for unit {:?}", self.target_lang, id);
                report.record_missing(&id);
                continue;
            }

            let text = preserve_edge_spaces(&source_xml, &translated);
            let nodes = match sanitize_fragment(&text) {
                Ok(nodes) => nodes,
                Err(err) => {
                    warn!("Discarding ill-formed translation of unit {:?}: {}", id, err);
                    report.record_missing(&id);
                    continue;
                }
            };

            match doc.element_at_mut(&path) {
                Some(unit) => {
                    write_target(unit, nodes);
                    info!("✓ [{}] unit {:?}: {:?}", self.target_lang, id, text);
                    report.translated += 1;
                }
                None => report.record_missing(&id),
            }
        }
        report
    }
}

/// Give `translated` back the single edge spaces `source` had
///
/// At most one space is added per side, and only when the translation lost it.
pub fn preserve_edge_spaces(source: &str, translated: &str) -> String {
    let mut out = translated.to_string();
    if source.starts_with(' ') && !out.starts_with(' ') {
        out.insert(0, ' ');
    }
    if source.ends_with(' ') && !out.ends_with(' ') {
        out.push(' ');
    }
    out
}

/// Overwrite the unit's target, or create one right after the source
fn write_target(unit: &mut XmlElement, nodes: Vec<XmlNode>) {
    if let Some(target) = unit.child_mut("target") {
        target.set_children(nodes);
        if matches!(target.attr("state"), Some("new") | Some("needs-translation")) {
            target.set_attr("state", "translated");
        }
        return;
    }

    let Some(source_index) = unit.child_index("source") else {
        return;
    };
    let name = match unit.child("source").and_then(|s| s.prefix()) {
        Some(prefix) => format!("{}:target", prefix),
        None => "target".to_string(),
    };
    let indent = source_index
        .checked_sub(1)
        .and_then(|i| match &unit.children[i] {
            XmlNode::Text(text) if text.trim().is_empty() => Some(text.clone()),
            _ => None,
        });

    let mut target = XmlElement::new(name);
    target.set_children(nodes);

    let mut insert_at = source_index + 1;
    if let Some(indent) = indent {
        unit.children.insert(insert_at, XmlNode::Text(indent));
        insert_at += 1;
    }
    unit.children.insert(insert_at, XmlNode::Element(target));
}
