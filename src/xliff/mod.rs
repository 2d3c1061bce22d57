//! XLIFF 1.2 document handling
//!
//! Parsing into a lossless tree, merging machine translations into
//! `trans-unit` targets, and the per-language run driver.

pub mod document;
pub mod error;
pub mod merger;
pub mod report;
pub mod run;

pub use document::{XliffDocument, XmlElement, XmlNode, parse_fragment, sanitize_fragment};
pub use error::{XliffError, XliffResult};
pub use merger::{DocumentMerger, MergeReport, preserve_edge_spaces};
pub use report::RunSummary;
pub use run::{
    RunOptions, log_path_for, output_path_for, translate_all, translate_file, validate_request,
};
