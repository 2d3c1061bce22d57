//! Errors raised while reading, merging or writing an XLIFF document.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum XliffError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("unsupported language `{0}` (expected one of: en, fr, ru, all)")]
    UnsupportedLanguage(String),

    #[error("input file not found: {}", .0.display())]
    MissingInput(PathBuf),
}

pub type XliffResult<T> = Result<T, XliffError>;
