//! Document outline inference from PDF visual layout
//!
//! This crate provides:
//! - Block extraction with font size, weight and position using lopdf
//! - A font size profile separating body text from heading tiers
//! - Heuristic title selection and H1-H3 heading classification
//! - Batch processing of a directory of PDFs into JSON outlines

pub mod assembler;
pub mod batch;
pub mod classifier;
pub mod extractor;
pub mod model;
pub mod outline;
pub mod profile;
pub mod title;

pub use batch::{process_directory, process_file, BatchFailure, BatchReport};
pub use extractor::{extract_blocks, extract_blocks_mem, ExtractedDocument};
pub use model::{
    BoundingBox, DocumentOutline, HeadingLevel, OutlineEntry, TextBlock, DEFAULT_PAGE_HEIGHT,
};
pub use outline::{build_outline, OutlineOptions, PageNumbering};
pub use profile::FontProfile;

use std::collections::BTreeMap;
use std::path::Path;

/// Extract the outline of a PDF file
///
/// This function will:
/// 1. Decode every page into positioned text blocks
/// 2. Build the document's font profile
/// 3. Select the title and classify headings
/// 4. Merge multi-line headings and order the outline
pub fn extract_outline<P: AsRef<Path>>(
    path: P,
    options: &OutlineOptions,
) -> Result<DocumentOutline, OutlineError> {
    let extracted = extract_blocks(path)?;
    build_outline(
        &extracted.blocks,
        &extracted.page_heights,
        extracted.metadata_title.as_deref(),
        options,
    )
}

/// Extract the outline of a PDF held in memory
pub fn extract_outline_mem(
    buffer: &[u8],
    options: &OutlineOptions,
) -> Result<DocumentOutline, OutlineError> {
    let extracted = extract_blocks_mem(buffer)?;
    build_outline(
        &extracted.blocks,
        &extracted.page_heights,
        extracted.metadata_title.as_deref(),
        options,
    )
}

/// Infer an outline from blocks supplied by another extractor
///
/// Pages are assumed to be US Letter height.
pub fn outline_from_blocks(
    blocks: &[TextBlock],
    options: &OutlineOptions,
) -> Result<DocumentOutline, OutlineError> {
    build_outline(blocks, &BTreeMap::new(), None, options)
}

#[derive(Debug, thiserror::Error)]
pub enum OutlineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("PDF is encrypted")]
    Encrypted,
    #[error("Invalid PDF structure")]
    InvalidStructure,
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("font profile has no tier for {font_size}pt (body size {body_size}pt)")]
    InconsistentProfile { font_size: f32, body_size: f32 },
}

impl From<lopdf::Error> for OutlineError {
    fn from(e: lopdf::Error) -> Self {
        match e {
            lopdf::Error::IO(e) => OutlineError::Io(e),
            lopdf::Error::Decryption(_) => OutlineError::Encrypted,
            _ => OutlineError::Parse(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(OutlineError::Encrypted.to_string(), "PDF is encrypted");
        let err = OutlineError::InconsistentProfile {
            font_size: 20.0,
            body_size: 12.0,
        };
        assert_eq!(
            err.to_string(),
            "font profile has no tier for 20pt (body size 12pt)"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: OutlineError = io_err.into();
        assert!(matches!(err, OutlineError::Io(_)));
    }
}
