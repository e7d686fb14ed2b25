//! Batch processing of a directory of PDFs
//!
//! Every document is independent: each one is extracted, outlined and
//! written on its own, in parallel, and a failure only costs that
//! document's output file.

use crate::outline::OutlineOptions;
use crate::{extract_outline, OutlineError};
use log::{info, warn};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// A document that produced no output
#[derive(Debug)]
pub struct BatchFailure {
    pub input: PathBuf,
    pub error: OutlineError,
}

/// Outcome of a directory run, in input file order
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Output files written
    pub written: Vec<PathBuf>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.written.len() + self.failed.len()
    }
}

/// PDF files directly inside `dir`, sorted by name
pub fn find_pdfs<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, OutlineError> {
    let mut pdfs = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }

    pdfs.sort();
    Ok(pdfs)
}

/// `<output_dir>/<input stem>.json`
pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let mut name = input
        .file_stem()
        .unwrap_or(input.as_os_str())
        .to_os_string();
    name.push(".json");
    output_dir.join(name)
}

/// Outline one PDF and write its JSON next to the others
///
/// Nothing is written when extraction or inference fails.
pub fn process_file(
    input: &Path,
    output_dir: &Path,
    options: &OutlineOptions,
) -> Result<PathBuf, OutlineError> {
    let outline = extract_outline(input, options)?;
    let json = outline.to_json()?;

    let output = output_path_for(input, output_dir);
    fs::write(&output, json)?;

    info!(
        "{} -> {} ({} headings)",
        input.display(),
        output.display(),
        outline.outline.len()
    );
    Ok(output)
}

/// Outline every PDF in `input_dir` into `output_dir`
///
/// Only directory-level problems (unreadable input, uncreatable output)
/// are errors; per-document failures land in the report.
pub fn process_directory(
    input_dir: &Path,
    output_dir: &Path,
    options: &OutlineOptions,
) -> Result<BatchReport, OutlineError> {
    let pdfs = find_pdfs(input_dir)?;
    if pdfs.is_empty() {
        warn!("no PDF files found in {}", input_dir.display());
        return Ok(BatchReport::default());
    }

    fs::create_dir_all(output_dir)?;
    info!("processing {} PDF file(s) from {}", pdfs.len(), input_dir.display());

    let results: Vec<(PathBuf, Result<PathBuf, OutlineError>)> = pdfs
        .into_par_iter()
        .map(|pdf| {
            let result = process_file(&pdf, output_dir, options);
            (pdf, result)
        })
        .collect();

    let mut report = BatchReport::default();
    for (input, result) in results {
        match result {
            Ok(output) => report.written.push(output),
            Err(error) => {
                warn!("failed to process {}: {}", input.display(), error);
                report.failed.push(BatchFailure { input, error });
            }
        }
    }

    info!(
        "done: {} written, {} failed",
        report.written.len(),
        report.failed.len()
    );
    Ok(report)
}
