//! CLI tool for PDF title and heading outline extraction

use clap::Parser;
use pdf_outline::batch::{output_path_for, process_directory};
use pdf_outline::{extract_outline, OutlineError, OutlineOptions, PageNumbering};
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "pdf-outline")]
#[command(version)]
#[command(about = "Infer a PDF's title and H1-H3 outline from its layout", long_about = None)]
struct Cli {
    /// Input PDF file, or a directory of PDFs
    #[arg(value_name = "INPUT", env = "PDF_OUTLINE_INPUT", default_value = "input")]
    input: PathBuf,

    /// Output directory (directory input) or JSON file (file input, stdout if omitted)
    #[arg(short, long, value_name = "PATH", env = "PDF_OUTLINE_OUTPUT")]
    output: Option<PathBuf>,

    /// Number pages from 1 instead of 0
    #[arg(long)]
    one_based_pages: bool,

    /// Use the document Info title when present
    #[arg(long)]
    metadata_title: bool,

    /// Longest text accepted as a heading
    #[arg(long, default_value_t = 120)]
    max_heading_chars: usize,

    /// Shortest text accepted as a heading
    #[arg(long, default_value_t = 2)]
    min_heading_chars: usize,

    /// Longest text accepted as a title
    #[arg(long, default_value_t = 100)]
    max_title_chars: usize,

    /// Largest vertical gap, in font sizes, between lines of one heading
    #[arg(long, default_value_t = 1.0)]
    merge_gap: f32,

    /// Pages a heading may repeat on before it counts as a running header
    #[arg(long, default_value_t = 2)]
    max_repeats: usize,

    /// Largest difference, in points, between bottoms that share a baseline
    #[arg(long, default_value_t = 3.0)]
    baseline_tolerance: f32,

    /// Largest horizontal gap, in body sizes, to body text on a shared baseline
    #[arg(long, default_value_t = 2.0)]
    inline_gap: f32,

    /// Bottom fraction of each page where headings are ignored
    #[arg(long, default_value_t = 0.08)]
    footer_zone: f32,

    /// Log classification decisions
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> OutlineOptions {
        OutlineOptions {
            max_heading_chars: self.max_heading_chars,
            min_heading_chars: self.min_heading_chars,
            max_title_chars: self.max_title_chars,
            baseline_tolerance: self.baseline_tolerance,
            inline_gap_factor: self.inline_gap,
            merge_gap_factor: self.merge_gap,
            max_repeats: self.max_repeats,
            footer_zone: self.footer_zone,
            page_numbering: if self.one_based_pages {
                PageNumbering::OneBased
            } else {
                PageNumbering::ZeroBased
            },
            prefer_metadata_title: self.metadata_title,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();

    let options = cli.options();

    if cli.input.is_dir() {
        let output_dir = cli.output.clone().unwrap_or_else(|| PathBuf::from("output"));
        match process_directory(&cli.input, &output_dir, &options) {
            Ok(report) => {
                for failure in &report.failed {
                    eprintln!("Error: {}: {}", failure.input.display(), failure.error);
                }
                eprintln!(
                    "{} of {} document(s) written to {}",
                    report.written.len(),
                    report.total(),
                    output_dir.display()
                );
                if !report.is_success() {
                    process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("Error: {}: {}", cli.input.display(), e);
                process::exit(1);
            }
        }
        return;
    }

    let json = match extract_outline(&cli.input, &options).and_then(|o| o.to_json().map_err(OutlineError::from)) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error: {}: {}", cli.input.display(), e);
            process::exit(1);
        }
    };

    match &cli.output {
        Some(path) => {
            // A directory here means "put <stem>.json inside it"
            let target = if path.is_dir() {
                output_path_for(&cli.input, path)
            } else {
                path.clone()
            };
            if let Err(e) = fs::write(&target, json) {
                eprintln!("Error: {}: {}", target.display(), e);
                process::exit(1);
            }
            eprintln!("Outline written to: {}", target.display());
        }
        None => println!("{}", json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_library() {
        let cli = Cli::parse_from(["pdf-outline", "doc.pdf"]);
        let options = cli.options();
        let defaults = OutlineOptions::default();
        assert_eq!(options.max_heading_chars, defaults.max_heading_chars);
        assert_eq!(options.min_heading_chars, defaults.min_heading_chars);
        assert_eq!(options.max_title_chars, defaults.max_title_chars);
        assert_eq!(options.baseline_tolerance, defaults.baseline_tolerance);
        assert_eq!(options.inline_gap_factor, defaults.inline_gap_factor);
        assert_eq!(options.merge_gap_factor, defaults.merge_gap_factor);
        assert_eq!(options.max_repeats, defaults.max_repeats);
        assert_eq!(options.footer_zone, defaults.footer_zone);
        assert_eq!(options.page_numbering, PageNumbering::ZeroBased);
        assert!(!options.prefer_metadata_title);
    }

    #[test]
    fn test_isolation_flags() {
        let cli = Cli::parse_from([
            "pdf-outline",
            "doc.pdf",
            "--baseline-tolerance",
            "1.5",
            "--inline-gap",
            "4",
            "--footer-zone",
            "0.1",
            "--one-based-pages",
        ]);
        let options = cli.options();
        assert_eq!(options.baseline_tolerance, 1.5);
        assert_eq!(options.inline_gap_factor, 4.0);
        assert_eq!(options.footer_zone, 0.1);
        assert_eq!(options.page_numbering, PageNumbering::OneBased);
    }
}
