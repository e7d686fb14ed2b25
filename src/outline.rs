//! Outline inference pipeline
//!
//! profile -> title -> classify -> assemble, as a pure function of one
//! document's blocks.

use crate::assembler::assemble_outline;
use crate::classifier::{classify_blocks, LayoutContext};
use crate::model::{DocumentOutline, TextBlock};
use crate::profile::FontProfile;
use crate::title::select_title;
use crate::OutlineError;
use log::{debug, info};
use std::collections::BTreeMap;

/// Page base used in emitted outline entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageNumbering {
    /// First page is 0, same as `TextBlock::page`
    #[default]
    ZeroBased,
    /// First page is 1
    OneBased,
}

impl PageNumbering {
    /// Convert a 0-based block page into the emitted page number
    pub fn emit(self, page: u32) -> u32 {
        match self {
            PageNumbering::ZeroBased => page,
            PageNumbering::OneBased => page + 1,
        }
    }
}

/// Tunables for heading and title inference
#[derive(Debug, Clone)]
pub struct OutlineOptions {
    /// Longer text is never a heading
    pub max_heading_chars: usize,
    /// Shorter text (drop caps, stray glyphs) is never a heading
    pub min_heading_chars: usize,
    /// Longer text is never a title
    pub max_title_chars: usize,
    /// Bottoms within this distance (points) share a baseline
    pub baseline_tolerance: f32,
    /// Body text on a shared baseline counts as adjacent within this many body sizes
    pub inline_gap_factor: f32,
    /// Consecutive heading lines merge when the vertical gap is within this many font sizes
    pub merge_gap_factor: f32,
    /// Same text and size on more pages than this is a running header or footer
    pub max_repeats: usize,
    /// Blocks starting in this bottom fraction of the page are never headings
    pub footer_zone: f32,
    /// Page base of emitted entries
    pub page_numbering: PageNumbering,
    /// Prefer the document Info title when present
    pub prefer_metadata_title: bool,
}

impl Default for OutlineOptions {
    fn default() -> Self {
        Self {
            max_heading_chars: 120,
            min_heading_chars: 2,
            max_title_chars: 100,
            baseline_tolerance: 3.0,
            inline_gap_factor: 2.0,
            merge_gap_factor: 1.0,
            max_repeats: 2,
            footer_zone: 0.08,
            page_numbering: PageNumbering::ZeroBased,
            prefer_metadata_title: false,
        }
    }
}

/// Infer title and outline from a document's blocks
///
/// `page_heights` maps 0-based pages to their height; missing pages are
/// taken as US Letter. `metadata_title` is only consulted when
/// `prefer_metadata_title` is set.
pub fn build_outline(
    blocks: &[TextBlock],
    page_heights: &BTreeMap<u32, f32>,
    metadata_title: Option<&str>,
    options: &OutlineOptions,
) -> Result<DocumentOutline, OutlineError> {
    if blocks.is_empty() {
        return Ok(DocumentOutline::default());
    }

    let full_profile = FontProfile::from_blocks(blocks);
    debug!(
        "body size {:.1}pt, heading tiers {:?} ({} elevated sizes)",
        full_profile.body_size(),
        full_profile.ranked_sizes(),
        full_profile.elevated_tiers()
    );

    let title = select_title(blocks, &full_profile, options);

    let pool: Vec<&TextBlock> = blocks
        .iter()
        .filter(|b| !title.contains(b.block_index))
        .collect();
    let title_blocks = blocks.iter().filter(|b| title.contains(b.block_index));
    let profile = full_profile.without(title_blocks);

    let context = LayoutContext::new(blocks).with_page_heights(page_heights);
    let candidates = classify_blocks(&pool, &context, &profile, options)?;
    let outline = assemble_outline(candidates, options);

    let title_text = match metadata_title.map(str::trim) {
        Some(meta) if options.prefer_metadata_title && !meta.is_empty() => meta.to_string(),
        _ => title.text,
    };

    info!(
        "inferred outline: title {:?}, {} headings from {} blocks",
        title_text,
        outline.len(),
        blocks.len()
    );

    Ok(DocumentOutline {
        title: title_text,
        outline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, HeadingLevel};

    fn block(text: &str, page: u32, y: f32, font_size: f32, index: usize) -> TextBlock {
        TextBlock {
            text: text.to_string(),
            page,
            font_size,
            is_bold: false,
            bbox: BoundingBox::new(72.0, y, 72.0 + text.len() as f32 * font_size * 0.5, y + font_size),
            block_index: index,
        }
    }

    #[test]
    fn test_empty_document() {
        let outline =
            build_outline(&[], &BTreeMap::new(), None, &OutlineOptions::default()).unwrap();
        assert_eq!(outline, DocumentOutline::default());
    }

    #[test]
    fn test_page_numbering() {
        assert_eq!(PageNumbering::ZeroBased.emit(0), 0);
        assert_eq!(PageNumbering::OneBased.emit(0), 1);
    }

    #[test]
    fn test_metadata_title_preferred_when_enabled() {
        let blocks = vec![
            block("Visual Title", 0, 50.0, 24.0, 0),
            block("Heading", 0, 100.0, 16.0, 1),
            block("body text that runs on for a while", 0, 130.0, 10.0, 2),
            block("more body text that runs on for a while", 0, 145.0, 10.0, 3),
        ];

        let no_heights = BTreeMap::new();
        let default =
            build_outline(&blocks, &no_heights, Some("Meta Title"), &OutlineOptions::default())
                .unwrap();
        assert_eq!(default.title, "Visual Title");

        let options = OutlineOptions {
            prefer_metadata_title: true,
            ..Default::default()
        };
        let preferred = build_outline(&blocks, &no_heights, Some("Meta Title"), &options).unwrap();
        assert_eq!(preferred.title, "Meta Title");
        // The visual title is still kept out of the outline
        assert_eq!(preferred.outline.len(), 1);
        assert_eq!(preferred.outline[0].level, HeadingLevel::H1);

        let blank = build_outline(&blocks, &no_heights, Some("   "), &options).unwrap();
        assert_eq!(blank.title, "Visual Title");
    }
}
