//! Heading classification
//!
//! Each block runs through a fixed sequence of pure checks: size against
//! the body size, tier lookup, text plausibility, footer band, baseline
//! isolation and running header repetition. The first failing check
//! rejects the block.

use crate::model::{HeadingLevel, TextBlock, DEFAULT_PAGE_HEIGHT};
use crate::outline::OutlineOptions;
use crate::profile::{size_key, FontProfile};
use crate::OutlineError;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Leading section numbers: "1", "2.3", "A.1", "IV."
static SECTION_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d+(?:\.\d+)*\.?|[A-Z](?:\.\d+)+\.?|[IVXLC]+\.)\s+\S").unwrap()
});

/// Secondary signals recorded for a confirmed heading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingSignals {
    /// 0 = largest elevated size
    pub size_rank: usize,
    pub is_bold: bool,
    /// Passed the baseline isolation check
    pub isolated: bool,
    /// Starts with a section number
    pub numbered: bool,
}

impl HeadingSignals {
    /// Diagnostic confidence in [0.5, 1.0]; never affects the level
    pub fn confidence(&self) -> f32 {
        let mut score = 0.5;
        if self.isolated {
            score += 0.2;
        }
        if self.is_bold {
            score += 0.15;
        }
        if self.numbered {
            score += 0.15;
        }
        score
    }
}

/// A block confirmed as a heading
#[derive(Debug, Clone)]
pub struct HeadingCandidate<'a> {
    pub block: &'a TextBlock,
    pub level: HeadingLevel,
    pub signals: HeadingSignals,
}

/// Why a block is not a heading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Font size at or below body size
    BodySize,
    /// Elevated size past the third tier
    BeyondTiers,
    TooShort,
    TooLong,
    /// Bare page number
    PageNumber,
    /// Starts in the footer band at the bottom of the page
    Footer,
    /// Sits on the same baseline as adjacent body text
    SharesBaseline,
    /// Repeated on too many pages
    RunningHeader,
}

/// Outcome of classifying one block
#[derive(Debug, Clone)]
pub enum Verdict<'a> {
    Heading(HeadingCandidate<'a>),
    Rejected(Rejection),
}

impl<'a> Verdict<'a> {
    pub fn into_candidate(self) -> Option<HeadingCandidate<'a>> {
        match self {
            Verdict::Heading(candidate) => Some(candidate),
            Verdict::Rejected(_) => None,
        }
    }
}

/// Neighbourhood lookups shared by all blocks of a document
#[derive(Debug)]
pub struct LayoutContext<'a> {
    /// Page -> blocks sorted by bottom edge
    baselines: BTreeMap<u32, Vec<&'a TextBlock>>,
    /// (normalized text, size key) -> pages it appears on
    repeats: HashMap<(String, i32), BTreeSet<u32>>,
    page_heights: BTreeMap<u32, f32>,
}

impl<'a> LayoutContext<'a> {
    pub fn new(blocks: &'a [TextBlock]) -> Self {
        let mut baselines: BTreeMap<u32, Vec<&'a TextBlock>> = BTreeMap::new();
        let mut repeats: HashMap<(String, i32), BTreeSet<u32>> = HashMap::new();

        for block in blocks {
            baselines.entry(block.page).or_default().push(block);
            repeats
                .entry(repeat_key(block))
                .or_default()
                .insert(block.page);
        }
        for page in baselines.values_mut() {
            page.sort_by(|a, b| a.bbox.y1.total_cmp(&b.bbox.y1));
        }

        LayoutContext {
            baselines,
            repeats,
            page_heights: BTreeMap::new(),
        }
    }

    /// Known page heights (0-based pages); others are taken as US Letter
    pub fn with_page_heights(mut self, page_heights: &BTreeMap<u32, f32>) -> Self {
        self.page_heights = page_heights.clone();
        self
    }

    pub fn page_height(&self, page: u32) -> f32 {
        self.page_heights
            .get(&page)
            .copied()
            .unwrap_or(DEFAULT_PAGE_HEIGHT)
    }

    /// Blocks on `page` whose bottom edge is within `tolerance` of `y1`
    pub fn near_baseline(&self, page: u32, y1: f32, tolerance: f32) -> &[&'a TextBlock] {
        let Some(sorted) = self.baselines.get(&page) else {
            return &[];
        };
        let start = sorted.partition_point(|b| b.bbox.y1 < y1 - tolerance);
        let end = sorted.partition_point(|b| b.bbox.y1 <= y1 + tolerance);
        &sorted[start..end.max(start)]
    }

    /// Number of distinct pages carrying the same text at the same size
    pub fn repeated_pages(&self, block: &TextBlock) -> usize {
        self.repeats
            .get(&repeat_key(block))
            .map_or(0, BTreeSet::len)
    }
}

fn repeat_key(block: &TextBlock) -> (String, i32) {
    let normalized = block.text.split_whitespace().collect::<Vec<_>>().join(" ");
    (normalized, size_key(block.font_size))
}

/// Check if text is just a page number (1-4 digits)
pub(crate) fn is_page_number(text: &str) -> bool {
    text.len() <= 4 && !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// Check if text starts with a section number
pub fn is_numbered_heading(text: &str) -> bool {
    SECTION_NUMBER_RE.is_match(text.trim_start())
}

/// Whether a body-size block sits on the same baseline right next to this one
fn shares_baseline(
    block: &TextBlock,
    context: &LayoutContext<'_>,
    profile: &FontProfile,
    options: &OutlineOptions,
) -> bool {
    let max_gap = profile.body_size() * options.inline_gap_factor;

    context
        .near_baseline(block.page, block.bbox.y1, options.baseline_tolerance)
        .iter()
        .any(|other| {
            other.block_index != block.block_index
                && !profile.is_elevated(other.font_size)
                && block.bbox.horizontal_gap(&other.bbox) <= max_gap
        })
}

/// Whether the block starts inside the bottom `footer_zone` of its page
fn in_footer_zone(
    block: &TextBlock,
    context: &LayoutContext<'_>,
    options: &OutlineOptions,
) -> bool {
    let height = context.page_height(block.page);
    block.bbox.y0 >= height * (1.0 - options.footer_zone)
}

/// Classify one block against the document profile
pub fn classify_block<'a>(
    block: &'a TextBlock,
    context: &LayoutContext<'_>,
    profile: &FontProfile,
    options: &OutlineOptions,
) -> Result<Verdict<'a>, OutlineError> {
    if !profile.is_elevated(block.font_size) {
        return Ok(Verdict::Rejected(Rejection::BodySize));
    }

    let size_rank = match profile.rank_of(block.font_size)? {
        Some(rank) => rank,
        None => return Ok(Verdict::Rejected(Rejection::BeyondTiers)),
    };
    let level = match HeadingLevel::from_rank(size_rank) {
        Some(level) => level,
        None => return Ok(Verdict::Rejected(Rejection::BeyondTiers)),
    };

    let text = block.text.trim();
    let len = text.chars().count();
    if len < options.min_heading_chars {
        return Ok(Verdict::Rejected(Rejection::TooShort));
    }
    if len > options.max_heading_chars {
        return Ok(Verdict::Rejected(Rejection::TooLong));
    }
    if is_page_number(text) {
        return Ok(Verdict::Rejected(Rejection::PageNumber));
    }
    if in_footer_zone(block, context, options) {
        return Ok(Verdict::Rejected(Rejection::Footer));
    }

    if shares_baseline(block, context, profile, options) {
        return Ok(Verdict::Rejected(Rejection::SharesBaseline));
    }
    if context.repeated_pages(block) > options.max_repeats {
        return Ok(Verdict::Rejected(Rejection::RunningHeader));
    }

    Ok(Verdict::Heading(HeadingCandidate {
        block,
        level,
        signals: HeadingSignals {
            size_rank,
            is_bold: block.is_bold,
            isolated: true,
            numbered: is_numbered_heading(text),
        },
    }))
}

/// Classify a pool of blocks, keeping the confirmed headings
///
/// An inconsistent profile aborts the whole document.
pub fn classify_blocks<'a>(
    pool: &[&'a TextBlock],
    context: &LayoutContext<'_>,
    profile: &FontProfile,
    options: &OutlineOptions,
) -> Result<Vec<HeadingCandidate<'a>>, OutlineError> {
    let mut candidates = Vec::new();

    for &block in pool {
        match classify_block(block, context, profile, options)? {
            Verdict::Heading(candidate) => {
                debug!(
                    "{} p{} {:.1}pt {:?} (bold={}, numbered={}, confidence={:.2})",
                    candidate.level,
                    block.page,
                    block.font_size,
                    block.text,
                    candidate.signals.is_bold,
                    candidate.signals.numbered,
                    candidate.signals.confidence()
                );
                candidates.push(candidate);
            }
            Verdict::Rejected(Rejection::BodySize) => {}
            Verdict::Rejected(reason) => {
                debug!(
                    "rejected p{} {:.1}pt {:?}: {:?}",
                    block.page, block.font_size, block.text, reason
                );
            }
        }
    }

    Ok(candidates)
}
