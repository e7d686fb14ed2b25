//! Title selection from the first page

use crate::classifier::is_page_number;
use crate::model::TextBlock;
use crate::outline::OutlineOptions;
use crate::profile::{size_key, FontProfile};
use log::debug;
use std::cmp::Ordering;

/// The chosen title and the blocks it was built from
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TitleSelection {
    pub text: String,
    pub block_indices: Vec<usize>,
}

impl TitleSelection {
    pub fn is_empty(&self) -> bool {
        self.block_indices.is_empty()
    }

    pub fn contains(&self, block_index: usize) -> bool {
        self.block_indices.contains(&block_index)
    }
}

/// Top-to-bottom, then left-to-right, then stream order
pub(crate) fn reading_position(a: &TextBlock, b: &TextBlock) -> Ordering {
    a.page
        .cmp(&b.page)
        .then(a.bbox.y0.total_cmp(&b.bbox.y0))
        .then(a.bbox.x0.total_cmp(&b.bbox.x0))
        .then(a.block_index.cmp(&b.block_index))
}

/// Pick the most prominent run of lines on page 0
///
/// Folios and stray glyphs are never candidates. The largest elevated
/// size wins; further lines at that size directly below the topmost one
/// (nothing in between, gap within the merge threshold) are joined into a
/// multi-line title. Returns an empty selection when page 0 has nothing
/// above body size.
pub fn select_title(
    blocks: &[TextBlock],
    profile: &FontProfile,
    options: &OutlineOptions,
) -> TitleSelection {
    let mut first_page: Vec<&TextBlock> = blocks.iter().filter(|b| b.page == 0).collect();
    first_page.sort_by(|a, b| reading_position(a, b));

    let fits = |b: &TextBlock| {
        let text = b.text.trim();
        let len = text.chars().count();
        len >= options.min_heading_chars.max(1)
            && len <= options.max_title_chars
            && !is_page_number(text)
    };

    let Some(max_key) = first_page
        .iter()
        .filter(|b| fits(**b) && profile.is_elevated(b.font_size))
        .map(|b| size_key(b.font_size))
        .max()
    else {
        return TitleSelection::default();
    };

    let Some(start) = first_page
        .iter()
        .position(|b| fits(*b) && size_key(b.font_size) == max_key)
    else {
        return TitleSelection::default();
    };

    let mut parts = vec![first_page[start]];
    for &next in &first_page[start + 1..] {
        let prev = parts[parts.len() - 1];
        let gap = next.bbox.y0 - prev.bbox.y1;
        if size_key(next.font_size) != max_key
            || !fits(next)
            || gap > options.merge_gap_factor * prev.font_size
        {
            break;
        }
        parts.push(next);
    }

    let text = parts
        .iter()
        .map(|b| b.text.trim())
        .collect::<Vec<_>>()
        .join(" ");
    debug!("title {:?} from {} line(s)", text, parts.len());

    TitleSelection {
        text,
        block_indices: parts.iter().map(|b| b.block_index).collect(),
    }
}
