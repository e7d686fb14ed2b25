//! Outline assembly
//!
//! Candidates are put in reading order, then folded through a two-state
//! machine that joins heading lines continuing one another.

use crate::classifier::HeadingCandidate;
use crate::model::{HeadingLevel, OutlineEntry, TextBlock};
use crate::outline::OutlineOptions;
use crate::profile::size_key;
use crate::title::reading_position;

/// A heading whose last line may still be continued
#[derive(Debug)]
struct OpenHeading<'a> {
    level: HeadingLevel,
    text: String,
    first: &'a TextBlock,
    last: &'a TextBlock,
}

#[derive(Debug)]
enum AssemblyState<'a> {
    Idle,
    Accumulating(OpenHeading<'a>),
}

/// Whether `next` is the following line of the same heading
///
/// Same page, level and size; directly after in stream order, so nothing
/// else sits between them; and no further below than the merge gap.
fn continues(open: &OpenHeading<'_>, next: &HeadingCandidate<'_>, options: &OutlineOptions) -> bool {
    let last = open.last;
    let block = next.block;
    let gap = block.bbox.y0 - last.bbox.y1;

    block.page == last.page
        && next.level == open.level
        && size_key(block.font_size) == size_key(last.font_size)
        && block.block_index == last.block_index + 1
        && gap >= -options.baseline_tolerance
        && gap <= options.merge_gap_factor * last.font_size
}

fn close(open: OpenHeading<'_>, options: &OutlineOptions) -> OutlineEntry {
    OutlineEntry {
        level: open.level,
        text: open.text,
        page: options.page_numbering.emit(open.first.page),
    }
}

/// Merge, order and emit confirmed headings
pub fn assemble_outline(
    mut candidates: Vec<HeadingCandidate<'_>>,
    options: &OutlineOptions,
) -> Vec<OutlineEntry> {
    candidates.sort_by(|a, b| reading_position(a.block, b.block));

    let mut entries = Vec::with_capacity(candidates.len());
    let mut state = AssemblyState::Idle;

    for candidate in candidates {
        let text = candidate.block.text.trim();

        state = match state {
            AssemblyState::Accumulating(mut open) if continues(&open, &candidate, options) => {
                open.text.push(' ');
                open.text.push_str(text);
                open.last = candidate.block;
                AssemblyState::Accumulating(open)
            }
            AssemblyState::Accumulating(open) => {
                entries.push(close(open, options));
                AssemblyState::Accumulating(OpenHeading {
                    level: candidate.level,
                    text: text.to_string(),
                    first: candidate.block,
                    last: candidate.block,
                })
            }
            AssemblyState::Idle => AssemblyState::Accumulating(OpenHeading {
                level: candidate.level,
                text: text.to_string(),
                first: candidate.block,
                last: candidate.block,
            }),
        };
    }

    if let AssemblyState::Accumulating(open) = state {
        entries.push(close(open, options));
    }

    entries
}
