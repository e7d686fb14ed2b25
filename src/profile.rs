//! Font size profile of a document
//!
//! Establishes which size is running body text and which larger sizes are
//! heading tiers. Built once per document and passed by reference into
//! classification.

use crate::model::{HeadingLevel, TextBlock};
use crate::OutlineError;
use std::collections::BTreeMap;

/// Only the three largest elevated sizes map to heading levels
pub const MAX_HEADING_TIERS: usize = 3;

/// Font sizes are compared at 0.1pt resolution
pub fn size_key(font_size: f32) -> i32 {
    (font_size * 10.0).round() as i32
}

fn key_to_size(key: i32) -> f32 {
    key as f32 / 10.0
}

/// Weighted font size statistics for one document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FontProfile {
    /// Size key -> visible character count set in that size
    size_frequency: BTreeMap<i32, usize>,
    body_key: Option<i32>,
    /// Elevated size keys, descending, at most MAX_HEADING_TIERS
    ranked_keys: Vec<i32>,
    /// Number of distinct elevated sizes before truncation
    elevated_tiers: usize,
}

impl FontProfile {
    /// Tally every block's size weighted by its character count
    pub fn from_blocks<'a, I>(blocks: I) -> Self
    where
        I: IntoIterator<Item = &'a TextBlock>,
    {
        let mut size_frequency: BTreeMap<i32, usize> = BTreeMap::new();
        for block in blocks {
            *size_frequency.entry(size_key(block.font_size)).or_insert(0) +=
                block.char_count().max(1);
        }

        // Ascending iteration with a strict comparison: ties go to the smaller size
        let mut body: Option<(i32, usize)> = None;
        for (&key, &count) in &size_frequency {
            if body.map_or(true, |(_, best)| count > best) {
                body = Some((key, count));
            }
        }

        Self::ranked(size_frequency, body.map(|(key, _)| key))
    }

    /// Profile with the given blocks' weight removed; the body size is kept
    ///
    /// Used to drop the title from the pool so a title-only size does not
    /// take the H1 tier.
    pub fn without<'a, I>(&self, removed: I) -> Self
    where
        I: IntoIterator<Item = &'a TextBlock>,
    {
        let mut size_frequency = self.size_frequency.clone();
        for block in removed {
            let key = size_key(block.font_size);
            if let Some(count) = size_frequency.get_mut(&key) {
                *count = count.saturating_sub(block.char_count().max(1));
                if *count == 0 {
                    size_frequency.remove(&key);
                }
            }
        }
        Self::ranked(size_frequency, self.body_key)
    }

    fn ranked(size_frequency: BTreeMap<i32, usize>, body_key: Option<i32>) -> Self {
        let elevated: Vec<i32> = match body_key {
            Some(body) => size_frequency
                .keys()
                .rev()
                .copied()
                .filter(|&key| key > body)
                .collect(),
            None => Vec::new(),
        };
        let elevated_tiers = elevated.len();
        let ranked_keys = elevated.into_iter().take(MAX_HEADING_TIERS).collect();

        FontProfile {
            size_frequency,
            body_key,
            ranked_keys,
            elevated_tiers,
        }
    }

    /// The size judged to be running text (0.0 for an empty document)
    pub fn body_size(&self) -> f32 {
        self.body_key.map(key_to_size).unwrap_or(0.0)
    }

    /// Heading tier sizes, largest first
    pub fn ranked_sizes(&self) -> Vec<f32> {
        self.ranked_keys.iter().copied().map(key_to_size).collect()
    }

    /// (size, weighted count) pairs in ascending size order
    pub fn size_frequency(&self) -> impl Iterator<Item = (f32, usize)> + '_ {
        self.size_frequency
            .iter()
            .map(|(&key, &count)| (key_to_size(key), count))
    }

    /// Distinct sizes above body, including those past the third tier
    pub fn elevated_tiers(&self) -> usize {
        self.elevated_tiers
    }

    /// True when no size is larger than the body size
    pub fn is_uniform(&self) -> bool {
        self.ranked_keys.is_empty()
    }

    /// Strictly larger than body text
    pub fn is_elevated(&self, font_size: f32) -> bool {
        self.body_key
            .map_or(false, |body| size_key(font_size) > body)
    }

    /// Rank of an elevated size (0 = largest), `None` past the third tier
    pub fn rank_of(&self, font_size: f32) -> Result<Option<usize>, OutlineError> {
        let key = size_key(font_size);
        let inconsistent = || OutlineError::InconsistentProfile {
            font_size,
            body_size: self.body_size(),
        };

        if !self.is_elevated(font_size) {
            return Ok(None);
        }
        if self.ranked_keys.is_empty() {
            return Err(inconsistent());
        }
        match self.ranked_keys.iter().position(|&k| k == key) {
            Some(rank) => Ok(Some(rank)),
            // Known elevated size below the third tier
            None if self.size_frequency.contains_key(&key) => Ok(None),
            None => Err(inconsistent()),
        }
    }

    /// Heading level for a font size, `None` for body or untiered sizes
    pub fn level_for(&self, font_size: f32) -> Result<Option<HeadingLevel>, OutlineError> {
        Ok(self.rank_of(font_size)?.and_then(HeadingLevel::from_rank))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;

    fn block(text: &str, font_size: f32, index: usize) -> TextBlock {
        TextBlock {
            text: text.to_string(),
            page: 0,
            font_size,
            is_bold: false,
            bbox: BoundingBox::new(72.0, index as f32 * 20.0, 300.0, index as f32 * 20.0 + font_size),
            block_index: index,
        }
    }

    #[test]
    fn test_body_size_weighted_by_characters() {
        // Three short headings at 18pt versus one long paragraph at 11pt
        let blocks = vec![
            block("Intro", 18.0, 0),
            block("Scope", 18.0, 1),
            block("Terms", 18.0, 2),
            block(
                "This paragraph is long enough that its characters outweigh every heading",
                11.0,
                3,
            ),
        ];
        let profile = FontProfile::from_blocks(&blocks);
        assert_eq!(profile.body_size(), 11.0);
        assert_eq!(profile.ranked_sizes(), vec![18.0]);
    }

    #[test]
    fn test_ranked_sizes_truncated_to_three() {
        let blocks = vec![
            block("A heading", 30.0, 0),
            block("A heading", 24.0, 1),
            block("A heading", 18.0, 2),
            block("A heading", 14.0, 3),
            block("body body body body body body body body body body", 10.0, 4),
        ];
        let profile = FontProfile::from_blocks(&blocks);
        assert_eq!(profile.ranked_sizes(), vec![30.0, 24.0, 18.0]);
        assert_eq!(profile.elevated_tiers(), 4);
        assert_eq!(profile.level_for(14.0).unwrap(), None);
        assert_eq!(profile.level_for(18.0).unwrap(), Some(HeadingLevel::H3));
    }

    #[test]
    fn test_uniform_document() {
        let blocks: Vec<_> = (0..5).map(|i| block("same size text", 12.0, i)).collect();
        let profile = FontProfile::from_blocks(&blocks);
        assert!(profile.is_uniform());
        assert!(!profile.is_elevated(12.0));
        assert_eq!(profile.level_for(12.0).unwrap(), None);
    }

    #[test]
    fn test_body_tie_prefers_smaller_size() {
        let blocks = vec![block("abcd", 14.0, 0), block("wxyz", 12.0, 1)];
        let profile = FontProfile::from_blocks(&blocks);
        assert_eq!(profile.body_size(), 12.0);
    }

    #[test]
    fn test_without_removes_title_tier() {
        let blocks = vec![
            block("Annual Report", 24.0, 0),
            block("Summary", 18.0, 1),
            block("body text body text body text body text", 12.0, 2),
        ];
        let profile = FontProfile::from_blocks(&blocks);
        assert_eq!(profile.ranked_sizes(), vec![24.0, 18.0]);

        let pool = profile.without(&blocks[..1]);
        assert_eq!(pool.body_size(), 12.0);
        assert_eq!(pool.ranked_sizes(), vec![18.0]);
    }

    #[test]
    fn test_unknown_elevated_size_is_inconsistent() {
        let blocks = vec![block("body body body", 12.0, 0)];
        let profile = FontProfile::from_blocks(&blocks);
        // Passes the size check but the profile has no tiers at all
        let err = profile.rank_of(20.0).unwrap_err();
        assert!(matches!(err, OutlineError::InconsistentProfile { .. }));
    }

    #[test]
    fn test_size_key_rounding() {
        assert_eq!(size_key(11.96), size_key(12.0));
        assert_ne!(size_key(12.0), size_key(12.2));
    }
}
