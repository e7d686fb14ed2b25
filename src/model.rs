//! Data model shared by every pipeline stage
//!
//! Blocks come in from the extractor, outlines go out to serialization.
//! Nothing here carries behaviour beyond small accessors.

use serde::{Deserialize, Serialize};

/// US Letter, assumed for pages whose height is unknown
pub const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

/// Axis-aligned box in page space, top-down (y grows towards the page bottom)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Smallest box covering both
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Horizontal distance between the two boxes, zero when they overlap
    pub fn horizontal_gap(&self, other: &BoundingBox) -> f32 {
        (other.x0 - self.x1).max(self.x0 - other.x1).max(0.0)
    }
}

/// A line or paragraph-like unit of text with its dominant visual attributes
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    /// The text content
    pub text: String,
    /// Page index (0-based)
    pub page: u32,
    /// Dominant font size in points
    pub font_size: f32,
    /// Whether the dominant font is a bold face
    pub is_bold: bool,
    /// Position on the page
    pub bbox: BoundingBox,
    /// Position in document reading order
    pub block_index: usize,
}

impl TextBlock {
    /// Number of visible characters, used to weight font-size frequencies
    pub fn char_count(&self) -> usize {
        self.text.chars().filter(|c| !c.is_whitespace()).count()
    }
}

/// Heading level, ordered from most to least prominent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    /// Map a size rank (0 = largest elevated size) to a level
    pub fn from_rank(rank: usize) -> Option<Self> {
        match rank {
            0 => Some(HeadingLevel::H1),
            1 => Some(HeadingLevel::H2),
            2 => Some(HeadingLevel::H3),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HeadingLevel::H1 => "H1",
            HeadingLevel::H2 => "H2",
            HeadingLevel::H3 => "H3",
        }
    }
}

impl std::fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One heading in the final outline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: HeadingLevel,
    pub text: String,
    pub page: u32,
}

/// Title plus ordered headings of one document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentOutline {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
}

impl DocumentOutline {
    /// Pretty JSON, two-space indented
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
