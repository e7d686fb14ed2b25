//! Block extraction from PDF using lopdf
//!
//! Walks each page's content stream for text show operators, groups the
//! positioned items into lines (two-column aware) and turns every line into
//! a `TextBlock` with its dominant size, weight and a top-down bounding box.

use crate::model::{BoundingBox, TextBlock, DEFAULT_PAGE_HEIGHT};
use crate::profile::size_key;
use crate::OutlineError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Approximate glyph advance as a fraction of the font size
const AVERAGE_GLYPH_WIDTH: f32 = 0.5;

/// A text item with position information
#[derive(Debug, Clone)]
pub struct TextItem {
    /// The text content
    pub text: String,
    /// X position on page
    pub x: f32,
    /// Y position on page (PDF coordinates, origin at bottom-left)
    pub y: f32,
    /// Estimated width of text
    pub width: f32,
    /// Height (approximated from font size)
    pub height: f32,
    /// Base font name, or the resource name when unknown
    pub font: String,
    /// Font size
    pub font_size: f32,
    /// Set in a bold face
    pub is_bold: bool,
    /// Page number (1-indexed)
    pub page: u32,
}

/// A line of text (grouped text items)
#[derive(Debug, Clone)]
pub struct TextLine {
    pub items: Vec<TextItem>,
    pub y: f32,
    pub page: u32,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.items
            .iter()
            .map(|i| i.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Everything the outline pipeline needs from one PDF
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Blocks in reading order, pages 0-based
    pub blocks: Vec<TextBlock>,
    pub page_count: u32,
    /// Page index (0-based) -> MediaBox height
    pub page_heights: BTreeMap<u32, f32>,
    /// Info dictionary title, if any
    pub metadata_title: Option<String>,
}

/// Positioned items plus the height of every page they came from
struct PositionedText {
    items: Vec<TextItem>,
    page_heights: HashMap<u32, f32>,
}

/// Check if a font name indicates a bold face
pub fn is_bold_font(font_name: &str) -> bool {
    let lower = font_name.to_lowercase();
    ["bold", "black", "heavy", "semibold", "demi"]
        .iter()
        .any(|p| lower.contains(p))
}

/// Extract text blocks from a PDF file
pub fn extract_blocks<P: AsRef<Path>>(path: P) -> Result<ExtractedDocument, OutlineError> {
    let doc = Document::load(path)?;
    extract_blocks_from_doc(&doc)
}

/// Extract text blocks from a PDF memory buffer
pub fn extract_blocks_mem(buffer: &[u8]) -> Result<ExtractedDocument, OutlineError> {
    let doc = Document::load_mem(buffer)?;
    extract_blocks_from_doc(&doc)
}

fn extract_blocks_from_doc(doc: &Document) -> Result<ExtractedDocument, OutlineError> {
    let page_count = doc.get_pages().len() as u32;
    if page_count == 0 {
        return Err(OutlineError::InvalidStructure);
    }
    let positioned = extract_positioned_text_from_doc(doc)?;
    let lines = group_into_lines(positioned.items);
    let blocks = lines_to_blocks(&lines, &positioned.page_heights);

    log::debug!(
        "extracted {} blocks from {} lines over {} pages",
        blocks.len(),
        lines.len(),
        page_count
    );

    let page_heights = positioned
        .page_heights
        .iter()
        .map(|(&page, &height)| (page.saturating_sub(1), height))
        .collect();

    Ok(ExtractedDocument {
        blocks,
        page_count,
        page_heights,
        metadata_title: get_document_title(doc),
    })
}

/// Extract positioned text from loaded document
fn extract_positioned_text_from_doc(doc: &Document) -> Result<PositionedText, OutlineError> {
    let pages = doc.get_pages();
    let mut items = Vec::new();
    let mut page_heights = HashMap::with_capacity(pages.len());

    for (page_num, &page_id) in pages.iter() {
        page_heights.insert(*page_num, page_height(doc, page_id));
        items.extend(extract_page_text_items(doc, page_id, *page_num)?);
    }

    Ok(PositionedText {
        items,
        page_heights,
    })
}

/// Page height from the MediaBox, following inherited attributes up the page tree
fn page_height(doc: &Document, page_id: ObjectId) -> f32 {
    let mut current = doc.get_dictionary(page_id).ok();

    while let Some(dict) = current {
        if let Ok(media_box) = dict.get(b"MediaBox").and_then(|o| o.as_array()) {
            let bounds: Vec<f32> = media_box.iter().filter_map(get_number).collect();
            if bounds.len() == 4 {
                return (bounds[3] - bounds[1]).abs();
            }
        }
        current = dict
            .get(b"Parent")
            .and_then(|o| o.as_reference())
            .and_then(|id| doc.get_dictionary(id))
            .ok();
    }

    DEFAULT_PAGE_HEIGHT
}

/// Multiply two 2D transformation matrices
/// Matrix format: [a, b, c, d, e, f] representing:
/// | a  b  0 |
/// | c  d  0 |
/// | e  f  1 |
fn multiply_matrices(m1: &[f32; 6], m2: &[f32; 6]) -> [f32; 6] {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

/// Text state while walking a content stream
struct TextState<'a> {
    ctm: [f32; 6],
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    font_resource: String,
    font_size: f32,
    leading: f32,
    fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>,
    base_fonts: HashMap<String, String>,
}

impl TextState<'_> {
    fn next_line(&mut self) {
        let leading = if self.leading > 0.0 {
            self.leading
        } else {
            self.font_size * 1.2 // Approximate line height
        };
        self.line_matrix[5] -= leading;
        self.text_matrix = self.line_matrix;
    }

    /// Build an item for decoded text at the current text position
    fn item(&self, text: String, page: u32) -> Option<TextItem> {
        if text.trim().is_empty() {
            return None;
        }
        let rendered_size = effective_font_size(self.font_size, &self.text_matrix);
        // Transform position through CTM
        let combined = multiply_matrices(&self.text_matrix, &self.ctm);
        let font = self
            .base_fonts
            .get(&self.font_resource)
            .cloned()
            .unwrap_or_else(|| self.font_resource.clone());

        Some(TextItem {
            width: text.chars().count() as f32 * rendered_size * AVERAGE_GLYPH_WIDTH,
            is_bold: is_bold_font(&font),
            text,
            x: combined[4],
            y: combined[5],
            height: rendered_size,
            font,
            font_size: rendered_size,
            page,
        })
    }

    fn decode(&self, obj: &Object, doc: &Document) -> Option<String> {
        extract_text_from_operand(obj, doc, self.fonts, &self.font_resource)
    }
}

/// Extract text items from a single page
fn extract_page_text_items(
    doc: &Document,
    page_id: ObjectId,
    page_num: u32,
) -> Result<Vec<TextItem>, OutlineError> {
    use lopdf::content::Content;

    let mut items = Vec::new();

    // Get fonts for encoding
    let fonts = doc.get_page_fonts(page_id).unwrap_or_default();
    let base_fonts = fonts
        .iter()
        .filter_map(|(name, dict)| {
            let base = dict.get(b"BaseFont").ok()?.as_name().ok()?;
            Some((
                String::from_utf8_lossy(name).to_string(),
                String::from_utf8_lossy(base).to_string(),
            ))
        })
        .collect();

    let content_data = doc
        .get_page_content(page_id)
        .map_err(|e| OutlineError::Parse(e.to_string()))?;
    let content = Content::decode(&content_data).map_err(|e| OutlineError::Parse(e.to_string()))?;

    let mut state = TextState {
        ctm: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        text_matrix: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        line_matrix: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        font_resource: String::new(),
        font_size: 12.0,
        leading: 0.0,
        fonts: &fonts,
        base_fonts,
    };
    let mut ctm_stack: Vec<[f32; 6]> = Vec::new();
    let mut in_text_block = false;

    for op in &content.operations {
        match op.operator.as_str() {
            "q" => ctm_stack.push(state.ctm),
            "Q" => {
                if let Some(saved) = ctm_stack.pop() {
                    state.ctm = saved;
                }
            }
            "cm" => {
                if op.operands.len() >= 6 {
                    let new_matrix = [
                        get_number(&op.operands[0]).unwrap_or(1.0),
                        get_number(&op.operands[1]).unwrap_or(0.0),
                        get_number(&op.operands[2]).unwrap_or(0.0),
                        get_number(&op.operands[3]).unwrap_or(1.0),
                        get_number(&op.operands[4]).unwrap_or(0.0),
                        get_number(&op.operands[5]).unwrap_or(0.0),
                    ];
                    state.ctm = multiply_matrices(&new_matrix, &state.ctm);
                }
            }
            "BT" => {
                in_text_block = true;
                state.text_matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
                state.line_matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
            }
            "ET" => in_text_block = false,
            "Tf" => {
                if op.operands.len() >= 2 {
                    if let Ok(name) = op.operands[0].as_name() {
                        state.font_resource = String::from_utf8_lossy(name).to_string();
                    }
                    if let Some(size) = get_number(&op.operands[1]) {
                        state.font_size = size;
                    }
                }
            }
            "TL" => {
                if let Some(leading) = op.operands.first().and_then(get_number) {
                    state.leading = leading;
                }
            }
            "Td" | "TD" => {
                if op.operands.len() >= 2 {
                    let tx = get_number(&op.operands[0]).unwrap_or(0.0);
                    let ty = get_number(&op.operands[1]).unwrap_or(0.0);
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.line_matrix[4] += tx;
                    state.line_matrix[5] += ty;
                    state.text_matrix = state.line_matrix;
                }
            }
            "Tm" => {
                if op.operands.len() >= 6 {
                    for (i, operand) in op.operands.iter().take(6).enumerate() {
                        state.text_matrix[i] =
                            get_number(operand).unwrap_or(if i == 0 || i == 3 { 1.0 } else { 0.0 });
                    }
                    state.line_matrix = state.text_matrix;
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if in_text_block {
                    if let Some(item) = op
                        .operands
                        .first()
                        .and_then(|o| state.decode(o, doc))
                        .and_then(|text| state.item(text, page_num))
                    {
                        items.push(item);
                    }
                }
            }
            "TJ" => {
                if in_text_block {
                    if let Some(Ok(array)) = op.operands.first().map(|o| o.as_array()) {
                        let combined_text: String =
                            array.iter().filter_map(|o| state.decode(o, doc)).collect();
                        if let Some(item) = state.item(combined_text, page_num) {
                            items.push(item);
                        }
                    }
                }
            }
            "'" | "\"" => {
                if !in_text_block {
                    continue;
                }
                state.next_line();
                // The double quote operator carries spacing operands before the string
                if let Some(item) = op
                    .operands
                    .last()
                    .and_then(|o| state.decode(o, doc))
                    .and_then(|text| state.item(text, page_num))
                {
                    items.push(item);
                }
            }
            _ => {}
        }
    }

    Ok(items)
}

/// Helper to get f32 from Object
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Compute effective font size from base size and text matrix
/// Text matrix is [a, b, c, d, tx, ty] where a,d are scale factors
fn effective_font_size(base_size: f32, text_matrix: &[f32; 6]) -> f32 {
    let scale_x = (text_matrix[0].powi(2) + text_matrix[1].powi(2)).sqrt();
    let scale_y = (text_matrix[2].powi(2) + text_matrix[3].powi(2)).sqrt();
    // Use the larger of the two scales (usually they're equal for non-rotated text)
    base_size * scale_x.max(scale_y)
}

/// Extract text from a text operand, handling encoding
fn extract_text_from_operand(
    obj: &Object,
    doc: &Document,
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    current_font: &str,
) -> Option<String> {
    if let Object::String(bytes, _) = obj {
        // Try to decode using font encoding
        if let Some(font_dict) = fonts.get(current_font.as_bytes()) {
            if let Ok(encoding) = font_dict.get_font_encoding(doc) {
                if let Ok(text) = Document::decode_text(&encoding, bytes) {
                    return Some(text);
                }
            }
        }

        // Fallback: try UTF-16BE then Latin-1
        Some(decode_pdf_string(bytes))
    } else {
        None
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, otherwise Latin-1
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Get document title from Info dictionary
fn get_document_title(doc: &Document) -> Option<String> {
    let info_ref = doc.trailer.get(b"Info").ok()?.as_reference().ok()?;
    let info = doc.get_dictionary(info_ref).ok()?;

    match info.get(b"Title").ok()? {
        Object::String(bytes, _) => {
            let title = decode_pdf_string(bytes).trim().to_string();
            (!title.is_empty()).then_some(title)
        }
        _ => None,
    }
}

/// Represents a column region on a page
#[derive(Debug, Clone)]
struct ColumnRegion {
    x_min: f32,
    x_max: f32,
}

/// Detect column boundaries on a page based on X-position gaps
fn detect_columns(page_items: &[TextItem]) -> Vec<ColumnRegion> {
    if page_items.is_empty() {
        return vec![];
    }

    let x_min = page_items.iter().map(|i| i.x).fold(f32::INFINITY, f32::min);
    let x_max = page_items
        .iter()
        .map(|i| i.x + i.width.max(50.0)) // Estimate right edge
        .fold(f32::NEG_INFINITY, f32::max);
    let single = vec![ColumnRegion { x_min, x_max }];

    // Too narrow, or too few items to detect columns reliably
    let page_width = x_max - x_min;
    if page_width < 200.0 || page_items.len() < 20 {
        return single;
    }

    let mut x_positions: Vec<f32> = page_items.iter().map(|i| i.x).collect();
    x_positions.sort_by(|a, b| a.total_cmp(b));

    // A gap > 20% of page width suggests column boundary
    let gap_threshold = page_width * 0.20;
    let mut column_boundaries = vec![x_min];
    for window in x_positions.windows(2) {
        if window[1] - window[0] > gap_threshold {
            column_boundaries.push((window[0] + window[1]) / 2.0);
        }
    }
    column_boundaries.push(x_max + 1.0);

    let columns: Vec<ColumnRegion> = column_boundaries
        .windows(2)
        .map(|w| ColumnRegion {
            x_min: w[0],
            x_max: w[1],
        })
        .collect();

    let col_counts: Vec<usize> = columns
        .iter()
        .map(|col| {
            page_items
                .iter()
                .filter(|i| i.x >= col.x_min && i.x < col.x_max)
                .count()
        })
        .collect();
    // Each column should have at least 20% of the content
    let min_items = col_counts.iter().sum::<usize>() / 5;

    if columns.len() == 2 && col_counts.iter().all(|&c| c >= min_items) {
        return columns;
    }

    // For 3+ detected columns, merge around the outermost substantial ones
    if columns.len() > 2 {
        let first = col_counts.iter().position(|&c| c >= min_items);
        let last = col_counts.iter().rposition(|&c| c >= min_items);
        if let (Some(first), Some(last)) = (first, last) {
            if first != last {
                return vec![
                    ColumnRegion {
                        x_min: columns[0].x_min,
                        x_max: columns[first].x_max,
                    },
                    ColumnRegion {
                        x_min: columns[last].x_min,
                        x_max: columns[columns.len() - 1].x_max,
                    },
                ];
            }
        }
    }

    single
}

/// Group text items into lines, with multi-column support
pub fn group_into_lines(items: Vec<TextItem>) -> Vec<TextLine> {
    let mut by_page: BTreeMap<u32, Vec<TextItem>> = BTreeMap::new();
    for item in items {
        by_page.entry(item.page).or_default().push(item);
    }

    let mut all_lines = Vec::new();
    for page_items in by_page.into_values() {
        let columns = detect_columns(&page_items);

        if columns.len() <= 1 {
            all_lines.extend(group_single_column(page_items));
        } else {
            // Process each column separately, then concatenate
            for column in &columns {
                let col_items: Vec<TextItem> = page_items
                    .iter()
                    .filter(|i| i.x >= column.x_min && i.x < column.x_max)
                    .cloned()
                    .collect();
                all_lines.extend(group_single_column(col_items));
            }
        }
    }

    all_lines
}

/// Group items from a single column into lines
/// Preserves PDF stream order (which is typically reading order) and only groups
/// consecutive items on the same line by their Y position.
fn group_single_column(items: Vec<TextItem>) -> Vec<TextLine> {
    let y_tolerance = 3.0;
    let mut lines: Vec<TextLine> = Vec::new();

    for item in items {
        match lines.last_mut() {
            Some(last) if last.page == item.page && (last.y - item.y).abs() < y_tolerance => {
                last.items.push(item);
            }
            _ => lines.push(TextLine {
                y: item.y,
                page: item.page,
                items: vec![item],
            }),
        }
    }

    // Sort items within each line by X position (left to right)
    for line in &mut lines {
        line.items.sort_by(|a, b| a.x.total_cmp(&b.x));
    }

    lines
}

/// Convert lines to blocks in reading order
///
/// Pages become 0-based and y is flipped to top-down using each page's
/// height. Size and weight are whichever covers the most characters; a
/// size tie goes to the larger size.
pub fn lines_to_blocks(lines: &[TextLine], page_heights: &HashMap<u32, f32>) -> Vec<TextBlock> {
    let mut blocks = Vec::with_capacity(lines.len());

    for line in lines {
        let text = line.text();
        if text.is_empty() {
            continue;
        }
        let height = page_heights
            .get(&line.page)
            .copied()
            .unwrap_or(DEFAULT_PAGE_HEIGHT);

        let mut size_weights: BTreeMap<i32, (usize, f32)> = BTreeMap::new();
        let mut bold_chars = 0;
        let mut total_chars = 0;
        let mut bbox: Option<BoundingBox> = None;

        for item in &line.items {
            let chars = item.text.chars().filter(|c| !c.is_whitespace()).count();
            let entry = size_weights
                .entry(size_key(item.font_size))
                .or_insert((0, item.font_size));
            entry.0 += chars;
            total_chars += chars;
            if item.is_bold {
                bold_chars += chars;
            }

            let baseline = height - item.y;
            let item_box = BoundingBox::new(
                item.x,
                baseline - item.font_size,
                item.x + item.width,
                baseline,
            );
            bbox = Some(bbox.map_or(item_box, |b| b.union(&item_box)));
        }

        let font_size = size_weights
            .values()
            .max_by_key(|(count, _)| *count)
            .map(|&(_, size)| size)
            .unwrap_or(0.0);

        blocks.push(TextBlock {
            text,
            page: line.page.saturating_sub(1),
            font_size,
            is_bold: bold_chars * 2 > total_chars,
            bbox: bbox.unwrap_or_default(),
            block_index: blocks.len(),
        });
    }

    blocks
}
