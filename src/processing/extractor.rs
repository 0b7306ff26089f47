//! PDF page splitting.
//!
//! `pdf-extract` returns one big string per document with form-feed
//! characters (`\x0c`) marking page boundaries. [`parse_pdf_with_pages`]
//! splits on those and records each page's character-offset range so
//! downstream code can map any substring back to a page number.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));
static RE_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("invalid newlines regex"));

/// Text with page boundary information for accurate chunk-to-page mapping.
#[derive(Debug, Clone)]
pub struct PagedText {
    /// Full concatenated text (form-feed separators removed).
    pub text: String,
    /// Page boundaries: (start_offset, end_offset, page_number).
    pub page_boundaries: Vec<(usize, usize, u32)>,
}

impl PagedText {
    /// Page number for a given character offset; past the last boundary
    /// falls back to the last page rather than `None`.
    pub fn page_for_offset(&self, offset: usize) -> Option<u32> {
        for (start, end, page) in &self.page_boundaries {
            if offset >= *start && offset < *end {
                return Some(*page);
            }
        }
        self.page_boundaries.last().map(|(_, _, p)| *p)
    }
}

/// Normalizes whitespace in extracted text: collapses runs of whitespace
/// to single spaces, strips control characters, and caps blank-line runs
/// at two newlines.
pub fn clean_text(text: &str) -> String {
    let cleaned = RE_WHITESPACE.replace_all(text, " ");
    let cleaned: String = cleaned.chars().filter(|c| !c.is_control() || *c == '\n' || *c == '\t').collect();
    let cleaned = cleaned.replace("\r\n", "\n").replace('\r', "\n");
    let cleaned = RE_NEWLINES.replace_all(&cleaned, "\n\n");
    cleaned.trim().to_string()
}

/// Splits `pdf_text` (as returned by `pdf_extract::extract_text_from_mem`)
/// on its form-feed page separators and tracks each page's offset range.
pub fn parse_pdf_with_pages(pdf_text: &str) -> PagedText {
    let mut text = String::new();
    let mut page_boundaries = Vec::new();
    let mut current_page = 1u32;
    let mut current_start = 0usize;

    for (idx, segment) in pdf_text.split('\x0c').enumerate() {
        if segment.is_empty() {
            continue;
        }

        if idx > 0 && !text.is_empty() {
            page_boundaries.push((current_start, text.len(), current_page));
            current_start = text.len();
            current_page += 1;
            text.push('\n');
        }

        text.push_str(segment);
    }

    if current_start < text.len() || page_boundaries.is_empty() {
        page_boundaries.push((current_start, text.len().max(1), current_page));
    }

    PagedText { text, page_boundaries }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        let input = "  Hello   World  \n\n\n\n  Test  ";
        let result = clean_text(input);
        assert_eq!(result, "Hello World Test");
    }

    #[test]
    fn test_parse_pdf_with_pages() {
        let pdf_text = "Page one content\x0cPage two content\x0cPage three";
        let paged = parse_pdf_with_pages(pdf_text);

        assert_eq!(paged.page_boundaries.len(), 3);
        assert_eq!(paged.page_boundaries[0].2, 1);
        assert_eq!(paged.page_boundaries[1].2, 2);
        assert_eq!(paged.page_boundaries[2].2, 3);
        assert!(!paged.text.contains('\x0c'));
    }

    #[test]
    fn test_page_for_offset() {
        let paged = PagedText { text: "0123456789".to_string(), page_boundaries: vec![(0, 5, 1), (5, 10, 2)] };

        assert_eq!(paged.page_for_offset(0), Some(1));
        assert_eq!(paged.page_for_offset(4), Some(1));
        assert_eq!(paged.page_for_offset(5), Some(2));
        assert_eq!(paged.page_for_offset(9), Some(2));
        assert_eq!(paged.page_for_offset(100), Some(2));
    }
}
