use serde::{Deserialize, Serialize};

use super::page::PageType;

/// One contiguous run of pages, within a `Document`, sharing a page type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageTypeSpan {
    pub start: u32,
    pub end: u32,
    pub page_type: PageType,
}

/// A segment: a contiguous group of pages of the same dominant semantic
/// class. Invariant: `page_start <= page_end`; `page_types` spans cover
/// `[page_start, page_end]` without gaps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub document_id: String,
    pub source_document_id: String,
    pub page_start: u32,
    pub page_end: u32,
    pub page_types: Vec<PageTypeSpan>,
    pub declared_type: PageType,
    pub confidence: i32,
}

impl Document {
    /// The spans partition `[page_start, page_end]` exactly: sorted, abutting,
    /// no overlap, no gap.
    pub fn spans_are_contiguous(&self) -> bool {
        if self.page_types.is_empty() {
            return false;
        }
        let mut spans = self.page_types.clone();
        spans.sort_by_key(|s| s.start);
        if spans[0].start != self.page_start {
            return false;
        }
        for pair in spans.windows(2) {
            if pair[0].end + 1 != pair[1].start {
                return false;
            }
        }
        spans.last().unwrap().end == self.page_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: u32, end: u32, page_type: PageType) -> PageTypeSpan {
        PageTypeSpan { start, end, page_type }
    }

    #[test]
    fn test_contiguous_spans() {
        let doc = Document {
            document_id: "d1".into(),
            source_document_id: "sd1".into(),
            page_start: 1,
            page_end: 4,
            page_types: vec![
                span(1, 2, PageType::ClinicalNote),
                span(3, 4, PageType::Lab),
            ],
            declared_type: PageType::ClinicalNote,
            confidence: 80,
        };
        assert!(doc.spans_are_contiguous());
    }

    #[test]
    fn test_gap_detected() {
        let doc = Document {
            document_id: "d1".into(),
            source_document_id: "sd1".into(),
            page_start: 1,
            page_end: 4,
            page_types: vec![span(1, 2, PageType::ClinicalNote), span(4, 4, PageType::Lab)],
            declared_type: PageType::ClinicalNote,
            confidence: 80,
        };
        assert!(!doc.spans_are_contiguous());
    }
}
