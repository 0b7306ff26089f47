//! Document segmenter (component C).
//!
//! Walks pages in order and starts a new `Document` whenever the page type
//! changes, building per-type spans within each document. The dominant span
//! (most pages) becomes the document's declared type.

use uuid::Uuid;

use crate::model::{Document, Page, PageTypeSpan};

pub fn segment_documents(pages: &[Page]) -> Vec<Document> {
    let mut documents = Vec::new();
    if pages.is_empty() {
        return documents;
    }

    let mut sorted: Vec<&Page> = pages.iter().collect();
    sorted.sort_by_key(|p| p.page_number);

    let mut current_source_doc = sorted[0].source_document_id.clone();
    let mut spans: Vec<PageTypeSpan> = Vec::new();
    let mut doc_start = sorted[0].page_number;

    for (i, page) in sorted.iter().enumerate() {
        let page_type_changed = spans.last().map(|s| s.page_type != page.page_type).unwrap_or(true);
        let source_doc_changed = page.source_document_id != current_source_doc;

        if source_doc_changed {
            documents.push(finalize_document(&current_source_doc, doc_start, spans.clone()));
            spans.clear();
            current_source_doc = page.source_document_id.clone();
            doc_start = page.page_number;
        }

        if page_type_changed || source_doc_changed {
            spans.push(PageTypeSpan {
                start: page.page_number,
                end: page.page_number,
                page_type: page.page_type,
            });
        } else if let Some(last) = spans.last_mut() {
            last.end = page.page_number;
        }

        if i == sorted.len() - 1 {
            documents.push(finalize_document(&current_source_doc, doc_start, spans.clone()));
        }
    }

    documents
}

fn finalize_document(source_document_id: &str, page_start: u32, spans: Vec<PageTypeSpan>) -> Document {
    let page_end = spans.last().map(|s| s.end).unwrap_or(page_start);
    let declared_type = spans
        .iter()
        .max_by_key(|s| s.end - s.start + 1)
        .map(|s| s.page_type)
        .unwrap_or(crate::model::PageType::Other);
    let confidence = if spans.len() == 1 { 90 } else { 70 };

    Document {
        document_id: Uuid::new_v4().to_string(),
        source_document_id: source_document_id.to_string(),
        page_start,
        page_end,
        page_types: spans,
        declared_type,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PageType, TextSource};

    fn page(num: u32, doc: &str, pt: PageType) -> Page {
        Page {
            page_id: format!("p{num}"),
            source_document_id: doc.to_string(),
            page_number: num,
            text: String::new(),
            text_source: TextSource::Embedded,
            page_type: pt,
            layout: None,
        }
    }

    #[test]
    fn test_single_document_single_span() {
        let pages = vec![
            page(1, "sd1", PageType::ClinicalNote),
            page(2, "sd1", PageType::ClinicalNote),
        ];
        let docs = segment_documents(&pages);
        assert_eq!(docs.len(), 1);
        assert!(docs[0].spans_are_contiguous());
        assert_eq!(docs[0].declared_type, PageType::ClinicalNote);
    }

    #[test]
    fn test_type_change_starts_new_span_same_document() {
        let pages = vec![
            page(1, "sd1", PageType::ClinicalNote),
            page(2, "sd1", PageType::Lab),
            page(3, "sd1", PageType::Lab),
        ];
        let docs = segment_documents(&pages);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].page_types.len(), 2);
        assert_eq!(docs[0].declared_type, PageType::Lab);
    }

    #[test]
    fn test_source_document_change_starts_new_document() {
        let pages = vec![
            page(1, "sd1", PageType::ClinicalNote),
            page(2, "sd2", PageType::Billing),
        ];
        let docs = segment_documents(&pages);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].source_document_id, "sd1");
        assert_eq!(docs[1].source_document_id, "sd2");
    }

    #[test]
    fn test_empty_input() {
        assert!(segment_documents(&[]).is_empty());
    }
}
