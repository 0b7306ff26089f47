//! Citation post-processing (component G).
//!
//! Extractors build citations inline with whatever bbox information is
//! available to them; this pass is the single place that guarantees every
//! citation has a `text_hash` and that a missing/zero bbox has been flagged
//! with a `BBOX_FALLBACK` warning exactly once.

use crate::extractors::common::text_hash;
use crate::model::{Citation, Layout};
use crate::warning::{Warning, WarningCode};

/// Backfills `text_hash` where empty and emits a `BBOX_FALLBACK` warning for
/// every citation still carrying the default (all-zero) bbox. Returns the
/// (possibly patched) citations plus any warnings raised.
pub fn finalize_citations(mut citations: Vec<Citation>) -> (Vec<Citation>, Vec<Warning>) {
    let mut warnings = Vec::new();

    for citation in citations.iter_mut() {
        if citation.text_hash.is_empty() {
            citation.text_hash = text_hash(&citation.snippet);
        }
        if citation.bbox == Layout::default() {
            warnings.push(
                Warning::new(WarningCode::BboxFallback, "Citation has no bbox; using whole-page fallback")
                    .with_page(citation.page_number)
                    .with_document(citation.source_document_id.clone()),
            );
        }
    }

    (citations, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn citation(bbox: Layout, text_hash: &str) -> Citation {
        Citation {
            citation_id: "c1".to_string(),
            source_document_id: "sd1".to_string(),
            page_number: 1,
            snippet: "Back pain reported".to_string(),
            bbox,
            text_hash: text_hash.to_string(),
        }
    }

    #[test]
    fn test_backfills_missing_text_hash() {
        let (out, _warnings) = finalize_citations(vec![citation(Layout { x: 1.0, y: 1.0, w: 1.0, h: 1.0 }, "")]);
        assert!(!out[0].text_hash.is_empty());
    }

    #[test]
    fn test_flags_zero_bbox_with_warning() {
        let (_out, warnings) = finalize_citations(vec![citation(Layout::default(), "abc")]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, "BBOX_FALLBACK");
    }

    #[test]
    fn test_non_zero_bbox_raises_no_warning() {
        let (_out, warnings) = finalize_citations(vec![citation(Layout { x: 1.0, y: 1.0, w: 1.0, h: 1.0 }, "abc")]);
        assert!(warnings.is_empty());
    }
}
