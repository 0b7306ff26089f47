//! The OCR black-box boundary.
//!
//! The core never calls out to a concrete OCR backend directly; it depends
//! on this trait so a caller can plug in whatever recognizer is available
//! (a local Tesseract binary, a cloud API, a test double) without the
//! pipeline's fan-out/timeout/budget logic in [`super`] changing.

use async_trait::async_trait;

/// Recognizes text on one page of one source document. Returns `None` if
/// the engine has nothing to offer for that page (unavailable, blank page,
/// recognition failure) rather than an empty string, so callers can tell
/// "ran and found nothing" apart from "didn't run".
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, source_document_id: &str, page_number: u32, dpi: u32) -> Option<String>;
}

/// An engine that never produces text. Used when OCR is configured but no
/// backend is wired in, and in tests that only exercise the fan-out logic.
pub struct NullOcrEngine;

#[async_trait]
impl OcrEngine for NullOcrEngine {
    async fn recognize(&self, _source_document_id: &str, _page_number: u32, _dpi: u32) -> Option<String> {
        None
    }
}
