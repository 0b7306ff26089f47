//! Text acquisition (the admission half of component A): turns a
//! validated `SourceDocument`'s raw bytes into per-page `Page` records.
//!
//! Embedded PDF text is extracted with `pdf-extract` and split into pages
//! on its form-feed page separators (`parse_pdf_with_pages`). A page whose
//! embedded text is too sparse to be useful falls back to the OCR engine
//! boundary in [`ocr`], which fans out up to `OCR_WORKERS` concurrent
//! recognition calls bounded by a per-page and an overall timeout.

pub mod extractor;
pub mod ocr;

pub use extractor::{parse_pdf_with_pages, PagedText};

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::EnvConfig;
use crate::model::{Page, PageType, TextSource};
use crate::warning::{Warning, WarningCode};
use ocr::OcrEngine;

/// Below this many non-whitespace characters, a page's embedded text is
/// treated as "no usable text" and routed to OCR.
const MIN_EMBEDDED_CHARS: usize = 20;

/// Extracts every page of `pdf_bytes` belonging to `source_document_id`,
/// OCRing any page whose embedded text is too sparse. `page_number_offset`
/// lets the caller assign globally unique page numbers across multiple
/// source documents in the same run.
pub async fn acquire_pages(
    source_document_id: &str,
    pdf_bytes: &[u8],
    page_number_offset: u32,
    env: &EnvConfig,
    ocr_engine: &Arc<dyn OcrEngine>,
    cancel: &CancellationToken,
) -> (Vec<Page>, Vec<Warning>) {
    let mut warnings = Vec::new();

    let embedded_text = match pdf_extract::extract_text_from_mem(pdf_bytes) {
        Ok(text) => text,
        Err(e) => {
            warnings.push(
                Warning::new(WarningCode::OcrNoText, format!("embedded text extraction failed: {e}"))
                    .with_document(source_document_id.to_string()),
            );
            String::new()
        }
    };
    let paged = parse_pdf_with_pages(&embedded_text);

    let mut segments: Vec<String> = Vec::new();
    for (idx, (start, end, _)) in paged.page_boundaries.iter().enumerate() {
        let _ = idx;
        segments.push(paged.text[*start..*end].to_string());
    }
    if segments.is_empty() {
        segments.push(String::new());
    }

    if env.disable_ocr {
        let mut pages = Vec::with_capacity(segments.len());
        for (idx, text) in segments.into_iter().enumerate() {
            let page_number = page_number_offset + idx as u32 + 1;
            if text.trim().chars().count() < MIN_EMBEDDED_CHARS {
                warnings.push(
                    Warning::new(WarningCode::OcrDisabled, "OCR disabled; page has no usable embedded text")
                        .with_page(page_number)
                        .with_document(source_document_id.to_string()),
                );
            }
            pages.push(blank_page(source_document_id, page_number, text));
        }
        return (pages, warnings);
    }

    let needs_ocr: Vec<usize> = segments
        .iter()
        .enumerate()
        .filter(|(_, text)| text.trim().chars().count() < MIN_EMBEDDED_CHARS)
        .map(|(idx, _)| idx)
        .collect();

    let ocr_results = run_ocr_fanout(source_document_id, &needs_ocr, page_number_offset, env, ocr_engine, cancel).await;

    let mut pages = Vec::with_capacity(segments.len());
    for (idx, text) in segments.into_iter().enumerate() {
        let page_number = page_number_offset + idx as u32 + 1;
        if let Some(outcome) = ocr_results.get(&idx) {
            match outcome {
                OcrOutcome::Text(ocr_text) => {
                    pages.push(Page {
                        page_id: Uuid::new_v4().to_string(),
                        source_document_id: source_document_id.to_string(),
                        page_number,
                        text: ocr_text.clone(),
                        text_source: TextSource::Ocr,
                        page_type: PageType::Other,
                        layout: None,
                    });
                }
                OcrOutcome::Warning(code, message) => {
                    warnings.push(Warning::new(*code, message.clone()).with_page(page_number).with_document(source_document_id.to_string()));
                    pages.push(blank_page(source_document_id, page_number, text));
                }
            }
        } else {
            pages.push(blank_page(source_document_id, page_number, text));
        }
    }

    (pages, warnings)
}

fn blank_page(source_document_id: &str, page_number: u32, text: String) -> Page {
    Page {
        page_id: Uuid::new_v4().to_string(),
        source_document_id: source_document_id.to_string(),
        page_number,
        text,
        text_source: TextSource::Embedded,
        page_type: PageType::Other,
        layout: None,
    }
}

enum OcrOutcome {
    Text(String),
    Warning(WarningCode, String),
}

/// Runs OCR over the pages listed in `indices`, at most `env.ocr_workers`
/// concurrently, each bounded by `env.ocr_timeout_seconds`, the whole batch
/// bounded by `env.ocr_total_timeout_seconds`. Pages still queued when the
/// overall budget expires are reported as `OCR_BUDGET_EXCEEDED` rather than
/// run past the deadline.
async fn run_ocr_fanout(
    source_document_id: &str,
    indices: &[usize],
    page_number_offset: u32,
    env: &EnvConfig,
    ocr_engine: &Arc<dyn OcrEngine>,
    cancel: &CancellationToken,
) -> std::collections::HashMap<usize, OcrOutcome> {
    let mut out = std::collections::HashMap::new();
    if indices.is_empty() {
        return out;
    }

    let semaphore = Arc::new(Semaphore::new(env.ocr_workers.max(1)));
    let deadline = Instant::now() + Duration::from_secs(env.ocr_total_timeout_seconds);
    let per_page_timeout = Duration::from_secs(env.ocr_timeout_seconds);

    let mut handles = Vec::with_capacity(indices.len());
    for &idx in indices {
        if Instant::now() >= deadline {
            out.insert(idx, OcrOutcome::Warning(WarningCode::OcrBudgetExceeded, "overall OCR time budget exceeded before this page started".to_string()));
            continue;
        }

        let permit = Arc::clone(&semaphore);
        let engine = Arc::clone(ocr_engine);
        let doc_id = source_document_id.to_string();
        let page_number = page_number_offset + idx as u32 + 1;
        let dpi = env.ocr_dpi;
        let cancel = cancel.clone();

        handles.push((idx, tokio::spawn(async move {
            let _permit = permit.acquire_owned().await.ok();
            tokio::select! {
                _ = cancel.cancelled() => TaskOutcome::Cancelled,
                result = tokio::time::timeout(per_page_timeout, engine.recognize(&doc_id, page_number, dpi)) => {
                    match result {
                        Err(_) => TaskOutcome::TimedOut,
                        Ok(None) => TaskOutcome::Empty,
                        Ok(Some(text)) => TaskOutcome::Text(text),
                    }
                }
            }
        })));
    }

    for (idx, handle) in handles {
        match handle.await {
            Ok(TaskOutcome::Text(text)) if !text.trim().is_empty() => {
                out.insert(idx, OcrOutcome::Text(text));
            }
            Ok(TaskOutcome::Text(_)) | Ok(TaskOutcome::Empty) => {
                out.insert(idx, OcrOutcome::Warning(WarningCode::OcrNoText, "OCR engine returned no text".to_string()));
            }
            Ok(TaskOutcome::TimedOut) => {
                out.insert(idx, OcrOutcome::Warning(WarningCode::OcrTimeout, "OCR call exceeded the per-page timeout".to_string()));
            }
            Ok(TaskOutcome::Cancelled) => {
                out.insert(idx, OcrOutcome::Warning(WarningCode::OcrTimeout, "OCR call cancelled".to_string()));
            }
            Err(_) => {
                out.insert(idx, OcrOutcome::Warning(WarningCode::OcrUnavailable, "OCR task panicked".to_string()));
            }
        }
    }

    out
}

enum TaskOutcome {
    Text(String),
    Empty,
    TimedOut,
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocr::NullOcrEngine;

    #[tokio::test]
    async fn test_acquire_pages_disabled_ocr_flags_sparse_pages() {
        let env = EnvConfig { disable_ocr: true, ..EnvConfig::default() };
        let engine: Arc<dyn OcrEngine> = Arc::new(NullOcrEngine);
        let cancel = CancellationToken::new();
        let (pages, warnings) = acquire_pages("doc-1", b"", 0, &env, &engine, &cancel).await;
        assert_eq!(pages.len(), 1);
        assert!(warnings.iter().any(|w| w.code == "OCR_DISABLED"));
    }

    #[tokio::test]
    async fn test_acquire_pages_with_ocr_falls_back_on_no_text() {
        let env = EnvConfig { ocr_workers: 2, ocr_total_timeout_seconds: 5, ocr_timeout_seconds: 2, ..EnvConfig::default() };
        let engine: Arc<dyn OcrEngine> = Arc::new(NullOcrEngine);
        let cancel = CancellationToken::new();
        let (pages, warnings) = acquire_pages("doc-1", b"", 0, &env, &engine, &cancel).await;
        assert_eq!(pages.len(), 1);
        assert!(warnings.iter().any(|w| w.code == "OCR_NO_TEXT" || w.code == "OCR_UNAVAILABLE"));
    }
}
