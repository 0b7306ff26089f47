//! Shared helpers used by every domain extractor: fact-pattern regex
//! families, citation construction with bbox-fallback, and date resolution
//! for a page.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::model::{Citation, DateSource, Document, Event, EventDate, Fact, FactKind, Page};
use crate::warning::{Warning, WarningCode};

pub static CHIEF_COMPLAINT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*chief complaint\s*[:#]\s*(.+)$").unwrap());
pub static ASSESSMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)^\s*assessment\s*[:#]\s*(.+)$").unwrap());
pub static PLAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)^\s*plan\s*[:#]\s*(.+)$").unwrap());
pub static IMPRESSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*impression\s*[:#]\s*(.+)$").unwrap());
pub static DIAGNOSIS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)^\s*diagnosis\s*[:#]\s*(.+)$").unwrap());
pub static MEDICATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([A-Z][a-zA-Z]+)\s+(\d+(?:\.\d+)?\s*(?:mg|mcg|ml|g))\b").unwrap()
});
pub static ROM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bROM\b[^.\n]{0,60}\d+\s*(?:deg|degrees|°)").unwrap());
pub static STRENGTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bstrength\b[^.\n]{0,40}\d/5").unwrap());
pub static PAIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bpain\b[^.\n]{0,40}\d{1,2}\s*/\s*10").unwrap());
pub static WORK_STATUS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*work status\s*[:#]\s*(.+)$").unwrap()
});
pub static PROCEDURE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*procedure(?: performed)?\s*[:#]\s*(.+)$").unwrap());

fn normalize_snippet(snippet: &str) -> String {
    snippet.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase()
}

pub fn text_hash(snippet: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_snippet(snippet).as_bytes());
    hex::encode(hasher.finalize())
}

/// Builds a citation for a snippet on a page; falls back to a whole-page
/// bbox and a `BBOX_FALLBACK` warning when no layout information is known
/// (text-only extraction, as with `pdf-extract`).
pub fn make_citation(page: &Page) -> (Citation, Option<Warning>) {
    let snippet: String = page.text.chars().take(300).collect();
    let bbox = page.layout.unwrap_or_default();
    let fallback = bbox == Default::default();
    let citation = Citation {
        citation_id: Uuid::new_v4().to_string(),
        source_document_id: page.source_document_id.clone(),
        page_number: page.page_number,
        snippet: snippet.clone(),
        bbox,
        text_hash: text_hash(&snippet),
    };
    let warning = if fallback {
        Some(Warning::new(WarningCode::BboxFallback, "No layout bbox available; using whole-page fallback").with_page(page.page_number))
    } else {
        None
    };
    (citation, warning)
}

pub fn fact_from_capture(re: &Regex, text: &str, kind: FactKind, citation_id: &str) -> Option<Fact> {
    re.captures(text).and_then(|c| c.get(1)).map(|m| Fact {
        text: m.as_str().trim().chars().take(300).collect(),
        kind,
        verbatim: true,
        citation_id: citation_id.to_string(),
    })
}

/// The date to assign an encounter on this page: the highest-tier date
/// extracted for the page, falling back to the page's document's
/// propagated date.
pub fn resolve_event_date(page_number: u32, dates: &[(u32, EventDate)]) -> Option<EventDate> {
    dates.iter().find(|(n, _)| *n == page_number).map(|(_, d)| d.clone())
}

pub fn fallback_unknown_date() -> EventDate {
    EventDate::single(chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(), DateSource::Anchor)
}

pub fn new_event_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn pages_of_type<'a>(pages: &'a [Page], documents: &[Document], matches: impl Fn(crate::model::PageType) -> bool) -> Vec<&'a Page> {
    let _ = documents;
    pages.iter().filter(|p| matches(p.page_type)).collect()
}

pub fn resolve_provider(
    page_number: u32,
    page_provider_map: &std::collections::HashMap<u32, String>,
) -> Option<String> {
    page_provider_map.get(&page_number).cloned().or(Some("unknown".to_string()))
}

pub fn finalize_event(event: Event) -> Event {
    event
}
