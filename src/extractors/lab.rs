//! Lab result extractor.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::RunConfig;
use crate::dates::extract_dates_for_pages;
use crate::model::{Citation, Event, EventType, Fact, FactKind, Page, PageType};
use crate::segment::segment_documents;
use crate::warning::Warning;

use super::common;

static LAB_VALUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(WBC|Hemoglobin|Hematocrit|Platelets|Glucose|Creatinine)\b[^.\n]{0,40}\d+(?:\.\d+)?").unwrap()
});

pub fn extract(
    pages: &[Page],
    page_provider_map: &HashMap<u32, String>,
    _config: &RunConfig,
) -> (Vec<Event>, Vec<Citation>, Vec<Warning>) {
    let documents = segment_documents(pages);
    let dates = extract_dates_for_pages(pages, &documents);

    let mut events = Vec::new();
    let mut citations = Vec::new();
    let warnings = Vec::new();

    for page in pages.iter().filter(|p| p.page_type == PageType::Lab) {
        let Some(m) = LAB_VALUE_RE.find(&page.text) else { continue };
        let (citation, _warn) = common::make_citation(page);
        let citation_id = citation.citation_id.clone();
        citations.push(citation);

        let facts = vec![Fact {
            text: m.as_str().to_string(),
            kind: FactKind::Lab,
            verbatim: true,
            citation_id: citation_id.clone(),
        }];

        let date = common::resolve_event_date(page.page_number, &dates).unwrap_or_else(common::fallback_unknown_date);
        let provider_id = common::resolve_provider(page.page_number, page_provider_map);

        events.push(Event {
            event_id: common::new_event_id(),
            provider_id,
            event_type: EventType::LabResult,
            date,
            encounter_type_raw: Some("lab".to_string()),
            facts,
            diagnoses: Vec::new(),
            procedures: Vec::new(),
            imaging: None,
            billing: None,
            confidence: 0,
            flags: Default::default(),
            citation_ids: vec![citation_id],
            source_page_numbers: vec![page.page_number],
            extensions: Default::default(),
        });
    }

    (events, citations, warnings)
}
