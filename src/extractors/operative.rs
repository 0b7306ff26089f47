//! Operative-report extractor (produces a `Procedure` event).

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::RunConfig;
use crate::dates::extract_dates_for_pages;
use crate::model::{Citation, Event, EventType, Fact, FactKind, Page, PageType};
use crate::segment::segment_documents;
use crate::warning::Warning;

use super::common::{self, PROCEDURE_NAME_RE};

static COMPLICATIONS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*complications?\s*[:#]\s*(.+)$").unwrap());

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

    for page in pages.iter().filter(|p| p.page_type == PageType::OperativeReport) {
        let Some(procedure_fact) = common::fact_from_capture(&PROCEDURE_NAME_RE, &page.text, FactKind::Procedure, "") else {
            continue;
        };

        let (citation, _warn) = common::make_citation(page);
        let citation_id = citation.citation_id.clone();
        citations.push(citation);

        let mut facts = vec![Fact { citation_id: citation_id.clone(), ..procedure_fact }];
        if let Some(f) = common::fact_from_capture(&COMPLICATIONS_RE, &page.text, FactKind::ProcedureNote, &citation_id) {
            facts.push(f);
        }

        let procedures = vec![facts[0].text.clone()];
        let date = common::resolve_event_date(page.page_number, &dates).unwrap_or_else(common::fallback_unknown_date);
        let provider_id = common::resolve_provider(page.page_number, page_provider_map);

        events.push(Event {
            event_id: common::new_event_id(),
            provider_id,
            event_type: EventType::Procedure,
            date,
            encounter_type_raw: Some("operative report".to_string()),
            facts,
            diagnoses: Vec::new(),
            procedures,
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
