//! Discharge-summary extractor (produces a `HospitalDischarge` event).

use std::collections::HashMap;

use crate::config::RunConfig;
use crate::dates::extract_dates_for_pages;
use crate::model::{Citation, Event, EventType, Fact, FactKind, Page, PageType};
use crate::segment::segment_documents;
use crate::warning::Warning;

use super::common::{self, DIAGNOSIS_RE, PLAN_RE};

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

    for page in pages.iter().filter(|p| p.page_type == PageType::DischargeSummary) {
        let (citation, _warn) = common::make_citation(page);
        let citation_id = citation.citation_id.clone();

        let mut facts = Vec::new();
        if let Some(f) = common::fact_from_capture(&DIAGNOSIS_RE, &page.text, FactKind::Diagnosis, &citation_id) {
            facts.push(f);
        }
        if let Some(f) = common::fact_from_capture(&PLAN_RE, &page.text, FactKind::Plan, &citation_id) {
            facts.push(f);
        }
        if facts.is_empty() {
            continue;
        }
        citations.push(citation);

        let date = common::resolve_event_date(page.page_number, &dates).unwrap_or_else(common::fallback_unknown_date);
        let provider_id = common::resolve_provider(page.page_number, page_provider_map);

        events.push(Event {
            event_id: common::new_event_id(),
            provider_id,
            event_type: EventType::HospitalDischarge,
            date,
            encounter_type_raw: Some("discharge summary".to_string()),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextSource;

    #[test]
    fn test_extracts_discharge_diagnosis_and_plan() {
        let page = Page {
            page_id: "p1".into(),
            source_document_id: "sd1".into(),
            page_number: 1,
            text: "Discharge Summary\nDiagnosis: lumbar strain\nPlan: follow up with PCP in 2 weeks".into(),
            text_source: TextSource::Embedded,
            page_type: PageType::DischargeSummary,
            layout: None,
        };
        let (events, _c, _w) = extract(&[page], &HashMap::new(), &RunConfig::default());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::HospitalDischarge);
        assert_eq!(events[0].facts.len(), 2);
    }
}
