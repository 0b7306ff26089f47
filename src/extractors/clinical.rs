//! Clinical (office-visit) event extractor.

use std::collections::HashMap;

use crate::config::RunConfig;
use crate::dates::extract_dates_for_pages;
use crate::model::{Citation, Event, EventType, Fact, FactKind, Page, PageType};
use crate::segment::segment_documents;
use crate::warning::Warning;

use super::common::{
    self, ASSESSMENT_RE, CHIEF_COMPLAINT_RE, MEDICATION_RE, PAIN_RE, PLAN_RE, ROM_RE, STRENGTH_RE,
};

pub fn extract(
    pages: &[Page],
    page_provider_map: &HashMap<u32, String>,
    _config: &RunConfig,
) -> (Vec<Event>, Vec<Citation>, Vec<Warning>) {
    let documents = segment_documents(pages);
    let dates = extract_dates_for_pages(pages, &documents);

    let mut events = Vec::new();
    let mut citations = Vec::new();
    let mut warnings = Vec::new();

    for page in pages.iter().filter(|p| p.page_type == PageType::ClinicalNote) {
        if page.text.trim().is_empty() {
            continue;
        }
        let (citation, warn) = common::make_citation(page);
        if let Some(w) = warn {
            warnings.push(w);
        }
        let citation_id = citation.citation_id.clone();
        citations.push(citation);

        let mut facts: Vec<Fact> = Vec::new();
        for (re, kind) in [
            (&*CHIEF_COMPLAINT_RE, FactKind::ChiefComplaint),
            (&*ASSESSMENT_RE, FactKind::Assessment),
            (&*PLAN_RE, FactKind::Plan),
        ] {
            if let Some(f) = common::fact_from_capture(re, &page.text, kind, &citation_id) {
                facts.push(f);
            }
        }
        if MEDICATION_RE.is_match(&page.text) {
            if let Some(m) = MEDICATION_RE.find(&page.text) {
                facts.push(Fact {
                    text: m.as_str().to_string(),
                    kind: FactKind::Medication,
                    verbatim: true,
                    citation_id: citation_id.clone(),
                });
            }
        }
        if ROM_RE.is_match(&page.text) {
            facts.push(Fact {
                text: ROM_RE.find(&page.text).unwrap().as_str().to_string(),
                kind: FactKind::RomValue,
                verbatim: true,
                citation_id: citation_id.clone(),
            });
        }
        if STRENGTH_RE.is_match(&page.text) {
            facts.push(Fact {
                text: STRENGTH_RE.find(&page.text).unwrap().as_str().to_string(),
                kind: FactKind::StrengthGrade,
                verbatim: true,
                citation_id: citation_id.clone(),
            });
        }
        if PAIN_RE.is_match(&page.text) {
            facts.push(Fact {
                text: PAIN_RE.find(&page.text).unwrap().as_str().to_string(),
                kind: FactKind::PainScore,
                verbatim: true,
                citation_id: citation_id.clone(),
            });
        }

        if facts.is_empty() {
            continue;
        }

        let date = common::resolve_event_date(page.page_number, &dates).unwrap_or_else(common::fallback_unknown_date);
        let provider_id = common::resolve_provider(page.page_number, page_provider_map);

        events.push(Event {
            event_id: common::new_event_id(),
            provider_id,
            event_type: EventType::OfficeVisit,
            date,
            encounter_type_raw: Some("office visit".to_string()),
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

    fn page(num: u32, text: &str) -> Page {
        Page {
            page_id: format!("p{num}"),
            source_document_id: "sd1".to_string(),
            page_number: num,
            text: text.to_string(),
            text_source: TextSource::Embedded,
            page_type: PageType::ClinicalNote,
            layout: None,
        }
    }

    #[test]
    fn test_extracts_chief_complaint_and_assessment() {
        let pages = vec![page(1, "Date of Service: 2024-03-01\nChief Complaint: low back pain\nAssessment: lumbar strain\nPlan: NSAIDs and rest")];
        let (events, citations, _warnings) = extract(&pages, &HashMap::new(), &RunConfig::default());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].facts.len(), 3);
        assert_eq!(citations.len(), 1);
    }

    #[test]
    fn test_blank_page_produces_no_event() {
        let pages = vec![page(1, "")];
        let (events, _c, _w) = extract(&pages, &HashMap::new(), &RunConfig::default());
        assert!(events.is_empty());
    }
}
