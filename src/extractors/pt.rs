//! Physical therapy visit extractor. Honors `pt_mode`: `aggregate` collapses
//! a document's PT pages into one visit event; `per_visit` emits one event
//! per page carrying a date.

use std::collections::HashMap;

use crate::config::{PtMode, RunConfig};
use crate::dates::extract_dates_for_pages;
use crate::model::{Citation, Event, EventType, Fact, FactKind, Page, PageType};
use crate::segment::segment_documents;
use crate::warning::Warning;

use super::common::{self, PAIN_RE, ROM_RE, STRENGTH_RE};

fn pt_facts(page: &Page, citation_id: &str) -> Vec<Fact> {
    let mut facts = Vec::new();
    if let Some(m) = ROM_RE.find(&page.text) {
        facts.push(Fact { text: m.as_str().to_string(), kind: FactKind::RomValue, verbatim: true, citation_id: citation_id.to_string() });
    }
    if let Some(m) = STRENGTH_RE.find(&page.text) {
        facts.push(Fact { text: m.as_str().to_string(), kind: FactKind::StrengthGrade, verbatim: true, citation_id: citation_id.to_string() });
    }
    if let Some(m) = PAIN_RE.find(&page.text) {
        facts.push(Fact { text: m.as_str().to_string(), kind: FactKind::PainScore, verbatim: true, citation_id: citation_id.to_string() });
    }
    facts
}

pub fn extract(
    pages: &[Page],
    page_provider_map: &HashMap<u32, String>,
    config: &RunConfig,
) -> (Vec<Event>, Vec<Citation>, Vec<Warning>) {
    let documents = segment_documents(pages);
    let dates = extract_dates_for_pages(pages, &documents);

    let mut events = Vec::new();
    let mut citations = Vec::new();
    let warnings = Vec::new();

    let pt_pages: Vec<&Page> = pages.iter().filter(|p| p.page_type == PageType::PtNote).collect();

    match config.pt_mode {
        PtMode::PerVisit => {
            for page in &pt_pages {
                let (citation, _warn) = common::make_citation(page);
                let citation_id = citation.citation_id.clone();
                let facts = pt_facts(page, &citation_id);
                if facts.is_empty() {
                    continue;
                }
                citations.push(citation);
                let date = common::resolve_event_date(page.page_number, &dates).unwrap_or_else(common::fallback_unknown_date);
                let provider_id = common::resolve_provider(page.page_number, page_provider_map);
                events.push(Event {
                    event_id: common::new_event_id(),
                    provider_id,
                    event_type: EventType::PtVisit,
                    date,
                    encounter_type_raw: Some("physical therapy".to_string()),
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
        }
        PtMode::Aggregate => {
            if pt_pages.is_empty() {
                return (events, citations, warnings);
            }
            let mut all_facts = Vec::new();
            let mut citation_ids = Vec::new();
            let mut page_numbers = Vec::new();
            for page in &pt_pages {
                let (citation, _warn) = common::make_citation(page);
                let citation_id = citation.citation_id.clone();
                let facts = pt_facts(page, &citation_id);
                if facts.is_empty() {
                    continue;
                }
                citations.push(citation);
                citation_ids.push(citation_id);
                page_numbers.push(page.page_number);
                all_facts.extend(facts);
            }
            if all_facts.is_empty() {
                return (events, citations, warnings);
            }
            let first_page = pt_pages[0].page_number;
            let date = common::resolve_event_date(first_page, &dates).unwrap_or_else(common::fallback_unknown_date);
            let provider_id = common::resolve_provider(first_page, page_provider_map);
            events.push(Event {
                event_id: common::new_event_id(),
                provider_id,
                event_type: EventType::PtVisit,
                date,
                encounter_type_raw: Some("physical therapy (aggregated)".to_string()),
                facts: all_facts,
                diagnoses: Vec::new(),
                procedures: Vec::new(),
                imaging: None,
                billing: None,
                confidence: 0,
                flags: Default::default(),
                citation_ids,
                source_page_numbers: page_numbers,
                extensions: Default::default(),
            });
        }
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
            page_type: PageType::PtNote,
            layout: None,
        }
    }

    #[test]
    fn test_aggregate_mode_merges_two_pt_pages_into_one_event() {
        let pages = vec![
            page(1, "Date of Service: 2024-02-01\nROM: knee flexion 90 degrees\nPain: 5/10"),
            page(2, "Strength: 4/5 quadriceps\nPain: 4/10"),
        ];
        let (events, _c, _w) = extract(&pages, &HashMap::new(), &RunConfig::default());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source_page_numbers.len(), 2);
    }

    #[test]
    fn test_per_visit_mode_emits_one_event_per_page() {
        let mut config = RunConfig::default();
        config.pt_mode = PtMode::PerVisit;
        let pages = vec![
            page(1, "Date of Service: 2024-02-01\nROM: knee flexion 90 degrees"),
            page(2, "Date of Service: 2024-02-08\nStrength: 4/5 quadriceps"),
        ];
        let (events, _c, _w) = extract(&pages, &HashMap::new(), &config);
        assert_eq!(events.len(), 2);
    }
}
