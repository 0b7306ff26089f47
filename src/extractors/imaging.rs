//! Imaging-study event extractor.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::RunConfig;
use crate::dates::extract_dates_for_pages;
use crate::model::{Citation, Event, EventType, Fact, FactKind, ImagingDetails, Page, PageType};
use crate::segment::segment_documents;
use crate::warning::Warning;

use super::common::{self, IMPRESSION_RE};

static MODALITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(MRI|CT|X-RAY|XRAY|ULTRASOUND)\b").unwrap());

fn modality_label(text: &str) -> &'static str {
    match MODALITY_RE.find(text).map(|m| m.as_str().to_ascii_uppercase()) {
        Some(ref s) if s == "MRI" => "MRI",
        Some(ref s) if s == "CT" => "CT",
        Some(ref s) if s.contains("XRAY") => "XRAY",
        Some(ref s) if s == "ULTRASOUND" => "ULTRASOUND",
        _ => "OTHER",
    }
}

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

    for page in pages.iter().filter(|p| p.page_type == PageType::ImagingReport) {
        if !MODALITY_RE.is_match(&page.text) {
            continue;
        }
        let (citation, warn) = common::make_citation(page);
        if let Some(w) = warn {
            warnings.push(w);
        }
        let citation_id = citation.citation_id.clone();
        citations.push(citation);

        let mut facts = Vec::new();
        if let Some(f) = common::fact_from_capture(&IMPRESSION_RE, &page.text, FactKind::Impression, &citation_id) {
            facts.push(f);
        } else {
            continue;
        }

        let impression = facts.first().map(|f| f.text.clone());
        let date = common::resolve_event_date(page.page_number, &dates).unwrap_or_else(common::fallback_unknown_date);
        let provider_id = common::resolve_provider(page.page_number, page_provider_map);

        events.push(Event {
            event_id: common::new_event_id(),
            provider_id,
            event_type: EventType::ImagingStudy,
            date,
            encounter_type_raw: Some(modality_label(&page.text).to_string()),
            facts,
            diagnoses: Vec::new(),
            procedures: Vec::new(),
            imaging: Some(ImagingDetails { modality: modality_label(&page.text).to_string(), impression }),
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
            page_type: PageType::ImagingReport,
            layout: None,
        }
    }

    #[test]
    fn test_extracts_mri_with_impression() {
        let pages = vec![page(1, "MRI Lumbar Spine\nDate of Service: 2024-02-15\nImpression: disc herniation at L4-L5")];
        let (events, _c, _w) = extract(&pages, &HashMap::new(), &RunConfig::default());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::ImagingStudy);
        assert_eq!(events[0].imaging.as_ref().unwrap().modality, "MRI");
    }

    #[test]
    fn test_no_impression_no_event() {
        let pages = vec![page(1, "MRI ordered for lumbar spine, pending.")];
        let (events, _c, _w) = extract(&pages, &HashMap::new(), &RunConfig::default());
        assert!(events.is_empty());
    }
}
