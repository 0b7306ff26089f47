//! Date extractor (component E).
//!
//! Emits a candidate date per page, ranked by the four-tier source model:
//! tier1 (explicit label), tier2 (header/letterhead), propagated (inherited
//! from the prior page of the same document), anchor (offset from a nearby
//! "Day N" phrase relative to an admission date).

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{DateSource, Document, EventDate, EventDateValue, Page};

static TIER1_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:date of service|dos|visit date|admit date)\s*[:#]?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{4}-\d{2}-\d{2})").unwrap()
});
static GENERIC_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{4}-\d{2}-\d{2})\b").unwrap());
static DAY_N_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bday\s+(\d{1,3})\b").unwrap());

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    for fmt in ["%m/%d/%Y", "%m-%d-%Y", "%m/%d/%y", "%m-%d-%y"] {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    None
}

/// Extracts the best-ranked date for each page, falling back to the
/// propagated date of the prior page within the same document when a page
/// has no date of its own.
pub fn extract_dates_for_pages(pages: &[Page], documents: &[Document]) -> Vec<(u32, EventDate)> {
    let mut sorted: Vec<&Page> = pages.iter().collect();
    sorted.sort_by_key(|p| p.page_number);

    let mut results = Vec::new();
    let mut propagated: Option<NaiveDate> = None;
    let mut current_doc_id: Option<&str> = None;

    for page in sorted {
        let doc_id = documents
            .iter()
            .find(|d| page.page_number >= d.page_start && page.page_number <= d.page_end)
            .map(|d| d.document_id.as_str());

        if doc_id != current_doc_id {
            propagated = None;
            current_doc_id = doc_id;
        }

        if let Some(cap) = TIER1_LABEL_RE.captures(&page.text) {
            if let Some(date) = parse_date(&cap[1]) {
                propagated = Some(date);
                results.push((page.page_number, EventDate::single(date, DateSource::Tier1)));
                continue;
            }
        }

        if let Some(cap) = GENERIC_DATE_RE.captures(&page.text) {
            if let Some(date) = parse_date(&cap[1]) {
                propagated = Some(date);
                results.push((page.page_number, EventDate::single(date, DateSource::Tier2)));
                continue;
            }
        }

        if let Some(cap) = DAY_N_RE.captures(&page.text) {
            if let (Some(anchor), Ok(offset)) = (propagated, cap[1].parse::<i64>()) {
                if let Some(anchored) = anchor.checked_add_days(chrono::Days::new(offset as u64)) {
                    results.push((page.page_number, EventDate::single(anchored, DateSource::Anchor)));
                    continue;
                }
            }
        }

        if let Some(date) = propagated {
            results.push((page.page_number, EventDate::single(date, DateSource::Propagated)));
        }
    }

    results
}

/// A partial date (`MM/DD`, `month day`) is only emitted when a year can be
/// fixed from page context; otherwise the caller should not surface it at
/// all per spec. Exposed separately so extractors can opt in.
pub fn partial_date_with_year(month: u32, day: u32, year: Option<i32>) -> Option<EventDate> {
    year.map(|y| EventDate {
        value: EventDateValue::Partial { month: Some(month), day: Some(day), year: Some(y) },
        source: DateSource::Tier2,
        time: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PageType, TextSource};

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
    fn test_tier1_label_wins() {
        let pages = vec![page(1, "Date of Service: 2024-03-01\nSome other date 2024-01-01 mentioned.")];
        let dates = extract_dates_for_pages(&pages, &[]);
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].1.source, DateSource::Tier1);
    }

    #[test]
    fn test_propagation_across_pages_same_document() {
        let doc = Document {
            document_id: "d1".into(),
            source_document_id: "sd1".into(),
            page_start: 1,
            page_end: 2,
            page_types: vec![],
            declared_type: PageType::ClinicalNote,
            confidence: 80,
        };
        let pages = vec![page(1, "Date of Service: 2024-03-01"), page(2, "Follow-up note, no date here.")];
        let dates = extract_dates_for_pages(&pages, &[doc]);
        assert_eq!(dates.len(), 2);
        assert_eq!(dates[1].1.source, DateSource::Propagated);
    }

    #[test]
    fn test_no_date_and_no_propagation_emits_nothing() {
        let pages = vec![page(1, "No date content here at all.")];
        let dates = extract_dates_for_pages(&pages, &[]);
        assert!(dates.is_empty());
    }
}
