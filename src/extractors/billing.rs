//! Billing event extractor.
//!
//! Parses dollar amounts (including parenthesized/negative forms),
//! classifies `amount_type` via keyword rules, and extracts CPT/HCPCS/ICD-10
//! codes present on the page.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::RunConfig;
use crate::dates::extract_dates_for_pages;
use crate::model::{BillingDetails, Citation, Event, EventType, Fact, FactKind, Page, PageType};
use crate::segment::segment_documents;
use crate::warning::Warning;

use super::common;

static AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(?\$\s*-?\d{1,3}(?:,\d{3})*(?:\.\d{1,2})?\)?|\-\$\s*\d{1,3}(?:,\d{3})*(?:\.\d{1,2})?").unwrap()
});
static CPT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{5}\b").unwrap());
static ICD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([A-TV-Z][0-9][0-9A-Z](?:\.[0-9A-Z]{1,4})?)\b").unwrap());

fn classify_amount_type(context: &str) -> &'static str {
    let lower = context.to_ascii_lowercase();
    if lower.contains("copay") {
        "copay"
    } else if lower.contains("deductible") {
        "deductible"
    } else if lower.contains("coinsurance") {
        "coinsurance"
    } else if lower.contains("adjustment") || lower.contains("writeoff") || lower.contains("write-off") {
        "adjustment"
    } else if lower.contains("payment") || lower.contains("paid") {
        "payment"
    } else if lower.contains("balance") {
        "balance"
    } else if lower.contains("charge") || lower.contains("billed") {
        "charge"
    } else {
        "unknown"
    }
}

fn parse_amount_cents(raw: &str) -> i64 {
    let negative = raw.starts_with('(') || raw.starts_with('-');
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    let value: f64 = digits.parse().unwrap_or(0.0);
    let cents = (value * 100.0).round() as i64;
    if negative {
        -cents
    } else {
        cents
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
    let warnings = Vec::new();

    for page in pages.iter().filter(|p| p.page_type == PageType::Billing) {
        let amounts: Vec<_> = AMOUNT_RE.find_iter(&page.text).collect();
        if amounts.is_empty() {
            continue;
        }
        let (citation, _warn) = common::make_citation(page);
        let citation_id = citation.citation_id.clone();
        citations.push(citation);

        let mut codes: Vec<String> = CPT_RE.find_iter(&page.text).map(|m| m.as_str().to_string()).collect();
        codes.extend(ICD_RE.find_iter(&page.text).map(|m| m.as_str().to_string()));

        let first_amount = amounts[0].as_str();
        let amount_type = classify_amount_type(&page.text);
        let amount_cents = parse_amount_cents(first_amount);

        let facts = vec![Fact {
            text: format!("{amount_type}: {first_amount}"),
            kind: FactKind::BillingItem,
            verbatim: true,
            citation_id: citation_id.clone(),
        }];

        let date = common::resolve_event_date(page.page_number, &dates).unwrap_or_else(common::fallback_unknown_date);
        let provider_id = common::resolve_provider(page.page_number, page_provider_map);

        events.push(Event {
            event_id: common::new_event_id(),
            provider_id,
            event_type: EventType::BillingEvent,
            date,
            encounter_type_raw: Some("billing".to_string()),
            facts,
            diagnoses: Vec::new(),
            procedures: Vec::new(),
            imaging: None,
            billing: Some(BillingDetails { amount_type: amount_type.to_string(), amount_cents, codes }),
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
            page_type: PageType::Billing,
            layout: None,
        }
    }

    #[test]
    fn test_parses_charge_amount() {
        let pages = vec![page(1, "Date of Service: 2024-01-10\nCPT 99213\nCharge: $450.00")];
        let (events, _c, _w) = extract(&pages, &HashMap::new(), &RunConfig::default());
        assert_eq!(events.len(), 1);
        let billing = events[0].billing.as_ref().unwrap();
        assert_eq!(billing.amount_type, "charge");
        assert_eq!(billing.amount_cents, 45000);
    }

    #[test]
    fn test_parses_negative_adjustment() {
        let pages = vec![page(1, "Adjustment: ($120.50)")];
        let (events, _c, _w) = extract(&pages, &HashMap::new(), &RunConfig::default());
        let billing = events[0].billing.as_ref().unwrap();
        assert_eq!(billing.amount_type, "adjustment");
        assert_eq!(billing.amount_cents, -12050);
    }
}
