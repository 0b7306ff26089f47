//! Chronology projection building (component K).
//!
//! Converts the evidence graph's typed `Event`s into the display-ready rows
//! the renderers consume: resolves patient labels, formats dates and
//! providers for human reading, normalizes the event-type label (including
//! the "inpatient progress" -> "Clinical Note" relabeling used for daily
//! inpatient notes), and merges same-day rows that would otherwise read as
//! duplicates in the rendered timeline.

use std::collections::HashMap;

use crate::model::{ChronologyProjectionEntry, Citation, Event, EventDateValue, Provider, SourceDocument};

const UNKNOWN_PATIENT: &str = "Unknown Patient";

fn title_case(snake: &str) -> String {
    snake
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn event_type_display(event: &Event) -> String {
    if let Some(raw) = &event.encounter_type_raw {
        if raw.to_ascii_lowercase().contains("inpatient progress") {
            return "Clinical Note".to_string();
        }
    }
    title_case(event.event_type.as_str())
}

fn date_display(event: &Event) -> String {
    match (&event.date.value, &event.date.time) {
        (EventDateValue::Single { value }, Some(time)) => format!("{} {}", value.format("%Y-%m-%d"), time),
        (EventDateValue::Single { value }, None) => format!("{} (time not documented)", value.format("%Y-%m-%d")),
        (EventDateValue::Range { start, end: Some(end) }, _) => {
            format!("{} - {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
        }
        (EventDateValue::Range { start, end: None }, _) => format!("{} (ongoing)", start.format("%Y-%m-%d")),
        _ => match event.date.sort_key() {
            Some(d) => d.format("%Y-%m-%d").to_string(),
            None => "Date Unknown".to_string(),
        },
    }
}

fn provider_display(event: &Event, providers: &HashMap<String, Provider>) -> String {
    match &event.provider_id {
        Some(id) => providers.get(id).map(|p| p.detected_name_raw.clone()).unwrap_or_else(|| "Unknown Provider".to_string()),
        None => "Unknown Provider".to_string(),
    }
}

fn citation_display(
    event: &Event,
    citations: &HashMap<String, Citation>,
    source_documents: &HashMap<String, SourceDocument>,
) -> String {
    let mut entries: Vec<(u32, String)> = event
        .citation_ids
        .iter()
        .filter_map(|id| citations.get(id))
        .map(|c| {
            let filename = source_documents
                .get(&c.source_document_id)
                .map(|d| d.filename.clone())
                .unwrap_or_else(|| c.source_document_id.clone());
            (c.page_number, format!("[{} p. {}]", filename, c.page_number))
        })
        .collect();
    entries.sort_by_key(|(page, _)| *page);
    entries.dedup_by(|a, b| a.1 == b.1);
    entries.into_iter().map(|(_, s)| s).collect::<Vec<_>>().join(", ")
}

fn fact_fingerprint(event: &Event) -> String {
    let mut texts: Vec<String> = event.facts.iter().map(|f| f.text.trim().to_ascii_lowercase()).collect();
    texts.sort();
    texts.join("|")
}

fn patient_label(event: &Event) -> String {
    event.patient_scope_id().map(|s| s.to_string()).unwrap_or_else(|| UNKNOWN_PATIENT.to_string())
}

/// Builds one projection row per event, then merges rows that share the
/// same patient, calendar day, event type, provider, and fact fingerprint.
pub fn build_projection(
    events: &[Event],
    citations: &[Citation],
    providers: &[Provider],
    source_documents: &[SourceDocument],
) -> Vec<ChronologyProjectionEntry> {
    let citation_map: HashMap<String, Citation> = citations.iter().map(|c| (c.citation_id.clone(), c.clone())).collect();
    let provider_map: HashMap<String, Provider> = providers.iter().map(|p| (p.provider_id.clone(), p.clone())).collect();
    let doc_map: HashMap<String, SourceDocument> = source_documents.iter().map(|d| (d.document_id.clone(), d.clone())).collect();

    let mut rows: Vec<ChronologyProjectionEntry> = events
        .iter()
        .map(|event| ChronologyProjectionEntry {
            event_id: event.event_id.clone(),
            date_display: date_display(event),
            provider_display: provider_display(event, &provider_map),
            event_type_display: event_type_display(event),
            patient_label: patient_label(event),
            facts: event.facts.iter().map(|f| f.text.clone()).collect(),
            citation_display: citation_display(event, &citation_map, &doc_map),
            confidence: event.confidence,
            extras: Default::default(),
        })
        .collect();

    merge_same_day_duplicates(events, &mut rows);
    rows
}

/// Merges rows whose source events share `(patient_label, calendar day,
/// event_type_display, provider_display, fact fingerprint)`, keeping the
/// first row's identity and unioning facts/citations.
fn merge_same_day_duplicates(events: &[Event], rows: &mut Vec<ChronologyProjectionEntry>) {
    let fingerprints: HashMap<String, String> = events.iter().map(|e| (e.event_id.clone(), fact_fingerprint(e))).collect();

    let mut seen: HashMap<(String, String, String, String, String), usize> = HashMap::new();
    let mut merged: Vec<ChronologyProjectionEntry> = Vec::new();

    for row in rows.drain(..) {
        let day = row.date_display.split(' ').next().unwrap_or("").to_string();
        let fingerprint = fingerprints.get(&row.event_id).cloned().unwrap_or_default();
        let key = (row.patient_label.clone(), day, row.event_type_display.clone(), row.provider_display.clone(), fingerprint);

        if let Some(&idx) = seen.get(&key) {
            let existing: &mut ChronologyProjectionEntry = &mut merged[idx];
            if existing.citation_display != row.citation_display && !existing.citation_display.contains(row.citation_display.as_str()) {
                existing.citation_display = format!("{}, {}", existing.citation_display, row.citation_display);
            }
            existing.confidence = existing.confidence.max(row.confidence);
        } else {
            seen.insert(key, merged.len());
            merged.push(row);
        }
    }

    *rows = merged;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DateSource, EventDate, EventType, Fact, FactKind};

    fn event(id: &str, date: &str, blob: &str) -> Event {
        Event {
            event_id: id.to_string(),
            provider_id: None,
            event_type: EventType::InpatientDailyNote,
            date: EventDate::single(chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(), DateSource::Tier1),
            encounter_type_raw: Some("inpatient progress note".to_string()),
            facts: vec![Fact { text: blob.to_string(), kind: FactKind::Other, verbatim: true, citation_id: "c1".into() }],
            diagnoses: vec![],
            procedures: vec![],
            imaging: None,
            billing: None,
            confidence: 70,
            flags: Default::default(),
            citation_ids: vec!["c1".into()],
            source_page_numbers: vec![1],
            extensions: Default::default(),
        }
    }

    #[test]
    fn test_inpatient_progress_relabels_to_clinical_note() {
        let e = event("e1", "2024-01-01", "stable overnight");
        let rows = build_projection(&[e], &[], &[], &[]);
        assert_eq!(rows[0].event_type_display, "Clinical Note");
    }

    #[test]
    fn test_unknown_patient_label_when_no_scope() {
        let e = event("e1", "2024-01-01", "stable overnight");
        let rows = build_projection(&[e], &[], &[], &[]);
        assert_eq!(rows[0].patient_label, "Unknown Patient");
    }

    #[test]
    fn test_same_day_identical_events_merge() {
        let e1 = event("e1", "2024-01-01", "stable overnight");
        let e2 = event("e2", "2024-01-01", "stable overnight");
        let rows = build_projection(&[e1, e2], &[], &[], &[]);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_distinct_facts_do_not_merge() {
        let e1 = event("e1", "2024-01-01", "stable overnight");
        let e2 = event("e2", "2024-01-01", "febrile, antibiotics started");
        let rows = build_projection(&[e1, e2], &[], &[], &[]);
        assert_eq!(rows.len(), 2);
    }
}
