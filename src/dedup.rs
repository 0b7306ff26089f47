//! Event deduplication (component H).
//!
//! Two events collide when they share a dedup key: the same sort date, the
//! same provider, the same event type, and the same fingerprint over their
//! fact text. Within a colliding group, the event with more facts wins;
//! ties break on higher confidence, then lexicographically on `event_id` so
//! the outcome is reproducible across runs.

use std::collections::HashMap;

use sha1::{Digest, Sha1};

use crate::model::Event;

fn fact_fingerprint(event: &Event) -> String {
    let mut texts: Vec<String> = event.facts.iter().map(|f| f.text.trim().to_ascii_lowercase()).collect();
    texts.sort();
    let mut hasher = Sha1::new();
    hasher.update(texts.join("|").as_bytes());
    hex::encode(hasher.finalize())
}

fn dedup_key(event: &Event) -> (Option<chrono::NaiveDate>, Option<String>, &'static str, String) {
    (
        event.date.sort_key(),
        event.provider_id.clone(),
        event.event_type.as_str(),
        fact_fingerprint(event),
    )
}

/// Prefer `a` over `b` under the keep-more-facts/higher-confidence/
/// lexicographic tiebreak.
fn prefer(a: &Event, b: &Event) -> bool {
    if a.facts.len() != b.facts.len() {
        return a.facts.len() > b.facts.len();
    }
    if a.confidence != b.confidence {
        return a.confidence > b.confidence;
    }
    a.event_id < b.event_id
}

/// Collapses exact-duplicate events, keeping the best representative of
/// each dedup key group. Order of the surviving events matches their first
/// occurrence in `events`.
pub fn dedup_events(events: Vec<Event>) -> Vec<Event> {
    let mut order: Vec<_> = Vec::new();
    let mut best: HashMap<_, Event> = HashMap::new();

    for event in events {
        let key = dedup_key(&event);
        match best.get(&key) {
            Some(existing) if prefer(existing, &event) => {}
            Some(_) => {
                best.insert(key.clone(), event);
            }
            None => {
                order.push(key.clone());
                best.insert(key, event);
            }
        }
    }

    order.into_iter().filter_map(|key| best.remove(&key)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DateSource, EventDate, EventType, Fact, FactKind};

    fn event(id: &str, date: &str, fact_text: &str, confidence: i32) -> Event {
        Event {
            event_id: id.to_string(),
            provider_id: Some("prov-1".to_string()),
            event_type: EventType::OfficeVisit,
            date: EventDate::single(chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(), DateSource::Tier1),
            encounter_type_raw: None,
            facts: vec![Fact { text: fact_text.to_string(), kind: FactKind::Assessment, verbatim: true, citation_id: "c1".to_string() }],
            diagnoses: vec![],
            procedures: vec![],
            imaging: None,
            billing: None,
            confidence,
            flags: Default::default(),
            citation_ids: vec![],
            source_page_numbers: vec![1],
            extensions: Default::default(),
        }
    }

    #[test]
    fn test_exact_duplicates_collapse_to_one() {
        let events = vec![event("e1", "2024-01-01", "back pain", 50), event("e2", "2024-01-01", "back pain", 80)];
        let result = dedup_events(events);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].event_id, "e2");
    }

    #[test]
    fn test_distinct_fact_text_is_not_deduped() {
        let events = vec![event("e1", "2024-01-01", "back pain", 50), event("e2", "2024-01-01", "knee pain", 50)];
        let result = dedup_events(events);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_tiebreak_prefers_lexicographically_smaller_event_id() {
        let mut a = event("e2", "2024-01-01", "back pain", 50);
        let mut b = event("e1", "2024-01-01", "back pain", 50);
        a.facts.push(Fact { text: "extra".to_string(), kind: FactKind::Plan, verbatim: true, citation_id: "c1".to_string() });
        b.facts.push(Fact { text: "extra".to_string(), kind: FactKind::Plan, verbatim: true, citation_id: "c1".to_string() });
        let result = dedup_events(vec![a, b]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].event_id, "e1");
    }
}
