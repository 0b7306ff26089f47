//! Event confidence scoring (component I).
//!
//! Additive, clamped to `0..=100`. Each contributor is independent of the
//! others so the score can be explained line-by-line in QA output.

use crate::config::RunConfig;
use crate::model::Event;

const MULTI_PAGE_BONUS: i32 = 5;
const THREE_FACTS_BONUS: i32 = 5;
const TWO_CITATIONS_BONUS: i32 = 5;
const KNOWN_PROVIDER_BONUS: i32 = 20;
const HIGH_ACUITY_BONUS: i32 = 15;
const MAX_ANCHOR_FACT_BONUS: i32 = 15;
const ANCHOR_FACT_POINTS_PER_FACT: i32 = 5;

/// Scores a single event per the formula and returns the clamped result.
/// Does not mutate `event`; callers assign the result to `event.confidence`.
pub fn score_event(event: &Event) -> i32 {
    let mut score = event.date.source.confidence_points();

    if event.provider_is_known() {
        score += KNOWN_PROVIDER_BONUS;
    }
    if event.event_type.is_high_acuity() {
        score += HIGH_ACUITY_BONUS;
    }
    score += (ANCHOR_FACT_POINTS_PER_FACT * event.anchor_fact_count() as i32).min(MAX_ANCHOR_FACT_BONUS);
    if event.facts.len() >= 3 {
        score += THREE_FACTS_BONUS;
    }
    if event.citation_ids.len() >= 2 {
        score += TWO_CITATIONS_BONUS;
    }
    if event.is_multi_page() {
        score += MULTI_PAGE_BONUS;
    }

    score.clamp(0, 100)
}

/// Scores every event in place and flags any that fall below
/// `config.event_confidence_min_export` as `LOW_CONFIDENCE`.
pub fn score_events(events: &mut [Event], config: &RunConfig) {
    for event in events.iter_mut() {
        event.confidence = score_event(event);
        if event.confidence < config.event_confidence_min_export {
            event.flags.insert("LOW_CONFIDENCE".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DateSource, EventDate, EventType, Fact, FactKind};

    fn base_event() -> Event {
        Event {
            event_id: "e1".to_string(),
            provider_id: Some("unknown".to_string()),
            event_type: EventType::OfficeVisit,
            date: EventDate::single(chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), DateSource::Propagated),
            encounter_type_raw: None,
            facts: vec![],
            diagnoses: vec![],
            procedures: vec![],
            imaging: None,
            billing: None,
            confidence: 0,
            flags: Default::default(),
            citation_ids: vec![],
            source_page_numbers: vec![1],
            extensions: Default::default(),
        }
    }

    #[test]
    fn test_minimal_event_scores_date_tier_only() {
        let event = base_event();
        assert_eq!(score_event(&event), 15);
    }

    #[test]
    fn test_known_provider_and_high_acuity_and_anchor_facts_stack() {
        let mut event = base_event();
        event.provider_id = Some("prov-1".to_string());
        event.event_type = EventType::ErVisit;
        event.date = EventDate::single(chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), DateSource::Tier1);
        event.facts = vec![
            Fact { text: "a".into(), kind: FactKind::ChiefComplaint, verbatim: true, citation_id: "c1".into() },
            Fact { text: "b".into(), kind: FactKind::Assessment, verbatim: true, citation_id: "c1".into() },
            Fact { text: "c".into(), kind: FactKind::Plan, verbatim: true, citation_id: "c1".into() },
        ];
        event.citation_ids = vec!["c1".into(), "c2".into()];
        event.source_page_numbers = vec![1, 2];
        // 35 (tier1) + 20 (known provider) + 15 (high acuity) + 15 (anchor facts, capped)
        // + 5 (>=3 facts) + 5 (>=2 citations) + 5 (multi-page) = 100
        assert_eq!(score_event(&event), 100);
    }

    #[test]
    fn test_low_confidence_flag_applied_below_threshold() {
        let mut events = vec![base_event()];
        let config = RunConfig::default();
        score_events(&mut events, &config);
        assert!(events[0].confidence < config.event_confidence_min_export);
        assert!(events[0].flags.contains("LOW_CONFIDENCE"));
    }
}
