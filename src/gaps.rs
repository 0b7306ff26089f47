//! Treatment-gap detection (component J).
//!
//! Events are grouped by patient scope, sorted by date, and walked
//! pairwise: a gap is emitted whenever the distance between consecutive
//! events meets `config.gap_threshold_days`. The rationale tag favors the
//! most specific signal available (hospice/rehab keywords, then the
//! preceding event's acuity) before falling back to a routine tag. Runs of
//! three or more routine gaps with near-identical duration are collapsed
//! into a single representative gap so the chronology doesn't read as
//! dozens of near-duplicate "routine" entries.

use std::collections::HashMap;

use uuid::Uuid;

use crate::config::RunConfig;
use crate::model::{Event, EventType, Gap, GapRationale};

const COLLAPSE_MIN_RUN: usize = 3;
const COLLAPSE_MAX_DURATION_DELTA: i64 = 3;

fn event_text_blob(event: &Event) -> String {
    let mut blob = String::new();
    if let Some(raw) = &event.encounter_type_raw {
        blob.push_str(raw);
        blob.push(' ');
    }
    for fact in &event.facts {
        blob.push_str(&fact.text);
        blob.push(' ');
    }
    for dx in &event.diagnoses {
        blob.push_str(dx);
        blob.push(' ');
    }
    blob.to_ascii_lowercase()
}

fn mentions_hospice(event: &Event) -> bool {
    event_text_blob(event).contains("hospice")
}

fn mentions_rehab_or_snf(event: &Event) -> bool {
    let blob = event_text_blob(event);
    blob.contains("skilled nursing") || blob.contains("snf") || blob.contains("rehab")
}

fn rationale_for(prev: &Event, next: &Event) -> GapRationale {
    if mentions_hospice(prev) || mentions_hospice(next) {
        GapRationale::HospiceContinuityBreak
    } else if mentions_rehab_or_snf(prev) || mentions_rehab_or_snf(next) {
        GapRationale::RehabSnfTransitionGap
    } else if prev.event_type == EventType::HospitalAdmission || prev.event_type == EventType::HospitalDischarge {
        GapRationale::PostAdmissionFollowupMissing
    } else if prev.event_type == EventType::Procedure {
        GapRationale::PostProcedureFollowupMissing
    } else {
        GapRationale::RoutineContinuityGap
    }
}

fn patient_scope_key(event: &Event) -> String {
    event.patient_scope_id().unwrap_or("default").to_string()
}

/// Detects gaps within each patient scope and returns them in patient-scope,
/// then chronological, order.
pub fn detect_gaps(events: &[Event], config: &RunConfig) -> Vec<Gap> {
    let mut by_scope: HashMap<String, Vec<&Event>> = HashMap::new();
    for event in events {
        if event.date.sort_key().is_some() {
            by_scope.entry(patient_scope_key(event)).or_default().push(event);
        }
    }

    let mut scopes: Vec<_> = by_scope.keys().cloned().collect();
    scopes.sort();

    let mut all_gaps = Vec::new();
    for scope in scopes {
        let mut scoped = by_scope.remove(&scope).unwrap();
        scoped.sort_by_key(|e| e.date.sort_key());

        let mut raw_gaps = Vec::new();
        for pair in scoped.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            let prev_date = prev.date.sort_key().unwrap();
            let next_date = next.date.sort_key().unwrap();
            let duration = (next_date - prev_date).num_days();
            if duration < config.gap_threshold_days {
                continue;
            }
            raw_gaps.push(Gap {
                gap_id: Uuid::new_v4().to_string(),
                start_date: prev_date,
                end_date: next_date,
                duration_days: duration,
                threshold_days: config.gap_threshold_days,
                confidence: 70,
                related_event_ids: [prev.event_id.clone(), next.event_id.clone()],
                rationale: rationale_for(prev, next),
                patient_label: if scope == "default" { None } else { Some(scope.clone()) },
            });
        }

        all_gaps.extend(collapse_routine_runs(raw_gaps));
    }

    all_gaps
}

fn collapse_routine_runs(gaps: Vec<Gap>) -> Vec<Gap> {
    let mut result = Vec::new();
    let mut i = 0;
    while i < gaps.len() {
        if gaps[i].rationale != GapRationale::RoutineContinuityGap {
            result.push(gaps[i].clone());
            i += 1;
            continue;
        }

        let mut run_end = i;
        while run_end + 1 < gaps.len()
            && gaps[run_end + 1].rationale == GapRationale::RoutineContinuityGap
            && (gaps[run_end + 1].duration_days - gaps[run_end].duration_days).abs() <= COLLAPSE_MAX_DURATION_DELTA
        {
            run_end += 1;
        }

        let run_len = run_end - i + 1;
        if run_len >= COLLAPSE_MIN_RUN {
            let first = &gaps[i];
            let last = &gaps[run_end];
            result.push(Gap {
                gap_id: Uuid::new_v4().to_string(),
                start_date: first.start_date,
                end_date: last.end_date,
                duration_days: (last.end_date - first.start_date).num_days(),
                threshold_days: first.threshold_days,
                confidence: first.confidence,
                related_event_ids: [first.related_event_ids[0].clone(), last.related_event_ids[1].clone()],
                rationale: GapRationale::RoutineContinuityGapCollapsed,
                patient_label: first.patient_label.clone(),
            });
        } else {
            result.extend(gaps[i..=run_end].iter().cloned());
        }

        i = run_end + 1;
    }
    result
}
