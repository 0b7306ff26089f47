//! Claim-edge construction: turns projection rows into atomic, scored
//! assertions (component for the Top-10 Case-Driving Events selection and
//! the Legal-Usability Liability/Causation/Damages chains).
//!
//! Ported from `claim_ledger_lite.py`'s `build_claim_edges` /
//! `_claim_type_for_fact` / `_support_score`: each fact on a projection row
//! becomes one `ClaimEdge`, classified into a `ClaimType` by regex
//! dispatch, scored 0-10 by a handful of lexical signals, and weighted by
//! a fixed per-type materiality table so `selection_score` can rank them.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::model::{ChronologyProjectionEntry, ClaimEdge, ClaimType};

const MAX_ASSERTION_CHARS: usize = 220;

static WORK_RESTRICTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(work restriction|light duty|no lifting|off work|return to work|modified duty)\b").unwrap());
static MEDICATION_CHANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(prescribed|discontinue[d]?|increase[d]? dose|decrease[d]? dose|start(?:ed|ing)? \w+ mg)\b").unwrap());
static PROCEDURE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(injection|surgery|arthroscopy|fusion|discectomy|esi|epidural steroid injection|fluoroscopy)\b").unwrap());
static IMAGING_FINDING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(impression|finding|abnormal|fracture|tear|herniation|stenosis|protrusion)\b").unwrap());
static ICD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b[A-TV-Z][0-9][0-9A-Z](?:\.[0-9A-Z]{1,4})?\b").unwrap());
static PT_DX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(strain|sprain|radiculopathy|myalgia)\b").unwrap());
static DIAGNOSIS_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(diagnosis|diagnosed with|assessment:)\b").unwrap());
static PRE_EXISTING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(pre-?existing|prior to (?:the )?accident|degenerative|chronic (?:condition|history))\b").unwrap());
static SYMPTOM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(pain|numbness|tingling|weakness|stiffness|swelling)\b").unwrap());
static DEGENERATIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(degenerative|age-related|chronic wear)\b").unwrap());
static ACUTE_EXCLUSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(acute|post-traumatic|new onset)\b").unwrap());

static MATERIALITY_WEIGHT: Lazy<HashMap<ClaimType, i32>> = Lazy::new(|| {
    [
        (ClaimType::Procedure, 3),
        (ClaimType::ImagingFinding, 3),
        (ClaimType::InjuryDx, 2),
        (ClaimType::MedicationChange, 2),
        (ClaimType::WorkRestriction, 2),
        (ClaimType::GapInCare, 2),
        (ClaimType::TreatmentVisit, 1),
        (ClaimType::Symptom, 1),
        (ClaimType::PreExistingMention, 1),
    ]
    .into_iter()
    .collect()
});

fn claim_type_for_fact(event_type_display: &str, fact: &str) -> ClaimType {
    if WORK_RESTRICTION_RE.is_match(fact) {
        return ClaimType::WorkRestriction;
    }
    if MEDICATION_CHANGE_RE.is_match(fact) {
        return ClaimType::MedicationChange;
    }
    if PROCEDURE_RE.is_match(fact) || event_type_display.eq_ignore_ascii_case("Procedure/Surgery") {
        return ClaimType::Procedure;
    }
    if IMAGING_FINDING_RE.is_match(fact) {
        return ClaimType::ImagingFinding;
    }
    if ICD_RE.is_match(fact) || PT_DX_RE.is_match(fact) || DIAGNOSIS_KEYWORD_RE.is_match(fact) {
        return ClaimType::InjuryDx;
    }
    if PRE_EXISTING_RE.is_match(fact) {
        return ClaimType::PreExistingMention;
    }
    if SYMPTOM_RE.is_match(fact) {
        return ClaimType::Symptom;
    }
    ClaimType::TreatmentVisit
}

fn support_score(claim_type: ClaimType, assertion: &str, flags: &BTreeSet<String>) -> i32 {
    let mut score = 0;
    match claim_type {
        ClaimType::ImagingFinding if IMAGING_FINDING_RE.is_match(assertion) => score += 3,
        ClaimType::InjuryDx => score += 2,
        ClaimType::Procedure => score += 2,
        ClaimType::Symptom => score += 1,
        _ => {}
    }
    if flags.contains("laterality_conflict") || flags.contains("timing_inconsistency") {
        score -= 3;
    }
    if flags.contains("degenerative_language") {
        score -= 2;
    }
    if flags.contains("treatment_gap") {
        score -= 2;
    }
    score.clamp(0, 10)
}

fn clean_assertion(raw: &str) -> String {
    let collapsed: String = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let collapsed = collapsed.replace("DISCHARGE SUMMARY DISCHARGE SUMMARY", "DISCHARGE SUMMARY");
    if collapsed.chars().count() > MAX_ASSERTION_CHARS {
        collapsed.chars().take(MAX_ASSERTION_CHARS).collect()
    } else {
        collapsed
    }
}

fn degenerative_language_flag(fact: &str) -> bool {
    DEGENERATIVE_RE.is_match(fact) && !ACUTE_EXCLUSION_RE.is_match(fact)
}

fn parse_entry_date(date_display: &str) -> Option<NaiveDate> {
    let candidate = date_display.split_whitespace().next()?;
    NaiveDate::parse_from_str(candidate, "%Y-%m-%d").ok()
}

/// Builds one `ClaimEdge` per fact across every projection entry. Entries
/// with no facts are skipped; they carry nothing for a claim-driven
/// narrative to point at.
pub fn build_claim_edges(entries: &[ChronologyProjectionEntry]) -> Vec<ClaimEdge> {
    let mut edges = Vec::new();

    for entry in entries {
        if entry.facts.is_empty() {
            continue;
        }
        let date = parse_entry_date(&entry.date_display);

        for fact in &entry.facts {
            let claim_type = claim_type_for_fact(&entry.event_type_display, fact);

            let mut flags: BTreeSet<String> = BTreeSet::new();
            if date.is_none() {
                flags.insert("timing_ambiguous".to_string());
            }
            if degenerative_language_flag(fact) {
                flags.insert("degenerative_language".to_string());
            }

            let assertion = clean_assertion(fact);
            let score = support_score(claim_type, &assertion, &flags);
            let weight = *MATERIALITY_WEIGHT.get(&claim_type).unwrap_or(&1);

            edges.push(ClaimEdge {
                id: Uuid::new_v4().to_string(),
                event_id: entry.event_id.clone(),
                patient_label: entry.patient_label.clone(),
                claim_type,
                date,
                body_region: None,
                provider: Some(entry.provider_display.clone()),
                assertion,
                citations: vec![entry.citation_display.clone()],
                support_score: score,
                flags,
                materiality_weight: weight,
                extras: Default::default(),
            });
        }
    }

    edges
}
