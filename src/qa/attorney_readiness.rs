//! Attorney-Readiness scorer: required section headers, citation coverage,
//! fact density, and required-bucket presence — independent of LUQA.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::ChronologyProjectionEntry;

use super::{ScorerContext, ScorerFailure, ScorerResult, Severity};

const SECTION_HEADERS: [&str; 6] = [
    "Medical Chronology Analysis",
    "Chronological Medical Timeline",
    "Top 10 Case-Driving Events",
    "Appendix A:",
    "Appendix B:",
    "Appendix C",
];

static FACT_TOKEN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bchief complaint\b",
        r"(?i)\bhpi\b|\bhistory of present illness\b",
        r"(?i)\b\d+\s*/\s*10\b",
        r"(?i)\b\d+\s*(?:deg|degree|degrees)\b",
        r"(?i)\b[0-5](?:\.\d+)?\s*/\s*5\b",
        r"(?i)\b(?:bp|blood pressure)\s*[:=]?\s*\d{2,3}\s*/\s*\d{2,3}\b",
        r"(?i)\b(?:hydrocodone|oxycodone|lidocaine|depo-?medrol|toradol|ketorolac|ibuprofen|acetaminophen)\b.*\b\d+(?:\.\d+)?\s*(?:mg|mcg|ml)\b",
        r"(?i)\b(?:c\d-\d|l\d-\d|radiculopathy|disc|protrusion|stenosis|strain|sprain)\b",
        r"(?i)\b(?:assessment|impression|plan)\b",
        r"(?i)\b(?:procedure|fluoroscopy|injection)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static BUCKET_ED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(triage|hpi|emergency|ed visit|chief complaint)\b").unwrap());
static BUCKET_MRI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bmri\b.*\b(impression|findings|c\d-\d|l\d-\d)\b|\bimpression\b.*\bmri\b").unwrap());
static BUCKET_ORTHO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(ortho|orthopedic|orthopaedic)\b.*\b(assessment|plan|impression)\b").unwrap());
static BUCKET_PROCEDURE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(depo-?medrol|lidocaine|fluoroscopy|interlaminar|transforaminal|epidural)\b").unwrap());

static MILESTONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(ed|emergency|mri|imaging|orthopedic|ortho|procedure|injection|fluoroscopy|admission|discharge)\b").unwrap()
});
static RENDERED_ED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(ed|emergency|chief complaint|triage)\b").unwrap());
static RENDERED_MRI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(mri|impression|imaging)\b").unwrap());
static RENDERED_ORTHO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(ortho|orthopedic|orthopaedic)\b").unwrap());
static RENDERED_PROCEDURE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(procedure|injection|fluoroscopy|depo-medrol|lidocaine)\b").unwrap());

struct Row<'a> {
    event_type: &'a str,
    facts: Vec<&'a str>,
    citation: &'a str,
}

fn fact_category_count(text: &str) -> usize {
    FACT_TOKEN_PATTERNS.iter().filter(|re| re.is_match(text)).count()
}

fn rows_from_projection(entries: &[ChronologyProjectionEntry]) -> Vec<Row> {
    entries
        .iter()
        .filter_map(|e| {
            let facts: Vec<&str> = e.facts.iter().map(|f| f.as_str()).filter(|f| !f.trim().is_empty()).collect();
            if facts.is_empty() || e.citation_display.trim().is_empty() {
                return None;
            }
            if fact_category_count(&facts.join(" ")) < 2 {
                return None;
            }
            Some(Row { event_type: e.event_type_display.as_str(), facts, citation: e.citation_display.as_str() })
        })
        .collect()
}

fn is_milestone_row(row: &Row) -> bool {
    let blob = format!("{} {}", row.event_type, row.facts.join(" "));
    MILESTONE_RE.is_match(&blob)
}

fn source_buckets(pages: &HashMap<u32, String>) -> std::collections::HashSet<&'static str> {
    let mut present = std::collections::HashSet::new();
    for text in pages.values() {
        if BUCKET_ED_RE.is_match(text) {
            present.insert("ED");
        }
        if BUCKET_MRI_RE.is_match(text) {
            present.insert("MRI");
        }
        if BUCKET_ORTHO_RE.is_match(text) {
            present.insert("ORTHO");
        }
        if BUCKET_PROCEDURE_RE.is_match(text) {
            present.insert("PROCEDURE");
        }
    }
    present
}

fn timeline_buckets(rows: &[Row]) -> std::collections::HashSet<&'static str> {
    let mut present = std::collections::HashSet::new();
    for row in rows {
        let blob = format!("{} {}", row.event_type, row.facts.join(" "));
        if RENDERED_ED_RE.is_match(&blob) {
            present.insert("ED");
        }
        if RENDERED_MRI_RE.is_match(&blob) {
            present.insert("MRI");
        }
        if RENDERED_ORTHO_RE.is_match(&blob) {
            present.insert("ORTHO");
        }
        if RENDERED_PROCEDURE_RE.is_match(&blob) {
            present.insert("PROCEDURE");
        }
    }
    present
}

/// Scores section presence, citation coverage, fact density, and
/// required-bucket coverage for the rendered report.
pub fn score(report_text: &str, ctx: &ScorerContext) -> ScorerResult {
    let mut failures = Vec::new();
    let mut hard_fail = false;
    let mut penalties = 0.0_f64;

    let low = report_text.to_ascii_lowercase();
    let missing_sections: Vec<&str> = SECTION_HEADERS.into_iter().filter(|h| !low.contains(&h.to_ascii_lowercase())).collect();
    if !missing_sections.is_empty() {
        hard_fail = true;
        failures.push(ScorerFailure::new(
            "AR_MISSING_REQUIRED_SECTIONS",
            Severity::Hard,
            "Required litigation sections missing.",
            missing_sections.iter().map(|s| s.to_string()).collect(),
        ));
    }

    let rows = rows_from_projection(ctx.projection_entries);
    let row_count = rows.len();
    if row_count == 0 {
        hard_fail = true;
        failures.push(ScorerFailure::new("AR_EMPTY_TIMELINE", Severity::Hard, "No timeline rows rendered.", vec![]));
    }

    let uncited: usize = rows.iter().filter(|r| r.citation.trim().is_empty()).count();
    let uncited_ratio = if row_count > 0 { uncited as f64 / row_count as f64 } else { 1.0 };
    if uncited_ratio > 0.05 {
        hard_fail = true;
        failures.push(ScorerFailure::new("AR_UNCITED_FACT_ROWS", Severity::Hard, format!("Too many uncited timeline rows: {uncited_ratio:.3}"), vec![]));
    }

    let dense_rows = rows
        .iter()
        .filter(|r| {
            let cats = fact_category_count(&r.facts.join(" "));
            cats >= 2 || (is_milestone_row(r) && cats >= 1)
        })
        .count();
    let fact_density_ratio = if row_count > 0 { dense_rows as f64 / row_count as f64 } else { 0.0 };
    if fact_density_ratio < 0.60 {
        hard_fail = true;
        failures.push(ScorerFailure::new("AR_FACT_DENSITY_LOW", Severity::Hard, format!("Fact-dense row ratio below threshold: {fact_density_ratio:.3}"), vec![]));
    }
    penalties += ((0.60 - fact_density_ratio).max(0.0) * 30.0).min(30.0);

    let src_buckets = source_buckets(ctx.page_text_by_number);
    let rendered_buckets = timeline_buckets(&rows);
    let mut missing_buckets: Vec<&str> = src_buckets.difference(&rendered_buckets).copied().collect();
    missing_buckets.sort();
    if !missing_buckets.is_empty() {
        hard_fail = true;
        failures.push(ScorerFailure::new(
            "AR_REQUIRED_BUCKETS_MISSING",
            Severity::Hard,
            "Milestone buckets present in source but missing in timeline.",
            missing_buckets.iter().map(|s| s.to_string()).collect(),
        ));
    }

    let mut score = (100.0 - penalties).clamp(0.0, 100.0).round() as i32;
    if hard_fail {
        score = score.min(60);
    }
    let pass_ = !hard_fail && score >= 90;

    let mut metrics = serde_json::Map::new();
    metrics.insert("timeline_row_count".into(), row_count.into());
    metrics.insert("uncited_ratio".into(), uncited_ratio.into());
    metrics.insert("fact_density_ratio".into(), fact_density_ratio.into());

    ScorerResult { pass_, score_0_100: score, failures, metrics }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_report() -> String {
        "# Medical Chronology Analysis\n\
         ## Chronological Medical Timeline\n\
         ## Top 10 Case-Driving Events\n\
         Appendix A: Source Documents\n\
         Appendix B: Excluded Pages\n\
         Appendix C Notes\n"
            .to_string()
    }

    fn entry(facts: Vec<&str>, citation: &str) -> ChronologyProjectionEntry {
        ChronologyProjectionEntry {
            event_id: "e1".into(),
            date_display: "2024-01-01 (time not documented)".into(),
            provider_display: "Dr. Smith".into(),
            event_type_display: "ER Visit".into(),
            patient_label: "Patient A".into(),
            facts: facts.into_iter().map(|s| s.to_string()).collect(),
            citation_display: citation.into(),
            confidence: 80,
            extras: Default::default(),
        }
    }

    #[test]
    fn test_missing_sections_hard_fails() {
        let pages = HashMap::new();
        let ctx = ScorerContext { projection_entries: &[], page_text_by_number: &pages };
        let result = score("no sections here", &ctx);
        assert!(!result.pass_);
        assert!(result.failures.iter().any(|f| f.code == "AR_MISSING_REQUIRED_SECTIONS"));
    }

    #[test]
    fn test_all_sections_present_but_empty_timeline_fails() {
        let pages = HashMap::new();
        let ctx = ScorerContext { projection_entries: &[], page_text_by_number: &pages };
        let result = score(&full_report(), &ctx);
        assert!(result.failures.iter().any(|f| f.code == "AR_EMPTY_TIMELINE"));
    }

    #[test]
    fn test_dense_cited_row_passes_density_check() {
        let entries = vec![entry(vec!["Chief complaint: neck pain. Assessment: cervical strain."], "[packet.pdf p. 2]")];
        let pages = HashMap::new();
        let ctx = ScorerContext { projection_entries: &entries, page_text_by_number: &pages };
        let result = score(&full_report(), &ctx);
        assert!(result.failures.iter().all(|f| f.code != "AR_FACT_DENSITY_LOW"));
    }
}
