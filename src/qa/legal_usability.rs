//! Legal-Usability scorer: composes LUQA + Attorney-Readiness, then checks
//! case-theory sections and source-to-output claim chains.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{ScorerContext, ScorerFailure, ScorerResult, Severity};

const REQUIRED_SECTIONS: [&str; 3] = ["Liability Facts", "Causation Chain", "Damages Progression"];
const APPENDIX_MARKERS: [&str; 7] =
    ["top 10 case-driving events", "appendix a:", "appendix b:", "appendix c:", "appendix d:", "appendix e:", "appendix f:"];

static MECHANISM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(mva|mvc|motor vehicle|rear[- ]end|collision|fall|slip and fall|assault)\b").unwrap());
static DAMAGES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(pain\s*\d+\s*/\s*10|rom|range of motion|strength\s*[0-5](?:\.\d+)?\s*/\s*5|restriction|unable to work|light duty)\b").unwrap()
});
static TREATMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(procedure|surgery|injection|epidural|fluoroscopy|depo-?medrol|lidocaine)\b").unwrap());

static SOURCE_ED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(triage|hpi|emergency|ed visit|chief complaint)\b").unwrap());
static SOURCE_MRI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(mri|impression)\b").unwrap());
static SOURCE_ORTHO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(ortho|orthopedic)\b").unwrap());
static SOURCE_ORTHO_QUALIFIER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(assessment|plan)\b").unwrap());
static SOURCE_PROCEDURE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(depo-?medrol|lidocaine|fluoroscopy|interlaminar|transforaminal|epidural)\b").unwrap());
static SOURCE_PT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(pt eval|physical therapy|range of motion|strength\s*[0-5]\s*/\s*5)\b").unwrap());

static LOW_VALUE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"(?i)\binformed consent\b", r"(?i)\bface sheet\b", r"(?i)\bimpact was bp\b", r"(?i)\bchief complaint\s*&\s*history of present illness:?\b"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});
static ARTIFACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"(?i)\bimpact was bp\b", r"\[\s*[xX ]\s*\]", r"(?im)\bchief complaint\s*&\s*history of present illness\s*:\s*$"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

fn find_slice<'a>(text: &'a str, low: &str, start_marker: &str, end_markers: &[&str]) -> Option<&'a str> {
    let start = low.find(start_marker)?;
    let end = end_markers.iter().filter_map(|m| low[start + 1..].find(m).map(|p| p + start + 1)).min().unwrap_or(text.len());
    Some(&text[start..end])
}

/// Composes LUQA and Attorney-Readiness results with case-theory and
/// claim-chain checks that are specific to legal usability.
pub fn score(report_text: &str, ctx: &ScorerContext, luqa: &ScorerResult, attorney: &ScorerResult) -> ScorerResult {
    let mut failures = Vec::new();
    let mut hard_fail = false;

    if !luqa.pass_ {
        hard_fail = true;
        failures.push(ScorerFailure::new(
            "LEGAL_LUQA_FAILED",
            Severity::Hard,
            "LUQA failed; chronology is not legally usable.",
            luqa.failures.iter().take(5).map(|f| f.code.clone()).collect(),
        ));
    }
    if !attorney.pass_ {
        hard_fail = true;
        failures.push(ScorerFailure::new(
            "LEGAL_ATTORNEY_READINESS_FAILED",
            Severity::Hard,
            "Attorney readiness failed.",
            attorney.failures.iter().take(5).map(|f| f.code.clone()).collect(),
        ));
    }

    let low = report_text.to_ascii_lowercase();
    let missing_sections: Vec<&str> = REQUIRED_SECTIONS.into_iter().filter(|s| !low.contains(&s.to_ascii_lowercase())).collect();
    if !missing_sections.is_empty() {
        hard_fail = true;
        failures.push(ScorerFailure::new(
            "LEGAL_MISSING_CASE_THEORY_SECTIONS",
            Severity::Hard,
            "Required case-theory sections are missing from rendered output.",
            missing_sections.iter().map(|s| s.to_string()).collect(),
        ));
    }

    for section in REQUIRED_SECTIONS {
        let marker = section.to_ascii_lowercase();
        if let Some(slice) = find_slice(report_text, &low, &marker, &APPENDIX_MARKERS) {
            if !slice.to_ascii_lowercase().contains("citation(s):") {
                hard_fail = true;
                failures.push(ScorerFailure::new(
                    "LEGAL_SECTION_UNCITED",
                    Severity::Hard,
                    format!("{section} section lacks citation-backed statements."),
                    vec![],
                ));
            }
        }
    }

    let mut source_buckets = std::collections::HashSet::new();
    for text in ctx.page_text_by_number.values() {
        if SOURCE_ED_RE.is_match(text) {
            source_buckets.insert("ED");
        }
        if SOURCE_MRI_RE.is_match(text) {
            source_buckets.insert("MRI");
        }
        if SOURCE_ORTHO_RE.is_match(text) && SOURCE_ORTHO_QUALIFIER_RE.is_match(text) {
            source_buckets.insert("ORTHO");
        }
        if SOURCE_PROCEDURE_RE.is_match(text) {
            source_buckets.insert("PROCEDURE");
        }
        if SOURCE_PT_RE.is_match(text) {
            source_buckets.insert("PT");
        }
    }

    let timeline_slice = find_slice(report_text, &low, "chronological medical timeline", &["top 10 case-driving events"]).unwrap_or(report_text);
    let low_timeline = timeline_slice.to_ascii_lowercase();
    let mechanism_present = MECHANISM_RE.is_match(&low_timeline);
    let treatment_present = TREATMENT_RE.is_match(&low_timeline);
    let damages_present = DAMAGES_RE.is_match(&low_timeline);

    if source_buckets.contains("ED") && !mechanism_present {
        hard_fail = true;
        failures.push(ScorerFailure::new(
            "LEGAL_MISSING_MECHANISM_CHAIN",
            Severity::Hard,
            "ED signal present in source but mechanism is absent in rendered timeline.",
            vec![],
        ));
    }
    if source_buckets.contains("PROCEDURE") && !treatment_present {
        hard_fail = true;
        failures.push(ScorerFailure::new(
            "LEGAL_MISSING_TREATMENT_CHAIN",
            Severity::Hard,
            "Procedure signal present in source but treatment intervention chain is absent.",
            vec![],
        ));
    }
    if source_buckets.contains("PT") && !damages_present {
        hard_fail = true;
        failures.push(ScorerFailure::new(
            "LEGAL_MISSING_DAMAGES_PROGRESSION",
            Severity::Hard,
            "PT signal present in source but damages/progression facts are absent in timeline.",
            vec![],
        ));
    }

    let top10_slice = find_slice(report_text, &low, "top 10 case-driving events", &["appendix a:"]).unwrap_or(report_text);
    let low_value_hits: Vec<String> = LOW_VALUE_PATTERNS.iter().filter_map(|re| re.find(top10_slice)).map(|m| m.as_str().to_string()).collect();
    if !low_value_hits.is_empty() {
        hard_fail = true;
        failures.push(ScorerFailure::new(
            "LEGAL_LOW_VALUE_SNIPPET_LEAK",
            Severity::Hard,
            "Top 10 contains low-value administrative/consent snippets.",
            low_value_hits.clone(),
        ));
    }

    let artifact_hits: Vec<String> = ARTIFACT_PATTERNS.iter().filter_map(|re| re.find(report_text)).map(|m| m.as_str().to_string()).collect();
    if !artifact_hits.is_empty() {
        hard_fail = true;
        failures.push(ScorerFailure::new(
            "LEGAL_ARTIFACT_TEXT_LEAK",
            Severity::Hard,
            "Rendered report contains residual extraction artifacts.",
            artifact_hits,
        ));
    }

    let mut score = luqa.score_0_100.min(attorney.score_0_100);
    if hard_fail {
        score = score.min(60);
    }
    let pass_ = !hard_fail && score >= 90;

    let mut metrics = serde_json::Map::new();
    metrics.insert("luqa_pass".into(), luqa.pass_.into());
    metrics.insert("attorney_ready_pass".into(), attorney.pass_.into());
    metrics.insert("mechanism_present".into(), mechanism_present.into());
    metrics.insert("treatment_present".into(), treatment_present.into());
    metrics.insert("damages_present".into(), damages_present.into());

    ScorerResult { pass_, score_0_100: score, failures, metrics }
}
