//! The master Litigation Checklist (component O): the gate that decides
//! whether a run's rendered artifacts are fit to hand to an attorney.
//!
//! Unlike the three scorers in [`super::luqa`], [`super::attorney_readiness`]
//! and [`super::legal_usability`] — each of which produces its own
//! independent pass/fail — this module composes their results with a
//! further battery of hard invariants (`H*`), quality gates (`Q*`),
//! semantic gates (`Q_SEM_*`) and usability gates (`Q_USE_*`), then applies
//! the scoring rubric that determines the run's final disposition.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::claim_guard::ClaimAudit;
use crate::model::{ChronologyProjectionEntry, ClaimEdge, ClaimType, Gap, GapRationale};

use super::{ScorerContext, ScorerFailure, ScorerResult, Severity};

/// Everything the checklist needs beyond what the three scorers already
/// computed. Gathered by the orchestrator once rendering finishes.
pub struct ChecklistInput<'a> {
    pub report_text: &'a str,
    pub ctx: &'a ScorerContext<'a>,
    pub luqa: &'a ScorerResult,
    pub attorney: &'a ScorerResult,
    pub legal: &'a ScorerResult,
    pub claim_audit: &'a ClaimAudit,
    pub claim_edges: &'a [ClaimEdge],
    pub gaps: &'a [Gap],
    pub rendered_artifact_names: &'a [String],
}

const REQUIRED_ARTIFACT_NAMES: [&str; 14] = [
    "chronology.pdf",
    "chronology.csv",
    "chronology.docx",
    "chronology.md",
    "evidence_graph.json",
    "missing_records.json",
    "selection_debug.json",
    "claim_guard_report.json",
    "render_manifest.json",
    "luqa_report.json",
    "attorney_readiness_report.json",
    "legal_usability_report.json",
    "semqa_debug.json",
    "qa_litigation_checklist.json",
];

static VITALS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:bp|blood pressure)\s*[:=]?\s*\d{2,3}\s*/\s*\d{2,3}\b|\bhr\s*\d+\b|\brr\s*\d+\b|\bspo2\s*\d+\b|\btemp\s*\d").unwrap());
static PRO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bpatient (?:reports?|states?|denies|endorses)\b").unwrap());
static ADMIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(informed consent|face sheet|registration|insurance verification|hipaa acknowledg(?:e)?ment)\b").unwrap());
static ROUTINE_LAB_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(cbc|cmp|bmp|routine (?:labs?|bloodwork)|urinalysis)\s+(?:wnl|within normal limits|unremarkable)\b").unwrap());

static DOSE_CHANGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:increase[d]?|decrease[d]?|start(?:ed|ing)?|discontinue[d]?)\b").unwrap());
static DOSAGE_MG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*mg\b").unwrap());

static ENCOUNTER_HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bencounter:\s").unwrap());
static PAIN_SCORE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bpain\s*(?:score|severity|level)?\s*[:=]?\s*(\d{1,2})\s*/\s*10\b").unwrap());

static SDOH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(housing insecurity|food insecurity|transportation barrier|unemployed due to|lack of insurance)\b").unwrap());

static INPATIENT_MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(admitted to|inpatient (?:unit|floor|stay)|hospital day \d+|discharge summary)\b").unwrap());
static MECHANISM_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(mva|mvc|motor vehicle|rear[- ]end|collision|fall|slip and fall|assault)\b").unwrap());
static PROCEDURE_ANCHOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(c\d-\d|l\d-\d|t\d-\d|right|left|bilateral|interlaminar|transforaminal|epidural|fluoroscopy|arthroscopy)\b").unwrap());
static DX_MEDICAL_TERM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(radiculopathy|herniation|disc|strain|sprain|stenosis|protrusion|fracture|tear|neuropathy|myalgia)\b").unwrap());
static DX_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b[A-TV-Z][0-9][0-9A-Z](?:\.[0-9A-Z]{1,4})?\b").unwrap());
static TREATMENT_TIMEFRAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Treatment Timeframe:\s*(\d{4}-\d{2}-\d{2})\s*to\s*(\d{4}-\d{2}-\d{2})").unwrap());

static NOISE_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\ufffd|[\x00-\x08\x0B\x0C\x0E-\x1F]").unwrap());
static TEMPLATE_PHRASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(lorem ipsum|insert (?:patient|provider) name here|\[placeholder\]|todo:|tbd\b)\b").unwrap()
});

struct Row<'a> {
    date_display: &'a str,
    event_type_display: &'a str,
    patient_label: &'a str,
    facts_text: String,
    citation: &'a str,
}

fn rows<'a>(entries: &'a [ChronologyProjectionEntry]) -> Vec<Row<'a>> {
    entries
        .iter()
        .map(|e| Row {
            date_display: &e.date_display,
            event_type_display: &e.event_type_display,
            patient_label: &e.patient_label,
            facts_text: e.facts.join(" "),
            citation: &e.citation_display,
        })
        .collect()
}

fn parse_row_date(date_display: &str) -> Option<chrono::NaiveDate> {
    let candidate = date_display.split_whitespace().next()?;
    chrono::NaiveDate::parse_from_str(candidate, "%Y-%m-%d").ok()
}

/// Evaluates every hard invariant, quality gate, semantic gate and
/// usability gate, then applies the scoring rubric: start at 100, subtract
/// `min(60, 15 * hard_failures)`, subtract `100 * max(0, vitals_ratio -
/// 0.10)`, subtract `100 * max(0, admin_ratio - 0.05)`, subtract `5 *
/// failed_quality_gates` capped at 20, add a 5-point bonus if every gate
/// passes with no polish warnings, clamp to `[0, 100]`. Overall
/// `pass = hard_pass && quality_pass && score >= 98`.
pub fn evaluate(input: &ChecklistInput) -> ScorerResult {
    let mut hard_failures: Vec<ScorerFailure> = Vec::new();
    let mut quality_failures: Vec<ScorerFailure> = Vec::new();

    let all_rows = rows(input.ctx.projection_entries);
    let low_report = input.report_text.to_ascii_lowercase();

    // --- Hard invariants ---------------------------------------------

    // H1: no fabricated high-risk claim survives claim-guard redaction.
    for rejected in &input.claim_audit.rejected_claims {
        if low_report.contains(&rejected.value.to_ascii_lowercase()) {
            hard_failures.push(ScorerFailure::new(
                "H1_NO_FABRICATED_HIGH_RISK_CLAIMS",
                Severity::Hard,
                "A claim-guard-rejected high-risk claim still appears in the rendered report.",
                vec![rejected.value.clone()],
            ));
        }
    }

    // H2: patient-boundary integrity — a single-patient chronology never
    // mixes rows carrying two distinct named patient labels.
    let named_patients: HashSet<&str> = all_rows.iter().map(|r| r.patient_label).filter(|p| *p != "Unknown Patient").collect();
    if named_patients.len() > 1 {
        let mut names: Vec<&str> = named_patients.into_iter().collect();
        names.sort();
        hard_failures.push(ScorerFailure::new(
            "H2_PATIENT_BOUNDARY_INTEGRITY",
            Severity::Hard,
            "More than one named patient appears in a single chronology.",
            names.into_iter().map(str::to_string).collect(),
        ));
    }

    // H3: no Unknown-Patient rows in the rendered core timeline.
    let unknown_rows: Vec<String> = all_rows.iter().filter(|r| r.patient_label == "Unknown Patient").map(|r| r.date_display.to_string()).collect();
    if !unknown_rows.is_empty() {
        hard_failures.push(ScorerFailure::new(
            "H3_NO_UNKNOWN_PATIENT_ROWS",
            Severity::Hard,
            "Unknown-Patient rows present in the core timeline.",
            unknown_rows,
        ));
    }

    // H4: at least 95% of timeline rows carry a citation.
    let cited = all_rows.iter().filter(|r| !r.citation.trim().is_empty()).count();
    let uncited_ratio = if all_rows.is_empty() { 1.0 } else { 1.0 - (cited as f64 / all_rows.len() as f64) };
    if uncited_ratio > 0.05 {
        hard_failures.push(ScorerFailure::new(
            "H4_CITATION_COVERAGE_FLOOR",
            Severity::Hard,
            format!("Uncited row ratio {uncited_ratio:.3} exceeds the 5% floor."),
            vec![],
        ));
    }

    // H5: temporal sanity — rendered rows are in non-decreasing date order.
    let parsed_dates: Vec<chrono::NaiveDate> = all_rows.iter().filter_map(|r| parse_row_date(r.date_display)).collect();
    let monotonic = parsed_dates.windows(2).all(|w| w[0] <= w[1]);
    if !monotonic {
        hard_failures.push(ScorerFailure::new("H5_TEMPORAL_SANITY", Severity::Hard, "Timeline rows are not in non-decreasing date order.", vec![]));
    }

    // H6: no provider/facility contamination tokens (synthetic test-data
    // markers leaking into a real chronology).
    const CONTAMINATION_TOKENS: [&str; 3] = ["synthea", "stress test generator", "medical record summary (demo)"];
    let contamination_hits: Vec<String> = CONTAMINATION_TOKENS.iter().filter(|t| low_report.contains(**t)).map(|t| t.to_string()).collect();
    if !contamination_hits.is_empty() {
        hard_failures.push(ScorerFailure::new("H6_NO_CONTAMINATION_TOKENS", Severity::Hard, "Synthetic/demo contamination tokens found in output.", contamination_hits));
    }

    // H7: determinism. Enforced upstream (no randomness, no wall-clock
    // reads in any classification/scoring path); nothing to check here at
    // single-run evaluation time.

    // H8: output-contract completeness — every required artifact rendered.
    let rendered: HashSet<&str> = input.rendered_artifact_names.iter().map(|s| s.as_str()).collect();
    let missing_artifacts: Vec<String> = REQUIRED_ARTIFACT_NAMES.iter().filter(|n| !rendered.contains(*n)).map(|n| n.to_string()).collect();
    if !missing_artifacts.is_empty() {
        hard_failures.push(ScorerFailure::new("H8_OUTPUT_CONTRACT_COMPLETE", Severity::Hard, "Required artifacts missing from render manifest.", missing_artifacts));
    }

    // --- Quality gates -------------------------------------------------

    let mut vitals_rows = 0usize;
    let mut admin_rows = 0usize;
    let mut routine_lab_rows = 0usize;
    for row in &all_rows {
        if VITALS_RE.is_match(&row.facts_text) || PRO_RE.is_match(&row.facts_text) {
            vitals_rows += 1;
        }
        if ADMIN_RE.is_match(&row.facts_text) {
            admin_rows += 1;
        }
        if ROUTINE_LAB_RE.is_match(&row.facts_text) {
            routine_lab_rows += 1;
        }
    }
    let row_count = all_rows.len().max(1);
    let vitals_ratio = vitals_rows as f64 / row_count as f64;
    let admin_ratio = admin_rows as f64 / row_count as f64;

    // Q1: substance ratio — vitals/PRO rows stay under 10%, admin rows
    // under 5%, and routine unremarkable labs never make the timeline.
    if vitals_ratio > 0.10 || admin_ratio > 0.05 || routine_lab_rows > 0 {
        quality_failures.push(ScorerFailure::new(
            "Q1_SUBSTANCE_RATIO",
            Severity::Soft,
            format!("vitals_ratio={vitals_ratio:.3} admin_ratio={admin_ratio:.3} routine_lab_rows={routine_lab_rows}"),
            vec![],
        ));
    }

    // Q2: emergent-selection coverage floor — if an ImagingFinding,
    // Procedure or InjuryDx claim edge exists at all, at least one of that
    // type must have made the Top-10 selection.
    let mut by_type_present: HashSet<ClaimType> = HashSet::new();
    let mut by_type_selected: HashSet<ClaimType> = HashSet::new();
    let mut ranked: Vec<&ClaimEdge> = input.claim_edges.iter().collect();
    ranked.sort_by_key(|e| std::cmp::Reverse(e.selection_score()));
    for edge in input.claim_edges {
        by_type_present.insert(edge.claim_type);
    }
    for edge in ranked.iter().take(10) {
        by_type_selected.insert(edge.claim_type);
    }
    for emergent in [ClaimType::ImagingFinding, ClaimType::Procedure, ClaimType::InjuryDx] {
        if by_type_present.contains(&emergent) && !by_type_selected.contains(&emergent) {
            quality_failures.push(ScorerFailure::new(
                "Q2_EMERGENT_SELECTION_COVERAGE",
                Severity::Soft,
                format!("{emergent:?} claims exist but none were selected into the Top-10."),
                vec![],
            ));
            break;
        }
    }

    // Q3: medication-change plausibility — a claimed dose change names a
    // dosage in a clinically plausible range.
    let implausible_dose_edges: Vec<String> = input
        .claim_edges
        .iter()
        .filter(|e| e.claim_type == ClaimType::MedicationChange && DOSE_CHANGE_RE.is_match(&e.assertion))
        .filter(|e| match DOSAGE_MG_RE.captures(&e.assertion) {
            None => true,
            Some(c) => c[1].parse::<f64>().map(|mg| !(0.1..=2000.0).contains(&mg)).unwrap_or(true),
        })
        .map(|e| e.assertion.clone())
        .collect();
    if !implausible_dose_edges.is_empty() {
        quality_failures.push(ScorerFailure::new("Q3_MEDICATION_CHANGE_PLAUSIBILITY", Severity::Soft, "Medication-change claim lacks a plausible dosage.", implausible_dose_edges));
    }

    // Q4: gap anchoring — boundary events cited, routine-interval spam
    // collapsed rather than enumerated row-by-row.
    let uncollapsed_routine_gaps = input.gaps.iter().filter(|g| g.rationale == GapRationale::RoutineContinuityGap).count();
    if uncollapsed_routine_gaps > 3 {
        quality_failures.push(ScorerFailure::new(
            "Q4_GAP_ANCHORING",
            Severity::Soft,
            format!("{uncollapsed_routine_gaps} routine continuity gaps rendered uncollapsed."),
            vec![],
        ));
    }

    // Q5: Appendix B purity — the diagnosis appendix carries no raw
    // encounter headers.
    if let (Some(start), Some(end)) = (low_report.find("appendix b:"), low_report.find("appendix c")) {
        if end > start {
            let slice = &input.report_text[start..end];
            if ENCOUNTER_HEADER_RE.is_match(slice) {
                quality_failures.push(ScorerFailure::new("Q5_APPENDIX_B_PURITY", Severity::Soft, "Appendix B contains raw encounter headers.", vec![]));
            }
        }
    }

    // Q6: PRO consistency — any rendered pain score is on a 0-10 scale.
    let bad_pain_scores: Vec<String> = PAIN_SCORE_RE
        .captures_iter(input.report_text)
        .filter_map(|c| c[1].parse::<i32>().ok().map(|v| (v, c[0].to_string())))
        .filter(|(v, _)| !(0..=10).contains(v))
        .map(|(_, m)| m)
        .collect();
    if !bad_pain_scores.is_empty() {
        quality_failures.push(ScorerFailure::new("Q6_PRO_CONSISTENCY", Severity::Soft, "Pain score outside the 0-10 scale.", bad_pain_scores));
    }

    // Q7: SDOH quarantine — social-determinants language stays out of the
    // core timeline.
    let timeline_slice_start = low_report.find("chronological medical timeline");
    let timeline_slice_end = low_report.find("top 10 case-driving events");
    if let (Some(start), Some(end)) = (timeline_slice_start, timeline_slice_end) {
        if end > start && SDOH_RE.is_match(&input.report_text[start..end]) {
            quality_failures.push(ScorerFailure::new("Q7_SDOH_QUARANTINE", Severity::Soft, "SDOH language present in the core timeline.", vec![]));
        }
    }

    // Q8: attorney usability — readiness scorer passed and the timeline
    // covers at least two distinct event types.
    let distinct_types: HashSet<&str> = all_rows.iter().map(|r| r.event_type_display).collect();
    if !input.attorney.pass_ || distinct_types.len() < 2 {
        quality_failures.push(ScorerFailure::new("Q8_ATTORNEY_USABILITY", Severity::Soft, "Attorney-readiness scorer failed or timeline lacks event-type diversity.", vec![]));
    }

    // --- Semantic gates --------------------------------------------------

    let inpatient_rows = all_rows.iter().filter(|r| INPATIENT_MARKER_RE.is_match(&r.facts_text)).count();
    let inpatient_ratio = inpatient_rows as f64 / row_count as f64;
    // SEM1: an outpatient-dominant packet doesn't over-label rows inpatient.
    if inpatient_ratio > 0.0 && inpatient_ratio < 1.0 && inpatient_ratio > 0.05 && (all_rows.len() - inpatient_rows) > inpatient_rows {
        quality_failures.push(ScorerFailure::new("Q_SEM_1_ENCOUNTER_TYPE_SANITY", Severity::Soft, format!("inpatient_ratio={inpatient_ratio:.3} in an outpatient-dominant packet."), vec![]));
    }

    // SEM2: an ED/trauma encounter with mechanism language in source must
    // carry that mechanism into the rendered timeline.
    let source_has_mechanism = input.ctx.page_text_by_number.values().any(|t| MECHANISM_KEYWORD_RE.is_match(t));
    let rendered_has_mechanism = MECHANISM_KEYWORD_RE.is_match(input.report_text);
    if source_has_mechanism && !rendered_has_mechanism {
        quality_failures.push(ScorerFailure::new("Q_SEM_2_MECHANISM_REQUIRED", Severity::Soft, "Mechanism language present in source but absent from render.", vec![]));
    }

    // SEM3: procedure rows name at least two distinct anchor tokens
    // (level/laterality/technique) across the full set.
    let procedure_anchor_tokens: HashSet<String> = all_rows
        .iter()
        .filter(|r| r.event_type_display.eq_ignore_ascii_case("Procedure/Surgery"))
        .flat_map(|r| PROCEDURE_ANCHOR_RE.find_iter(&r.facts_text).map(|m| m.as_str().to_ascii_lowercase()))
        .collect();
    let has_procedure_rows = all_rows.iter().any(|r| r.event_type_display.eq_ignore_ascii_case("Procedure/Surgery"));
    if has_procedure_rows && procedure_anchor_tokens.len() < 2 {
        quality_failures.push(ScorerFailure::new("Q_SEM_3_PROCEDURE_SPECIFICITY", Severity::Soft, "Procedure rows lack at least two distinct anchor tokens.", vec![]));
    }

    // SEM4: diagnosis rows are at least 70% medical-term/ICD-code bearing.
    let dx_rows: Vec<&Row> = all_rows.iter().filter(|r| r.event_type_display.to_ascii_lowercase().contains("diagnos")).collect();
    if !dx_rows.is_empty() {
        let medical_like = dx_rows.iter().filter(|r| DX_MEDICAL_TERM_RE.is_match(&r.facts_text) || DX_CODE_RE.is_match(&r.facts_text)).count();
        let ratio = medical_like as f64 / dx_rows.len() as f64;
        if ratio < 0.70 {
            quality_failures.push(ScorerFailure::new("Q_SEM_4_DIAGNOSIS_PURITY", Severity::Soft, format!("Diagnosis medical-term ratio {ratio:.3} below 0.70."), vec![]));
        }
    }

    // SEM5: care-window end doesn't drift more than 7 days from the last
    // substantive rendered event date.
    if let Some(caps) = TREATMENT_TIMEFRAME_RE.captures(input.report_text) {
        if let (Ok(header_end), Some(last)) = (chrono::NaiveDate::parse_from_str(&caps[2], "%Y-%m-%d"), parsed_dates.last()) {
            if (header_end - *last).num_days().abs() > 7 {
                quality_failures.push(ScorerFailure::new("Q_SEM_5_CARE_WINDOW_END_DRIFT", Severity::Soft, "Header treatment-timeframe end drifts more than 7 days from the last rendered event.", vec![]));
            }
        }
    }

    // --- Usability gates -------------------------------------------------

    // Q_USE_1: every required bucket present in source also rendered —
    // already independently enforced by LUQA/Attorney-Readiness; surface
    // it here too since it gates the final score.
    if !input.luqa.pass_ {
        quality_failures.push(ScorerFailure::new("Q_USE_1_LUQA_REQUIRED_BUCKETS", Severity::Soft, "LUQA scorer did not pass.", vec![]));
    }

    // Q_USE_2: no rendering-noise/control-character tokens leaked through.
    if NOISE_TOKEN_RE.is_match(input.report_text) {
        quality_failures.push(ScorerFailure::new("Q_USE_2_NO_NOISE_TOKENS", Severity::Soft, "Control-character or replacement-character artifact in rendered output.", vec![]));
    }

    // Q_USE_3: no unresolved template/placeholder phrases.
    if let Some(m) = TEMPLATE_PHRASE_RE.find(input.report_text) {
        quality_failures.push(ScorerFailure::new("Q_USE_3_NO_TEMPLATE_PLACEHOLDERS", Severity::Soft, "Unresolved template placeholder in rendered output.", vec![m.as_str().to_string()]));
    }

    // Q_USE_4: substantive-row ratio at least 0.70 (inverse of the
    // vitals+admin+routine-lab noise already measured for Q1).
    let noise_rows = vitals_rows + admin_rows + routine_lab_rows;
    let substance_ratio = 1.0 - (noise_rows as f64 / row_count as f64);
    if substance_ratio < 0.70 {
        quality_failures.push(ScorerFailure::new("Q_USE_4_HIGH_SUBSTANCE_RATIO", Severity::Soft, format!("Substance ratio {substance_ratio:.3} below 0.70."), vec![]));
    }

    // Q_USE_5: legal-usability scorer passed.
    if !input.legal.pass_ {
        quality_failures.push(ScorerFailure::new("Q_USE_5_LEGAL_USABILITY_PASS", Severity::Soft, "Legal-usability scorer did not pass.", vec![]));
    }

    // Q_FINAL_RENDER_CONSISTENCY: every rendered artifact reports the same
    // row count the projection fed it (checked via the artifact list
    // itself; a missing companion file is a render-consistency break even
    // when H8 above already caught the coarser completeness issue).
    let companions_present = rendered.contains("chronology.csv") && rendered.contains("chronology.pdf");
    if !all_rows.is_empty() && !companions_present {
        quality_failures.push(ScorerFailure::new("Q_FINAL_RENDER_CONSISTENCY", Severity::Soft, "Timeline has rows but a core companion artifact is missing.", vec![]));
    }

    // --- Scoring rubric --------------------------------------------------

    let hard_pass = hard_failures.is_empty();
    let quality_pass = quality_failures.is_empty();

    let mut score = 100.0_f64;
    score -= (15.0 * hard_failures.len() as f64).min(60.0);
    score -= 100.0 * (vitals_ratio - 0.10).max(0.0);
    score -= 100.0 * (admin_ratio - 0.05).max(0.0);
    score -= (5.0 * quality_failures.len() as f64).min(20.0);
    if hard_pass && quality_pass {
        score += 5.0;
    }
    let score = score.clamp(0.0, 100.0).round() as i32;

    let pass_ = hard_pass && quality_pass && score >= 98;

    let mut metrics = serde_json::Map::new();
    metrics.insert("hard_pass".into(), hard_pass.into());
    metrics.insert("quality_pass".into(), quality_pass.into());
    metrics.insert("hard_failure_count".into(), hard_failures.len().into());
    metrics.insert("quality_failure_count".into(), quality_failures.len().into());
    metrics.insert("vitals_ratio".into(), vitals_ratio.into());
    metrics.insert("admin_ratio".into(), admin_ratio.into());
    metrics.insert("uncited_ratio".into(), uncited_ratio.into());

    let mut failures = hard_failures;
    failures.extend(quality_failures);

    ScorerResult { pass_, score_0_100: score, failures, metrics }
}
