//! LUQA — litigation usability quality assurance.
//!
//! Operates on the projection rows that fed the render (rather than
//! re-parsing the rendered markdown back into rows) plus the rendered
//! report text for section-level checks. Row derivation mirrors the
//! projection-fallback path of the original scorer: every row must carry
//! a citation, enough non-stopword tokens, and at least two fact
//! categories, or it doesn't count toward row-based ratios at all.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::ChronologyProjectionEntry;
use crate::text_quality::is_noise;

use super::{ScorerContext, ScorerFailure, ScorerResult, Severity};

static META_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)identified from source|markers|extracted|encounter recorded|documentation suggests|consistent with.*encounter|outcome details limited|management actions are summarized",
    )
    .unwrap()
});
static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(limited detail|encounter recorded|clinical documentation(?:\s+only)?|documentation noted|continuity of care|not stated in records)\b").unwrap()
});
static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(20\d{2}-\d{2}-\d{2})\b").unwrap());
static CONTROL_CHAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap());

static PAIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bpain\s*(?:score|severity|level)?\s*[:=]?\s*\d{1,2}\s*/\s*10\b").unwrap());
static ROM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:rom|range of motion)\b|\b\d+\s*(?:deg|degree|degrees)\b").unwrap());
static STRENGTH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bstrength\s*[:=]?\s*[0-5](?:\.\d+)?\s*/\s*5\b|\b[0-5]\s*/\s*5\b").unwrap());
static VITALS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:bp|blood pressure)\s*[:=]?\s*\d{2,3}\s*/\s*\d{2,3}\b|\bhr\s*\d+\b|\brr\s*\d+\b|\bspo2\s*\d+\b").unwrap());
static DX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(radiculopathy|herniation|disc|strain|sprain|stenosis|protrusion|fracture|tear|neuropathy)\b").unwrap());
static ENCOUNTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(chief complaint|hpi|emergency|impression|assessment|plan|procedure|injection|fluoroscopy)\b").unwrap());
static MED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(hydrocodone|oxycodone|lidocaine|depo-?medrol|ibuprofen|acetaminophen|toradol|ketorolac|gabapentin|cyclobenzaprine|prednisone|naproxen)\b").unwrap());
static DOSAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*mg\b").unwrap());
static STOPWORDS: Lazy<std::collections::HashSet<&'static str>> = Lazy::new(|| {
    ["the", "and", "or", "a", "an", "to", "of", "in", "for", "with", "on", "at", "is", "was", "by", "from", "as", "that", "this", "it", "be", "are"]
        .into_iter()
        .collect()
});
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zA-Z0-9/-]+").unwrap());
static TIMEFRAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Treatment Timeframe:\s*(\d{4}-\d{2}-\d{2})\s*to\s*(\d{4}-\d{2}-\d{2})").unwrap());

static BUCKET_ED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(triage|hpi|emergency|ed visit|chief complaint)\b").unwrap());
static BUCKET_MRI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bmri\b.*\b(impression|findings|c\d-\d|l\d-\d)\b|\bimpression\b.*\bmri\b").unwrap());
static BUCKET_PT_EVAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(pt eval|physical therapy evaluation|soap)\b").unwrap());
static BUCKET_ORTHO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(ortho|orthopedic|orthopaedic)\b.*\b(assessment|plan|impression)\b").unwrap());
static BUCKET_PROCEDURE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(depo-?medrol|lidocaine|fluoroscopy|interlaminar|transforaminal|epidural)\b").unwrap());

struct Row<'a> {
    date_text: String,
    event_type: String,
    facts: Vec<&'a str>,
    citation: &'a str,
}

fn non_stopword_token_count(text: &str) -> usize {
    TOKEN_RE.find_iter(text).filter(|m| !STOPWORDS.contains(m.as_str().to_ascii_lowercase().as_str())).count()
}

fn fact_category_count(text: &str) -> usize {
    let mut n = 0;
    if PAIN_RE.is_match(text) {
        n += 1;
    }
    if ROM_RE.is_match(text) {
        n += 1;
    }
    if STRENGTH_RE.is_match(text) {
        n += 1;
    }
    if VITALS_RE.is_match(text) {
        n += 1;
    }
    if MED_RE.is_match(text) && DOSAGE_RE.is_match(text) {
        n += 1;
    }
    if DX_RE.is_match(text) {
        n += 1;
    }
    if ENCOUNTER_RE.is_match(text) {
        n += 1;
    }
    n
}

fn rows_from_projection<'a>(entries: &'a [ChronologyProjectionEntry]) -> Vec<Row<'a>> {
    entries
        .iter()
        .filter_map(|e| {
            let facts: Vec<&str> = e.facts.iter().map(|f| f.as_str()).filter(|f| !f.trim().is_empty()).collect();
            if facts.is_empty() || e.citation_display.trim().is_empty() {
                return None;
            }
            let facts_text = facts.join(" ");
            if is_noise(&facts_text) {
                return None;
            }
            if non_stopword_token_count(&facts_text) < 12 {
                return None;
            }
            if fact_category_count(&facts_text) < 2 {
                return None;
            }
            if PLACEHOLDER_RE.is_match(&facts_text) {
                return None;
            }
            let date_text = DATE_RE.find(&e.date_display).map(|m| m.as_str().to_string()).unwrap_or_else(|| "Undated".to_string());
            Some(Row { date_text, event_type: e.event_type_display.clone(), facts, citation: &e.citation_display })
        })
        .collect()
}

fn source_bucket_presence(pages: &HashMap<u32, String>) -> std::collections::HashSet<&'static str> {
    let mut present = std::collections::HashSet::new();
    for text in pages.values() {
        if BUCKET_ED_RE.is_match(text) {
            present.insert("ED");
        }
        if BUCKET_MRI_RE.is_match(text) {
            present.insert("MRI");
        }
        if BUCKET_PT_EVAL_RE.is_match(text) {
            present.insert("PT_EVAL");
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

static RENDERED_ED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(emergency|ed)\b").unwrap());
static RENDERED_MRI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(mri|impression|imaging)\b").unwrap());
static RENDERED_PT_EVAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(therapy visit|pt eval|physical therapy)\b").unwrap());
static RENDERED_ORTHO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(ortho|orthopedic|orthopaedic)\b").unwrap());
static RENDERED_PROCEDURE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(procedure|injection|fluoroscopy|depo-medrol|lidocaine)\b").unwrap());

fn rendered_bucket_presence(rows: &[Row]) -> std::collections::HashSet<&'static str> {
    let mut present = std::collections::HashSet::new();
    for row in rows {
        let blob = format!("{} {}", row.event_type, row.facts.join(" "));
        if RENDERED_ED_RE.is_match(&blob) {
            present.insert("ED");
        }
        if RENDERED_MRI_RE.is_match(&blob) {
            present.insert("MRI");
        }
        if RENDERED_PT_EVAL_RE.is_match(&blob) {
            present.insert("PT_EVAL");
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

fn parse_header_timeframe(report_text: &str) -> (Option<chrono::NaiveDate>, Option<chrono::NaiveDate>) {
    match TIMEFRAME_RE.captures(report_text) {
        Some(c) => (
            chrono::NaiveDate::parse_from_str(&c[1], "%Y-%m-%d").ok(),
            chrono::NaiveDate::parse_from_str(&c[2], "%Y-%m-%d").ok(),
        ),
        None => (None, None),
    }
}

fn robust_window(mut dates: Vec<chrono::NaiveDate>) -> (Option<chrono::NaiveDate>, Option<chrono::NaiveDate>) {
    if dates.is_empty() {
        return (None, None);
    }
    dates.sort();
    if dates.len() >= 3 {
        if (dates[dates.len() - 1] - dates[dates.len() - 2]).num_days() > 21 {
            dates.pop();
        }
        if dates.len() >= 3 && (dates[1] - dates[0]).num_days() > 21 {
            dates.remove(0);
        }
    }
    (dates.first().copied(), dates.last().copied())
}

/// Scores the rendered report's timeline slice against LUQA's render
/// invariants. `report_text` is the full rendered narrative.
pub fn score(report_text: &str, ctx: &ScorerContext) -> ScorerResult {
    let mut failures = Vec::new();
    let mut penalties = 0.0_f64;
    let mut hard_fail = false;

    let low = report_text.to_ascii_lowercase();
    let timeline_start = low.find("chronological medical timeline");
    let timeline_text = match timeline_start {
        Some(start) => {
            let end = [low.find("top 10 case-driving events"), low.find("appendix a:")]
                .into_iter()
                .flatten()
                .filter(|e| *e > start)
                .min()
                .unwrap_or(report_text.len());
            &report_text[start..end]
        }
        None => report_text,
    };

    let rows = rows_from_projection(ctx.projection_entries);
    let row_count = rows.len();

    let meta_hits = META_RE.find_iter(timeline_text).count();
    if meta_hits > 0 {
        hard_fail = true;
        penalties += 20.0;
        failures.push(ScorerFailure::new(
            "LUQA_META_LANGUAGE_BAN",
            Severity::Hard,
            format!("Meta-language found in timeline: {meta_hits} hit(s)."),
            vec![],
        ));
    }

    if CONTROL_CHAR_RE.is_match(timeline_text) {
        hard_fail = true;
        failures.push(ScorerFailure::new(
            "LUQA_RENDER_QUALITY_SANITY",
            Severity::Hard,
            "Rendered chronology contains a control-character artifact.",
            vec!["control_character_artifact".to_string()],
        ));
    }

    let mut placeholders = 0;
    let mut fact_dense = 0;
    let mut verbatim_rows = 0;
    let mut duplicate_counter: HashMap<(String, String, String), usize> = HashMap::new();
    let mut rows_with_noise_citations = 0;
    let noise_pages: std::collections::HashSet<u32> =
        ctx.page_text_by_number.iter().filter(|(_, text)| is_noise(text)).map(|(p, _)| *p).collect();
    let page_p_re = Regex::new(r"p\.\s*(\d+)").unwrap();

    for row in &rows {
        let facts_text = row.facts.join(" ");
        let tokens = non_stopword_token_count(&facts_text);
        let categories = fact_category_count(&facts_text);
        let is_placeholder = PLACEHOLDER_RE.is_match(&facts_text);
        let is_low_signal = tokens < 8 && categories == 0;
        if is_placeholder || is_low_signal {
            placeholders += 1;
        }
        if categories >= 2 {
            fact_dense += 1;
        }
        if row.facts.iter().any(|f| f.contains('"')) || row.facts.iter().any(|f| non_stopword_token_count(f) >= 8 && !META_RE.is_match(f)) {
            verbatim_rows += 1;
        }

        let snippet_norm: String = facts_text.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase();
        if !snippet_norm.is_empty() {
            let hash = crate::extractors::common::text_hash(&snippet_norm);
            let key = (row.date_text.clone(), row.event_type.to_ascii_lowercase(), hash[..16.min(hash.len())].to_string());
            *duplicate_counter.entry(key).or_insert(0) += 1;
        }

        let citation_pages: Vec<u32> = page_p_re.captures_iter(row.citation).filter_map(|c| c[1].parse().ok()).collect();
        if !citation_pages.is_empty() && citation_pages.iter().any(|p| noise_pages.contains(p)) {
            rows_with_noise_citations += 1;
        }
    }

    let placeholder_ratio = if row_count > 0 { placeholders as f64 / row_count as f64 } else { 0.0 };
    let fact_density_ratio = if row_count > 0 { fact_dense as f64 / row_count as f64 } else { 0.0 };
    let verbatim_ratio = if row_count > 0 { verbatim_rows as f64 / row_count as f64 } else { 0.0 };

    if placeholder_ratio > 0.20 {
        hard_fail = true;
        failures.push(ScorerFailure::new("LUQA_PLACEHOLDER_RATIO", Severity::Hard, format!("Placeholder ratio too high: {placeholder_ratio:.3}"), vec![]));
    }
    penalties += (placeholder_ratio * 30.0).min(30.0);

    if fact_density_ratio < 0.30 {
        hard_fail = true;
        failures.push(ScorerFailure::new("LUQA_FACT_DENSITY", Severity::Hard, format!("Fact-dense ratio too low: {fact_density_ratio:.3}"), vec![]));
    } else if fact_density_ratio < 0.60 {
        penalties += (((0.60 - fact_density_ratio) / 0.60) * 30.0).min(30.0);
    }

    if verbatim_ratio < 0.70 {
        hard_fail = true;
        failures.push(ScorerFailure::new("LUQA_VERBATIM_ANCHOR_RATIO", Severity::Hard, format!("Verbatim ratio below hard threshold: {verbatim_ratio:.3}"), vec![]));
    } else if verbatim_ratio < 0.85 {
        penalties += (((0.85 - verbatim_ratio) / 0.85) * 30.0).min(30.0);
    }

    let mut duplicate_rows = 0;
    for count in duplicate_counter.values() {
        if *count >= 2 {
            duplicate_rows += count - 1;
        }
    }
    let duplicate_rows_ratio = if row_count > 0 { duplicate_rows as f64 / row_count as f64 } else { 0.0 };
    if duplicate_rows_ratio > 0.10 {
        hard_fail = true;
        failures.push(ScorerFailure::new("LUQA_DUPLICATE_SNIPPETS", Severity::Hard, format!("Duplicate snippet ratio too high: {duplicate_rows_ratio:.3}"), vec![]));
    }
    penalties += (duplicate_rows_ratio * 20.0).min(20.0);

    let (header_start, header_end) = parse_header_timeframe(report_text);
    let substantive_dates: Vec<chrono::NaiveDate> =
        ctx.projection_entries.iter().filter_map(|e| DATE_RE.find(&e.date_display)).filter_map(|m| chrono::NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok()).collect();
    let (event_start, event_end) = robust_window(substantive_dates);
    let mut care_window_mismatch = false;
    if let (Some(h), Some(e)) = (header_start, event_start) {
        if (h - e).num_days() > 1 {
            care_window_mismatch = true;
        }
    }
    if let (Some(h), Some(e)) = (header_end, event_end) {
        if (e - h).num_days() > 1 {
            care_window_mismatch = true;
        }
    }
    if care_window_mismatch {
        hard_fail = true;
        failures.push(ScorerFailure::new("LUQA_CARE_WINDOW_INTEGRITY", Severity::Hard, "Header treatment timeframe does not match substantive cited event window.", vec![]));
    }

    let source_buckets = source_bucket_presence(ctx.page_text_by_number);
    let timeline_buckets = rendered_bucket_presence(&rows);
    let mut missing_buckets: Vec<&str> = source_buckets.difference(&timeline_buckets).copied().collect();
    missing_buckets.sort();
    if !missing_buckets.is_empty() {
        hard_fail = true;
        failures.push(ScorerFailure::new(
            "LUQA_REQUIRED_BUCKETS_WHEN_PRESENT",
            Severity::Hard,
            format!("Required buckets missing from timeline: {}", missing_buckets.join(", ")),
            vec![],
        ));
    }

    let noise_rows_ratio = if row_count > 0 { rows_with_noise_citations as f64 / row_count as f64 } else { 0.0 };
    if !noise_pages.is_empty() && noise_rows_ratio > 0.05 {
        hard_fail = true;
        failures.push(ScorerFailure::new("LUQA_NOISE_SUPPRESSION_RATE", Severity::Hard, format!("Too many timeline rows cite noise pages: {noise_rows_ratio:.3}"), vec![]));
    }

    let mut score = (100.0 - penalties).clamp(0.0, 100.0).round() as i32;
    if hard_fail {
        score = score.min(60);
    }
    let pass_ = !hard_fail && score >= 90;

    let mut metrics = serde_json::Map::new();
    metrics.insert("meta_hits".into(), meta_hits.into());
    metrics.insert("placeholder_ratio".into(), placeholder_ratio.into());
    metrics.insert("fact_density_ratio".into(), fact_density_ratio.into());
    metrics.insert("verbatim_ratio".into(), verbatim_ratio.into());
    metrics.insert("duplicate_rows_ratio".into(), duplicate_rows_ratio.into());
    metrics.insert("care_window_mismatch".into(), care_window_mismatch.into());
    metrics.insert("timeline_row_count".into(), row_count.into());
    metrics.insert("noise_rows_ratio".into(), noise_rows_ratio.into());

    ScorerResult { pass_, score_0_100: score, failures, metrics }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(date: &str, event_type: &str, facts: Vec<&str>, citation: &str) -> ChronologyProjectionEntry {
        ChronologyProjectionEntry {
            event_id: "e1".into(),
            date_display: format!("{date} (time not documented)"),
            provider_display: "Dr. Smith".into(),
            event_type_display: event_type.into(),
            patient_label: "Patient A".into(),
            facts: facts.into_iter().map(|s| s.to_string()).collect(),
            citation_display: citation.into(),
            confidence: 80,
            extras: Default::default(),
        }
    }

    #[test]
    fn test_meta_language_hard_fails() {
        let report = "## Chronological Medical Timeline\nIdentified from source markers.\n## Top 10 Case-Driving Events\n";
        let pages = HashMap::new();
        let ctx = ScorerContext { projection_entries: &[], page_text_by_number: &pages };
        let result = score(report, &ctx);
        assert!(!result.pass_);
        assert!(result.failures.iter().any(|f| f.code == "LUQA_META_LANGUAGE_BAN"));
    }

    #[test]
    fn test_clean_report_with_no_rows_has_no_meta_failure() {
        let report = "## Chronological Medical Timeline\n## Top 10 Case-Driving Events\n";
        let pages = HashMap::new();
        let ctx = ScorerContext { projection_entries: &[], page_text_by_number: &pages };
        let result = score(report, &ctx);
        assert!(result.failures.iter().all(|f| f.code != "LUQA_META_LANGUAGE_BAN"));
    }

    #[test]
    fn test_missing_source_present_bucket_hard_fails() {
        let report = "## Chronological Medical Timeline\n## Top 10 Case-Driving Events\n";
        let mut pages = HashMap::new();
        pages.insert(3u32, "MRI Lumbar Spine. Impression: disc herniation L4-5".to_string());
        let ctx = ScorerContext { projection_entries: &[], page_text_by_number: &pages };
        let result = score(report, &ctx);
        assert!(result.failures.iter().any(|f| f.code == "LUQA_REQUIRED_BUCKETS_WHEN_PRESENT"));
    }

    #[test]
    fn test_duplicate_snippet_rows_hard_fail() {
        let report = "## Chronological Medical Timeline\n## Top 10 Case-Driving Events\n";
        let facts = vec!["Patient reports pain level 7/10 with decreased range of motion measured at 45 degrees during examination today"];
        let entries = vec![
            entry("2024-01-05", "PT Visit", facts.clone(), "Citation(s): Smith PT Note p. 10"),
            entry("2024-01-05", "PT Visit", facts.clone(), "Citation(s): Smith PT Note p. 11"),
            entry("2024-01-05", "PT Visit", facts, "Citation(s): Smith PT Note p. 12"),
        ];
        let pages = HashMap::new();
        let ctx = ScorerContext { projection_entries: &entries, page_text_by_number: &pages };
        let result = score(report, &ctx);
        assert!(!result.pass_);
        assert!(result.failures.iter().any(|f| f.code == "LUQA_DUPLICATE_SNIPPETS"));
    }

    #[test]
    fn test_care_window_drift_hard_fails() {
        let report = "## Chronological Medical Timeline\nTreatment Timeframe: 2025-01-01 to 2025-01-15\n## Top 10 Case-Driving Events\n";
        let entries = vec![entry("2025-01-20", "Office Visit", vec!["Chief complaint: follow-up visit note."], "Citation(s): p. 5")];
        let pages = HashMap::new();
        let ctx = ScorerContext { projection_entries: &entries, page_text_by_number: &pages };
        let result = score(report, &ctx);
        assert!(!result.pass_);
        assert!(result.failures.iter().any(|f| f.code == "LUQA_CARE_WINDOW_INTEGRITY"));
    }
}
