//! Required-bucket synthesis (component L).
//!
//! A handful of event categories are load-bearing for an attorney reading
//! the chronology: an ER visit, imaging, a procedure, an orthopedic
//! consult. If the source packet plainly contains one of these but the
//! event pipeline produced no matching projection row (an extractor missed
//! it, the page was misclassified, whatever the cause), this stage
//! synthesizes a single anchored entry straight from page text rather than
//! silently shipping a chronology with a hole in it.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{ChronologyProjectionEntry, Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Ed,
    Mri,
    Procedure,
    Ortho,
    PtEval,
}

impl Bucket {
    fn event_type_display(&self) -> &'static str {
        match self {
            Bucket::Ed => "ED Visit",
            Bucket::Mri => "Imaging Study",
            Bucket::Procedure => "Procedure/Surgery",
            Bucket::Ortho => "Orthopedic Consult",
            Bucket::PtEval => "PT Evaluation",
        }
    }

    fn anchor_tokens(&self) -> &'static [&'static str] {
        match self {
            Bucket::Ed => &["emergency department", "er visit", "ed visit", "triage"],
            Bucket::Mri => &["mri", "impression", "finding"],
            Bucket::Procedure => &["depo-medrol", "lidocaine", "fluoroscopy", "interlaminar", "transforaminal", "epidural"],
            Bucket::Ortho => &["orthopedic", "orthopaedic", "ortho consult"],
            Bucket::PtEval => &["initial evaluation", "pt evaluation", "plan of care"],
        }
    }

    fn min_distinct_tokens(&self) -> usize {
        match self {
            Bucket::Procedure => 2,
            _ => 1,
        }
    }
}

static MRI_SIGNAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)mri.{0,160}(impression|finding)|( impression|finding).{0,160}mri").unwrap());
static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap());
static LEVEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b[CTL]\d-\d\b").unwrap());

static MRI_IMPRESSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)\bimpression\b[:\s-]+(.{20,220})").unwrap());
static ORTHO_ASSESSMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\b(?:assessment|impression)\b[:\s-]+(.{20,240}?)\b(?:plan|follow[- ]?up|continue)\b").unwrap());
static ED_NOTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)\b(?:chief complaint|triage note|assessment)\b[:\s-]+(.{20,220})").unwrap());
static PT_EVAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)\b(?:plan of care|evaluation summary|assessment)\b[:\s-]+(.{20,220})").unwrap());
static COMPLICATIONS_NONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bcomplications?:\s*none\b|\bno\s+complications\b").unwrap());

fn page_is_source_present(bucket: Bucket, page: &Page) -> bool {
    let lower = page.text.to_ascii_lowercase();
    match bucket {
        Bucket::Mri => MRI_SIGNAL_RE.is_match(&page.text),
        _ => {
            let distinct: HashSet<&str> = bucket.anchor_tokens().iter().filter(|t| lower.contains(**t)).copied().collect();
            distinct.len() >= bucket.min_distinct_tokens()
        }
    }
}

fn earliest_sane_date(pages: &[&Page], today: chrono::NaiveDate) -> Option<chrono::NaiveDate> {
    pages
        .iter()
        .flat_map(|p| DATE_RE.captures_iter(&p.text))
        .filter_map(|c| {
            let y: i32 = c[1].parse().ok()?;
            let m: u32 = c[2].parse().ok()?;
            let d: u32 = c[3].parse().ok()?;
            chrono::NaiveDate::from_ymd_opt(y, m, d)
        })
        .filter(|d| d.format("%Y").to_string().parse::<i32>().unwrap_or(0) >= 1970 && *d <= today)
        .min()
}

fn harvest_details(pages: &[&Page]) -> Vec<String> {
    let mut details = Vec::new();
    for page in pages {
        for m in LEVEL_RE.find_iter(&page.text) {
            let level = m.as_str().to_string();
            if !details.contains(&level) {
                details.push(level);
            }
        }
    }
    details
}

/// Builds the verbatim, labeled fact line(s) for a synthesized entry. Each
/// bucket pulls its own labeled excerpt (`Impression:`, `Assessment:` ...)
/// out of the anchor pages rather than taking a blind character prefix, so
/// the synthesized fact reads as a real clinical finding instead of a raw
/// text dump.
fn bucket_facts(bucket: Bucket, anchor_pages: &[&Page], levels: &[String]) -> Vec<String> {
    match bucket {
        Bucket::Mri => {
            let finding = anchor_pages
                .iter()
                .find_map(|p| MRI_IMPRESSION_RE.captures(&p.text))
                .and_then(|c| c.get(1).map(|m| m.as_str().lines().next().unwrap_or("").trim().to_string()))
                .filter(|s| !s.is_empty());
            match finding {
                Some(text) => vec![format!("MRI Impression: \"{text}\"")],
                None => vec!["MRI report reviewed; impression documented.".to_string()],
            }
        }
        Bucket::Procedure => {
            let mut name = "Epidural Steroid Injection".to_string();
            if !levels.is_empty() {
                name.push_str(&format!(" at {}", levels.join(", ")));
            }
            let mut facts = vec![name];

            let joined_lower = anchor_pages.iter().map(|p| p.text.to_ascii_lowercase()).collect::<Vec<_>>().join(" ");
            let mut meds = Vec::new();
            if joined_lower.contains("depo-medrol") || joined_lower.contains("depomedrol") {
                meds.push("Depo-Medrol");
            }
            if joined_lower.contains("lidocaine") {
                meds.push("Lidocaine");
            }
            if !meds.is_empty() {
                facts.push(format!("Medications: {}", meds.join(", ")));
            }
            if joined_lower.contains("fluoroscopy") {
                facts.push("Guidance: Fluoroscopy".to_string());
            }
            if COMPLICATIONS_NONE_RE.is_match(&joined_lower) {
                facts.push("Complications: None documented".to_string());
            }
            facts
        }
        Bucket::Ortho => {
            let snippet = anchor_pages
                .iter()
                .find_map(|p| ORTHO_ASSESSMENT_RE.captures(&p.text))
                .and_then(|c| c.get(1).map(|m| m.as_str().trim().to_string()))
                .filter(|s| !s.is_empty());
            match snippet {
                Some(text) => vec![format!("Assessment: \"{text}\". Plan: follow-up and treatment planning noted.")],
                None => vec!["Assessment: Orthopedic consultation documented. Plan: follow-up and treatment planning noted.".to_string()],
            }
        }
        Bucket::Ed => {
            let snippet = anchor_pages
                .iter()
                .find_map(|p| ED_NOTE_RE.captures(&p.text))
                .and_then(|c| c.get(1).map(|m| m.as_str().lines().next().unwrap_or("").trim().to_string()))
                .filter(|s| !s.is_empty());
            match snippet {
                Some(text) => vec![format!("Emergency Department: \"{text}\"")],
                None => vec!["Emergency department encounter documented.".to_string()],
            }
        }
        Bucket::PtEval => {
            let snippet = anchor_pages
                .iter()
                .find_map(|p| PT_EVAL_RE.captures(&p.text))
                .and_then(|c| c.get(1).map(|m| m.as_str().lines().next().unwrap_or("").trim().to_string()))
                .filter(|s| !s.is_empty());
            match snippet {
                Some(text) => vec![format!("PT Evaluation: \"{text}\"")],
                None => vec!["Physical therapy evaluation documented.".to_string()],
            }
        }
    }
}

fn existing_buckets(rows: &[ChronologyProjectionEntry]) -> HashSet<&'static str> {
    let displays: HashSet<String> = rows.iter().map(|r| r.event_type_display.clone()).collect();
    [Bucket::Ed, Bucket::Mri, Bucket::Procedure, Bucket::Ortho, Bucket::PtEval]
        .into_iter()
        .filter(|b| displays.contains(b.event_type_display()))
        .map(|b| b.event_type_display())
        .collect()
}

/// Synthesizes one anchored entry per source-present, unrepresented bucket.
/// `today` bounds date sanity; callers pass the run's processing date.
pub fn synthesize_missing_buckets(
    pages: &[Page],
    rows: &[ChronologyProjectionEntry],
    today: chrono::NaiveDate,
) -> Vec<ChronologyProjectionEntry> {
    let already_present = existing_buckets(rows);
    let mut synthesized = Vec::new();

    for bucket in [Bucket::Ed, Bucket::Mri, Bucket::Procedure, Bucket::Ortho, Bucket::PtEval] {
        if already_present.contains(bucket.event_type_display()) {
            continue;
        }
        let anchor_pages: Vec<&Page> = pages.iter().filter(|p| page_is_source_present(bucket, p)).collect();
        if anchor_pages.is_empty() {
            continue;
        }

        let date = earliest_sane_date(&anchor_pages, today);
        let details = harvest_details(&anchor_pages);
        let facts = bucket_facts(bucket, &anchor_pages, &details);

        let cited_pages: Vec<u32> = anchor_pages.iter().take(5).map(|p| p.page_number).collect();
        let citation_display = cited_pages
            .iter()
            .map(|p| format!("[{} p. {}]", anchor_pages[0].source_document_id, p))
            .collect::<Vec<_>>()
            .join(", ");

        synthesized.push(ChronologyProjectionEntry {
            event_id: format!(
                "synth-{}",
                bucket.event_type_display().to_ascii_lowercase().replace('/', "-").replace(' ', "-")
            ),
            date_display: date.map(|d| format!("{} (time not documented)", d.format("%Y-%m-%d"))).unwrap_or_else(|| "Undated".to_string()),
            provider_display: "Unknown Provider".to_string(),
            event_type_display: bucket.event_type_display().to_string(),
            patient_label: "Unknown Patient".to_string(),
            facts,
            citation_display,
            confidence: 40,
            extras: Default::default(),
        });
    }

    synthesized
}
