//! Text-quality & noise filter (component A).
//!
//! Exposes `is_noise`, `medical_density`, `has_structured_signals`, and
//! `clean`, reconciling the two overlapping Python quality modules
//! (`lib/noise_filter.py` and `quality/text_quality.py`) into one pass. The
//! merged thresholds and term lists follow `noise_filter.py`, since it is the
//! module the extraction steps import directly; `text_quality.py`'s richer
//! `explain_flags` diagnostic is kept as a supplement (see `explain_flags`
//! below), not as a second noise definition.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static MEDICAL_TERMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "diagnosis", "impression", "assessment", "plan", "procedure", "surgery", "injection",
        "fluoroscopy", "lidocaine", "depo-medrol", "pain", "fracture", "radiculopathy",
        "protrusion", "herniation", "stenosis", "infection", "wound", "discharge", "admission",
        "ed", "emergency", "mri", "ct", "x-ray", "therapy", "medication", "mg", "tablet",
        "capsule", "hospital", "clinic", "follow-up",
    ]
    .into_iter()
    .collect()
});

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "of", "to", "in", "on", "at", "is", "are", "was",
        "were", "be", "been", "being", "by", "for", "with", "as", "this", "that", "it", "its",
        "from", "have", "has", "had",
    ]
    .into_iter()
    .collect()
});

static ICD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([A-TV-Z][0-9][0-9A-Z](?:\.[0-9A-Z]{1,4})?)\b").unwrap());
static CPT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{5}\b").unwrap());
static DOSAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*(mg|ml|mcg|g)\b").unwrap());
static HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(impression|assessment|plan|diagnosis|clinical impression|chief complaint|procedure)\b")
        .unwrap()
});

static FAX_ARTIFACT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^(from|to|fax|page|date|time)\s*[:#]|^\s*\d{3}[-\s]?\d{3}[-\s]?\d{4}\s*$")
        .unwrap()
});
static REPEATED_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(pain assessment:?\s*){2,}").unwrap());
static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static CONTROL_CHAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f]").unwrap());
static MULTI_WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());
static MULTI_NEWLINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn tokenize(text: &str) -> Vec<String> {
    NON_WORD_RE
        .replace_all(text, " ")
        .split_whitespace()
        .map(|t| t.to_ascii_lowercase())
        .collect()
}

/// Fraction of tokens that are medical terms, or contain a digit (lab
/// values, dosages, dates embedded mid-token).
pub fn medical_density(text: &str) -> f64 {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return 0.0;
    }
    let hits = tokens
        .iter()
        .filter(|t| MEDICAL_TERMS.contains(t.as_str()) || t.chars().any(|c| c.is_ascii_digit()))
        .count();
    hits as f64 / tokens.len() as f64
}

fn stopword_ratio(text: &str) -> f64 {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return 0.0;
    }
    let hits = tokens.iter().filter(|t| STOPWORDS.contains(t.as_str())).count();
    hits as f64 / tokens.len() as f64
}

/// A span carries a structured clinical signal: an ICD-10 code, a 5-digit
/// CPT code, a dosage (`\d+ mg`), or a heading keyword.
pub fn has_structured_signals(text: &str) -> bool {
    ICD_RE.is_match(text) || CPT_RE.is_match(text) || DOSAGE_RE.is_match(text) || HEADING_RE.is_match(text)
}

/// A span is noise when medical-term density is low, it carries no
/// structured signal, and it is mostly stopwords.
pub fn is_noise(text: &str) -> bool {
    medical_density(text) < 0.08 && !has_structured_signals(text) && stopword_ratio(text) > 0.55
}

/// Diagnostic flags explaining *why* a span scored low, used in warnings
/// and the `DEBUG_ARTIFACTS` dump rather than in the noise gate itself.
pub fn explain_flags(text: &str) -> Vec<&'static str> {
    let mut flags = Vec::new();
    if text.trim().chars().count() < 20 {
        flags.push("too_short");
    }
    if FAX_ARTIFACT_RE.is_match(text) {
        flags.push("fax_artifact");
    }
    if REPEATED_LABEL_RE.is_match(text) {
        flags.push("repeated_labels");
    }
    if medical_density(text) < 0.05 {
        flags.push("low_medical_density");
    }
    flags
}

/// Strips fax artifacts, collapses repeated labels, dedups identical lines
/// in order, and normalizes whitespace.
pub fn clean(text: &str) -> String {
    let mut seen = HashSet::new();
    let mut out_lines = Vec::new();
    for raw_line in text.lines() {
        if FAX_ARTIFACT_RE.is_match(raw_line) {
            continue;
        }
        let collapsed = REPEATED_LABEL_RE.replace_all(raw_line, "Pain Assessment: ");
        let key = collapsed.trim().to_ascii_lowercase();
        if key.is_empty() {
            out_lines.push(String::new());
            continue;
        }
        if seen.insert(key) {
            out_lines.push(collapsed.trim().to_string());
        }
    }
    let joined = out_lines.join("\n");
    let no_control = CONTROL_CHAR_RE.replace_all(&joined, "");
    let normalized_crlf = no_control.replace("\r\n", "\n").replace('\r', "\n");
    let collapsed_ws = MULTI_WS_RE.replace_all(&normalized_crlf, " ");
    MULTI_NEWLINE_RE.replace_all(&collapsed_ws, "\n\n").trim().to_string()
}
