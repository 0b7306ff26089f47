//! Provider detector (component D).
//!
//! Ported from `step05_provider.py`: two passes over the page set —
//! candidate extraction (label regexes, physician-name patterns, letterhead
//! heuristics), then fuzzy clustering by normalized name — followed by a
//! per-page provider map built with a two-tier exact-then-fuzzy lookup. The
//! two-tier lookup is kept exactly as the original does it (not collapsed to
//! a single pass): a page's best candidate can lose its own cluster's
//! canonical key, and the fuzzy fallback is what recovers it.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::model::{Page, Provider, ProviderEvidence, ProviderType};
use crate::warning::{Warning, WarningCode};

static LABEL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?im)^\s*facility:\s*(.+)$").unwrap(),
        Regex::new(r"(?im)^\s*provider:\s*(.+)$").unwrap(),
        Regex::new(r"(?im)^\s*seen by:\s*(.+)$").unwrap(),
        Regex::new(r"(?im)^\s*signed by:\s*(.+)$").unwrap(),
    ]
});

static PHYSICIAN_NAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\bDr\.\s+([A-Z][a-zA-Z'\-]+(?:\s+[A-Z][a-zA-Z'\-]+)?)\b").unwrap(),
        Regex::new(r"\b([A-Z][a-zA-Z'\-]+,\s*[A-Z][a-zA-Z'\-]+)\s*,?\s*(?:MD|DO|DC|DPM)\b").unwrap(),
        Regex::new(r"\b([A-Z][a-zA-Z'\-]+\s+[A-Z][a-zA-Z'\-]+)\s*,?\s*(?:MD|DO|DC|DPM)\b").unwrap(),
    ]
});

static LETTERHEAD_KEYWORDS: &[&str] = &[
    "medical", "hospital", "clinic", "health", "center", "radiology", "therapy", "orthopedic",
    "chiropractic", "imaging",
];

static NEGATIVE_LIST: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "patient", "chief complaint", "assessment", "plan", "date of service", "date of birth",
        "medical records", "page", "history of present illness", "review of systems",
        "vital signs", "physical exam", "medications", "allergies", "impression", "findings",
        "technique", "clinical indication", "comparison",
    ]
    .into_iter()
    .collect()
});

static SUFFIX_STRIP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(llc|inc|corp|medical group|pa|pc|pllc|md|do|dpm|dc|pt|dds)\b").unwrap()
});
static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s]").unwrap());
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

struct ProviderTypeKeywords {
    provider_type: ProviderType,
    keywords: &'static [&'static str],
}

static PROVIDER_TYPE_KEYWORDS: Lazy<Vec<ProviderTypeKeywords>> = Lazy::new(|| {
    vec![
        ProviderTypeKeywords { provider_type: ProviderType::Er, keywords: &["emergency", "er visit", "trauma"] },
        ProviderTypeKeywords { provider_type: ProviderType::Pt, keywords: &["physical therapy", "rehabilitation"] },
        ProviderTypeKeywords { provider_type: ProviderType::Imaging, keywords: &["radiology", "imaging", "mri", "ct scan"] },
        ProviderTypeKeywords { provider_type: ProviderType::Hospital, keywords: &["hospital", "medical center", "inpatient"] },
        ProviderTypeKeywords { provider_type: ProviderType::Pcp, keywords: &["family medicine", "primary care", "internal medicine"] },
        ProviderTypeKeywords { provider_type: ProviderType::Specialist, keywords: &["orthopedic", "neurology", "orthopaedic", "spine"] },
    ]
});

/// Lowercase, punctuation-strip, suffix-strip, then a small set of
/// common-abbreviation substitutions. Idempotent: `normalize(normalize(x))
/// == normalize(x)`.
pub fn normalize_name(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    let no_suffix = SUFFIX_STRIP_RE.replace_all(&lower, "");
    let no_punct = NON_WORD_RE.replace_all(&no_suffix, " ");
    let collapsed = WS_RE.replace_all(no_punct.trim(), " ").to_string();
    collapsed.replace("saint", "st").replace("center", "ctr")
}

fn is_valid_candidate(candidate: &str) -> bool {
    let len = candidate.len();
    if !(3..=120).contains(&len) {
        return false;
    }
    if candidate.trim_end().ends_with('.') {
        return false;
    }
    let lower = candidate.to_ascii_lowercase();
    if NEGATIVE_LIST.contains(lower.as_str()) {
        return false;
    }
    let words: Vec<&str> = candidate.split_whitespace().collect();
    if words.len() > 12 {
        return false;
    }
    if words.len() > 3 {
        let lower_chars = candidate.chars().filter(|c| c.is_lowercase()).count();
        let alpha_chars = candidate.chars().filter(|c| c.is_alphabetic()).count().max(1);
        if (lower_chars as f64 / alpha_chars as f64) > 0.85 {
            return false;
        }
    }
    true
}

struct Candidate {
    raw_name: String,
    confidence: i32,
    page_number: u32,
}

fn extract_candidates_from_page(page: &Page) -> Vec<Candidate> {
    let mut out = Vec::new();

    for re in LABEL_PATTERNS.iter() {
        for cap in re.captures_iter(&page.text) {
            if let Some(m) = cap.get(1) {
                let name = m.as_str().trim();
                if is_valid_candidate(name) {
                    out.push(Candidate { raw_name: name.to_string(), confidence: 80, page_number: page.page_number });
                }
            }
        }
    }

    for re in PHYSICIAN_NAME_PATTERNS.iter() {
        for cap in re.captures_iter(&page.text) {
            if let Some(m) = cap.get(1) {
                let name = m.as_str().trim();
                if name.len() > 4 && is_valid_candidate(name) {
                    out.push(Candidate { raw_name: name.to_string(), confidence: 65, page_number: page.page_number });
                }
            }
        }
    }

    let lines: Vec<&str> = page.text.lines().collect();
    let top_count = (lines.len() as f64 * 0.2).ceil() as usize;
    for line in lines.iter().take(top_count.max(1)) {
        let trimmed = line.trim();
        if trimmed.len() < 10 || trimmed.len() > 120 {
            continue;
        }
        if trimmed.ends_with('.') {
            continue;
        }
        if !trimmed.chars().any(|c| c.is_uppercase()) {
            continue;
        }
        let lower = trimmed.to_ascii_lowercase();
        if LETTERHEAD_KEYWORDS.iter().any(|kw| lower.contains(kw)) && is_valid_candidate(trimmed) {
            out.push(Candidate { raw_name: trimmed.to_string(), confidence: 70, page_number: page.page_number });
        }
    }

    out
}

fn jaccard(a: &str, b: &str) -> f64 {
    let sa: HashSet<&str> = a.split_whitespace().collect();
    let sb: HashSet<&str> = b.split_whitespace().collect();
    if sa.is_empty() || sb.is_empty() {
        return 0.0;
    }
    let inter = sa.intersection(&sb).count() as f64;
    let union = sa.union(&sb).count() as f64;
    inter / union
}

fn detect_provider_type(page_text: &str) -> ProviderType {
    let lower = page_text.to_ascii_lowercase();
    for entry in PROVIDER_TYPE_KEYWORDS.iter() {
        if entry.keywords.iter().any(|kw| lower.contains(kw)) {
            return entry.provider_type;
        }
    }
    ProviderType::Unknown
}

/// Detects providers across all pages of a run and builds the
/// `page_number -> provider_id` map used by the event extractors.
pub fn detect_providers(pages: &[Page]) -> (Vec<Provider>, HashMap<u32, String>, Vec<Warning>) {
    let mut all_candidates: Vec<Candidate> = Vec::new();
    for page in pages {
        all_candidates.extend(extract_candidates_from_page(page));
    }

    if all_candidates.is_empty() {
        let provider = Provider::unknown("unknown");
        return (
            vec![provider],
            HashMap::new(),
            vec![Warning::new(WarningCode::NoProvidersDetected, "No providers detected in any page")],
        );
    }

    // Cluster by normalized-name with fuzzy match >= 0.6, first-match-wins
    // against already-seen cluster keys (insertion order).
    let mut seen_normalized: Vec<String> = Vec::new();
    let mut clusters: HashMap<String, Provider> = HashMap::new();
    let mut norm_to_provider: HashMap<String, String> = HashMap::new();

    for cand in &all_candidates {
        let norm = normalize_name(&cand.raw_name);
        let mut matched_key: Option<String> = None;
        if seen_normalized.contains(&norm) {
            matched_key = Some(norm.clone());
        } else {
            for existing in &seen_normalized {
                if jaccard(existing, &norm) >= 0.6 {
                    matched_key = Some(existing.clone());
                    break;
                }
            }
        }

        let key = matched_key.unwrap_or_else(|| {
            seen_normalized.push(norm.clone());
            norm.clone()
        });

        let page_text = pages
            .iter()
            .find(|p| p.page_number == cand.page_number)
            .map(|p| p.text.as_str())
            .unwrap_or("");

        let entry = clusters.entry(key.clone()).or_insert_with(|| Provider {
            provider_id: Uuid::new_v4().to_string(),
            detected_name_raw: cand.raw_name.clone(),
            normalized_name: key.clone(),
            provider_type: detect_provider_type(page_text),
            confidence: 0,
            evidence: Vec::new(),
        });

        if cand.confidence > entry.confidence {
            entry.confidence = cand.confidence;
            entry.detected_name_raw = cand.raw_name.clone();
        }
        entry.evidence.push(ProviderEvidence {
            page: cand.page_number,
            snippet: cand.raw_name.chars().take(260).collect(),
            bbox: Default::default(),
        });
        norm_to_provider.insert(key.clone(), entry.provider_id.clone());
    }

    let providers: Vec<Provider> = clusters.into_values().collect();

    // Two-tier page -> provider map: exact lookup first, fuzzy fallback
    // second — kept distinct because a page's own best candidate key can
    // differ from the cluster's canonical key.
    let mut page_provider_map = HashMap::new();
    for page in pages {
        let best = all_candidates
            .iter()
            .filter(|c| c.page_number == page.page_number)
            .max_by_key(|c| c.confidence);
        if let Some(best) = best {
            let norm = normalize_name(&best.raw_name);
            if let Some(provider_id) = norm_to_provider.get(&norm) {
                page_provider_map.insert(page.page_number, provider_id.clone());
                continue;
            }
            for (cluster_key, provider_id) in norm_to_provider.iter() {
                if jaccard(cluster_key, &norm) >= 0.6 {
                    page_provider_map.insert(page.page_number, provider_id.clone());
                    break;
                }
            }
        }
    }

    (providers, page_provider_map, Vec::new())
}
