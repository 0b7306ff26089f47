//! Claim-guard redaction (component M).
//!
//! Scans the narrative synthesis line-by-line for `field: value` claims in
//! the high-risk fields (`primary injuries`, `major complications`).
//! A claim value survives only if at least two source pages mention it;
//! anything short of that is scrubbed from the rendered narrative so an
//! attorney never sees an assertion the packet doesn't actually back up.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

const GUARDED_FIELDS: [&str; 2] = ["primary injuries", "major complications"];
const MIN_ANCHOR_PAGES: usize = 2;
const INSUFFICIENT_ANCHOR_MSG: &str = "Insufficiently anchored in record text; additional records or citations required.";
const HIGH_RISK_UNANCHORED: &str = "HIGH_RISK_UNANCHORED";

/// A high-risk claim that failed the anchor-page threshold, with the reason
/// code `claim_guard_report.json` records against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedClaim {
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimAudit {
    pub accepted_claims: Vec<String>,
    pub rejected_claims: Vec<RejectedClaim>,
}

fn split_claim_values(value: &str) -> Vec<String> {
    value
        .split([',', ';'])
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn count_anchor_pages(claim: &str, page_texts: &[String]) -> usize {
    let pattern = format!(r"(?i)\b{}\b", regex::escape(claim));
    let Ok(re) = Regex::new(&pattern) else { return 0 };
    page_texts.iter().filter(|text| re.is_match(&text.to_ascii_lowercase())).count()
}

fn parse_field_line(line: &str) -> Option<(String, String)> {
    let (field, value) = line.split_once(':')?;
    let field = field.trim().to_ascii_lowercase();
    if GUARDED_FIELDS.contains(&field.as_str()) {
        Some((field, value.trim().to_string()))
    } else {
        None
    }
}

/// Redacts unanchored high-risk claims out of `narrative` and returns the
/// scrubbed text plus an audit of what was accepted/rejected.
pub fn apply_claim_guard(narrative: &str, page_texts: &[String]) -> (String, ClaimAudit) {
    let lower_pages: Vec<String> = page_texts.iter().map(|p| p.to_ascii_lowercase()).collect();

    let mut claim_verdicts: HashMap<String, bool> = HashMap::new();
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for line in narrative.lines() {
        let Some((_, value)) = parse_field_line(line) else { continue };
        for claim in split_claim_values(&value) {
            let key = claim.to_ascii_lowercase();
            if claim_verdicts.contains_key(&key) {
                continue;
            }
            let anchors = count_anchor_pages(&claim, &lower_pages);
            let accept = anchors >= MIN_ANCHOR_PAGES;
            claim_verdicts.insert(key, accept);
            if accept {
                accepted.push(claim);
            } else {
                rejected.push(RejectedClaim { value: claim, reason: HIGH_RISK_UNANCHORED.to_string() });
            }
        }
    }

    let rejected_set: std::collections::HashSet<String> =
        rejected.iter().map(|c| c.value.to_ascii_lowercase()).collect();

    let mut scrubbed_lines = Vec::new();
    for line in narrative.lines() {
        let trimmed = line.trim_start();
        let is_bullet = trimmed.starts_with('-') || trimmed.starts_with('*') || trimmed.starts_with('\u{2022}');

        if let Some((field, value)) = parse_field_line(line) {
            let values = split_claim_values(&value);
            let any_rejected = values.iter().any(|v| rejected_set.contains(&v.to_ascii_lowercase()));
            if any_rejected {
                let surviving: Vec<&String> = values.iter().filter(|v| !rejected_set.contains(&v.to_ascii_lowercase())).collect();
                if surviving.is_empty() {
                    scrubbed_lines.push(format!("{field}: {INSUFFICIENT_ANCHOR_MSG}"));
                } else {
                    let joined = surviving.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ");
                    scrubbed_lines.push(format!("{field}: {joined}"));
                }
                continue;
            }
            scrubbed_lines.push(line.to_string());
            continue;
        }

        if is_bullet && rejected_set.iter().any(|c| line.to_ascii_lowercase().contains(c.as_str())) {
            continue;
        }

        scrubbed_lines.push(line.to_string());
    }

    (scrubbed_lines.join("\n"), ClaimAudit { accepted_claims: accepted, rejected_claims: rejected })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_with_two_anchors_is_accepted() {
        let narrative = "Primary Injuries: lumbar strain, cervical strain";
        let pages = vec!["lumbar strain noted".to_string(), "lumbar strain confirmed".to_string()];
        let (out, audit) = apply_claim_guard(narrative, &pages);
        assert!(audit.accepted_claims.iter().any(|c| c == "lumbar strain"));
        assert!(out.contains("lumbar strain"));
    }

    #[test]
    fn test_claim_with_fewer_than_two_anchors_is_scrubbed() {
        let narrative = "Major Complications: pulmonary embolism";
        let pages = vec!["pulmonary embolism suspected".to_string()];
        let (out, audit) = apply_claim_guard(narrative, &pages);
        assert_eq!(audit.rejected_claims.len(), 1);
        assert_eq!(audit.rejected_claims[0].value, "pulmonary embolism");
        assert_eq!(audit.rejected_claims[0].reason, "HIGH_RISK_UNANCHORED");
        assert!(out.contains("Insufficiently anchored"));
        assert!(!out.to_ascii_lowercase().contains("pulmonary embolism"));
    }

    #[test]
    fn test_bullet_line_referencing_rejected_claim_is_removed() {
        let narrative = "Major Complications: sepsis\n- Patient developed sepsis during admission\n- Patient tolerated procedure well";
        let pages = vec!["no mention of sepsis anywhere".to_string()];
        let (out, _audit) = apply_claim_guard(narrative, &pages);
        assert!(!out.contains("developed sepsis"));
        assert!(out.contains("tolerated procedure well"));
    }
}
