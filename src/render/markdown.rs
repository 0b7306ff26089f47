//! Builds the canonical rendered-report text (component P): the
//! `chronology.md` artifact, and the text surface the three QA scorers and
//! the litigation checklist grep for required section headers.
//!
//! Section order: Moat Analysis, Executive Summary, Chronological Medical
//! Timeline, Top 10 Case-Driving Events, Liability Facts / Causation Chain
//! / Damages Progression, Medical Record Appendix A-F. The PDF renderer
//! ([`super::pdf`]) typesets this same text; `chronology.md` and
//! `chronology.pdf` are never allowed to diverge in substance.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{ChronologyProjectionEntry, ClaimEdge, ClaimType, Event, GapRationale};

use super::manifest::{appendix_anchor, chron_anchor};
use super::RenderInput;

static MEDICATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(hydrocodone|oxycodone|lidocaine|depo-?medrol|ibuprofen|acetaminophen|toradol|ketorolac|gabapentin|cyclobenzaprine|prednisone|naproxen)\b").unwrap());
static DX_MEDICAL_TERM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(radiculopathy|herniation|disc|strain|sprain|stenosis|protrusion|fracture|tear|neuropathy|degeneration|spondylosis)\b").unwrap());
static DX_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-TV-Z][0-9][0-9A-Z](?:\.[0-9A-Z]{1,4})?)\b").unwrap());
static PRO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bpain\s*(?:score|severity|level)?\s*[:=]?\s*\d{1,2}\s*/\s*10\b|\brange of motion\b|\bstrength\s*[0-5](?:\.\d+)?\s*/\s*5\b").unwrap());
static SDOH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(housing insecurity|food insecurity|transportation barrier|unemployed due to|lack of insurance)\b").unwrap());
static CITATION_REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\[\]]+?) p\. (\d+)\]").unwrap());

fn citation_refs(citation_display: &str) -> Vec<(String, u32)> {
    CITATION_REF_RE.captures_iter(citation_display).filter_map(|c| c[2].parse().ok().map(|page| (c[1].to_string(), page))).collect()
}

fn executive_summary(entries: &[ChronologyProjectionEntry], care_window: Option<(chrono::NaiveDate, chrono::NaiveDate)>) -> String {
    if entries.is_empty() {
        return "No substantive medical events were identified in the source material.".to_string();
    }
    let window_text = match care_window {
        Some((start, end)) => format!("Treatment Timeframe: {} to {}.", start.format("%Y-%m-%d"), end.format("%Y-%m-%d")),
        None => String::new(),
    };
    format!("This chronology spans {} documented medical event(s). {}", entries.len(), window_text)
}

fn moat_analysis(claim_edges: &[ClaimEdge]) -> String {
    let procedures = claim_edges.iter().filter(|e| e.claim_type == ClaimType::Procedure).count();
    let imaging = claim_edges.iter().filter(|e| e.claim_type == ClaimType::ImagingFinding).count();
    if procedures == 0 && imaging == 0 {
        return "No objective findings (imaging, procedures) distinguish this record from a routine-care file.".to_string();
    }
    format!("{imaging} imaging finding(s) and {procedures} procedure(s) anchor objective injury evidence beyond subjective complaint.")
}

fn top10_lines(claim_edges: &[ClaimEdge]) -> Vec<String> {
    let mut ranked: Vec<&ClaimEdge> = claim_edges.iter().collect();
    ranked.sort_by_key(|e| std::cmp::Reverse(e.selection_score()));
    ranked
        .into_iter()
        .take(10)
        .map(|e| {
            let citation = e.citations.first().cloned().unwrap_or_default();
            format!("- **{:?}**: {} | Citation(s): {citation}", e.claim_type, e.assertion)
        })
        .collect()
}

fn case_theory_section(title: &str, types: &[ClaimType], claim_edges: &[ClaimEdge]) -> Vec<String> {
    let mut lines = vec![format!("## {title}"), String::new()];
    let rows: Vec<&ClaimEdge> = claim_edges.iter().filter(|e| types.contains(&e.claim_type)).collect();
    if rows.is_empty() {
        lines.push("No material facts identified for this category.".to_string());
        lines.push("Citation(s): none".to_string());
    } else {
        for edge in rows.iter().take(8) {
            let citation = edge.citations.first().cloned().unwrap_or_default();
            lines.push(format!("- {} | Citation(s): {citation}", edge.assertion));
        }
    }
    lines.push(String::new());
    lines
}

/// Builds the full rendered-report text shared by the Markdown and PDF
/// artifacts, and populates `manifest` with every anchor/link it emits.
pub fn build_report_text(input: &RenderInput, manifest: &mut super::manifest::RenderManifest) -> String {
    let filename_to_doc_id: HashMap<&str, &str> =
        input.source_documents.iter().map(|d| (d.filename.as_str(), d.document_id.as_str())).collect();

    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("# {}", input.matter_title));
    lines.push(String::new());
    lines.push("## Medical Chronology Analysis".to_string());
    lines.push(String::new());

    lines.push("## Moat Analysis".to_string());
    lines.push(String::new());
    lines.push(moat_analysis(input.claim_edges));
    lines.push(String::new());

    lines.push("## Executive Summary".to_string());
    lines.push(String::new());
    let summary = match input.narrative_synthesis {
        Some(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => executive_summary(input.projection, input.care_window),
    };
    lines.push(summary);
    lines.push(String::new());

    lines.push("## Chronological Medical Timeline".to_string());
    lines.push(String::new());
    for entry in input.projection {
        let anchor = chron_anchor(&entry.event_id);
        lines.push(format!("<a id=\"{anchor}\"></a>"));
        lines.push(format!("- **{}** | Encounter: **{}**", entry.date_display, entry.event_type_display));
        lines.push(format!("  Facility/Clinician: {}", entry.provider_display));
        for fact in &entry.facts {
            lines.push(format!("  Finding: \"{fact}\""));
        }
        lines.push(format!("  Citation(s): {}", entry.citation_display));

        for (filename, page) in citation_refs(&entry.citation_display) {
            if let Some(doc_id) = filename_to_doc_id.get(filename.as_str()) {
                let app_anchor = appendix_anchor(doc_id, page);
                manifest.add_appendix_anchor(&app_anchor);
                manifest.add_link(&anchor, &app_anchor);
            }
        }
        manifest.add_chron_anchor(&anchor);
    }
    lines.push(String::new());

    lines.push("## Top 10 Case-Driving Events".to_string());
    lines.push(String::new());
    lines.extend(top10_lines(input.claim_edges));
    lines.push(String::new());

    lines.extend(case_theory_section("Liability Facts", &[ClaimType::WorkRestriction, ClaimType::TreatmentVisit], input.claim_edges));
    lines.extend(case_theory_section("Causation Chain", &[ClaimType::ImagingFinding, ClaimType::InjuryDx, ClaimType::Procedure], input.claim_edges));
    lines.extend(case_theory_section("Damages Progression", &[ClaimType::Symptom, ClaimType::WorkRestriction], input.claim_edges));

    lines.push("## Medical Record Appendix".to_string());
    lines.push(String::new());

    lines.push("### Appendix A: Medications".to_string());
    lines.push(String::new());
    append_citation_appendix(&mut lines, manifest, input, &MEDICATION_RE, "No medication changes documented.");

    lines.push("### Appendix B: Diagnoses".to_string());
    lines.push(String::new());
    let dx_matches = |text: &str| DX_MEDICAL_TERM_RE.is_match(text) || DX_CODE_RE.is_match(text);
    let dx_hits: Vec<&crate::model::Citation> = input.citations.iter().filter(|c| dx_matches(&c.snippet)).collect();
    if dx_hits.is_empty() {
        lines.push("No diagnosis-bearing citations identified.".to_string());
    } else {
        for citation in dx_hits.into_iter().take(30) {
            push_citation_line(&mut lines, manifest, input, citation);
        }
    }
    lines.push(String::new());

    lines.push("### Appendix C: Treatment Gaps".to_string());
    lines.push(String::new());
    if input.gaps.is_empty() {
        lines.push("No treatment gaps exceeding the configured threshold were detected.".to_string());
    } else {
        for gap in input.gaps {
            lines.push(format!(
                "- {} to {} ({} days, {})",
                gap.start_date,
                gap.end_date,
                gap.duration_days,
                gap.rationale.as_str()
            ));
        }
    }
    lines.push(String::new());
    lines.push("#### C1 Gap Boundary Anchors".to_string());
    lines.push(String::new());
    if input.gaps.is_empty() {
        lines.push("No gap boundaries to anchor.".to_string());
    } else {
        for gap in input.gaps {
            let [before, after] = &gap.related_event_ids;
            lines.push(format!(
                "- Gap [{} .. {}] bounded by [{}]({}) and [{}]({})",
                gap.start_date,
                gap.end_date,
                before,
                chron_anchor(before),
                after,
                chron_anchor(after)
            ));
        }
    }
    lines.push(String::new());

    lines.push("### Appendix D: Patient-Reported Outcomes".to_string());
    lines.push(String::new());
    append_citation_appendix(&mut lines, manifest, input, &PRO_RE, "No patient-reported-outcome measures documented.");

    lines.push("### Appendix E: Issue Flags".to_string());
    lines.push(String::new());
    let flagged_events: Vec<&Event> = input.events.iter().filter(|e| !e.flags.is_empty()).collect();
    if flagged_events.is_empty() {
        lines.push("No issue flags raised during processing.".to_string());
    } else {
        for event in flagged_events {
            let flags: Vec<&str> = event.flags.iter().map(|s| s.as_str()).collect();
            lines.push(format!("- {}: {}", event.event_id, flags.join(", ")));
        }
    }
    lines.push(String::new());

    lines.push("### Appendix F: SDOH".to_string());
    lines.push(String::new());
    let mut sdoh_pages: Vec<(u32, String)> = input
        .page_text_by_number
        .iter()
        .filter(|(_, text)| SDOH_RE.is_match(text))
        .filter_map(|(page, text)| SDOH_RE.find(text).map(|m| (*page, m.as_str().to_string())))
        .collect();
    sdoh_pages.sort_by_key(|(p, _)| *p);
    if sdoh_pages.is_empty() {
        lines.push("No social-determinants-of-health content identified.".to_string());
    } else {
        for (page, snippet) in sdoh_pages {
            lines.push(format!("- p. {page}: \"{snippet}\""));
        }
    }
    lines.push(String::new());

    lines.join("\n").trim().to_string() + "\n"
}

fn push_citation_line(lines: &mut Vec<String>, manifest: &mut super::manifest::RenderManifest, input: &RenderInput, citation: &crate::model::Citation) {
    let doc_id = &citation.source_document_id;
    let filename = input.source_documents.iter().find(|d| &d.document_id == doc_id).map(|d| d.filename.as_str()).unwrap_or(doc_id.as_str());
    let anchor = appendix_anchor(doc_id, citation.page_number);
    manifest.add_appendix_anchor(&anchor);
    lines.push(format!("- \"{}\" [{filename} p. {}]", citation.snippet, citation.page_number));
}

fn append_citation_appendix(lines: &mut Vec<String>, manifest: &mut super::manifest::RenderManifest, input: &RenderInput, pattern: &Regex, empty_text: &str) {
    let hits: Vec<&crate::model::Citation> = input.citations.iter().filter(|c| pattern.is_match(&c.snippet)).collect();
    if hits.is_empty() {
        lines.push(empty_text.to_string());
    } else {
        for citation in hits.into_iter().take(30) {
            push_citation_line(lines, manifest, input, citation);
        }
    }
    lines.push(String::new());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::manifest::RenderManifest;
    use std::collections::HashMap as StdHashMap;

    fn input<'a>(projection: &'a [ChronologyProjectionEntry], claim_edges: &'a [ClaimEdge]) -> RenderInput<'a> {
        RenderInput {
            matter_title: "Doe v. Example",
            projection,
            claim_edges,
            gaps: &[],
            events: &[],
            citations: &[],
            source_documents: &[],
            page_text_by_number: &EMPTY_PAGES,
            narrative_synthesis: None,
            care_window: None,
        }
    }

    static EMPTY_PAGES: Lazy<StdHashMap<u32, String>> = Lazy::new(StdHashMap::new);

    fn entry() -> ChronologyProjectionEntry {
        ChronologyProjectionEntry {
            event_id: "e1".into(),
            date_display: "2024-01-01 (time not documented)".into(),
            provider_display: "St. Mary Hospital".into(),
            event_type_display: "Office Visit".into(),
            patient_label: "Patient A".into(),
            facts: vec!["Assessment: lumbar strain".into()],
            citation_display: "[packet.pdf p. 3]".into(),
            confidence: 80,
            extras: Default::default(),
        }
    }

    #[test]
    fn test_report_contains_required_section_headers() {
        let entries = vec![entry()];
        let edges: Vec<ClaimEdge> = vec![];
        let inp = input(&entries, &edges);
        let mut manifest = RenderManifest::default();
        let text = build_report_text(&inp, &mut manifest);
        for header in ["Medical Chronology Analysis", "Chronological Medical Timeline", "Top 10 Case-Driving Events", "Appendix A:", "Appendix B:", "Appendix C"] {
            assert!(text.contains(header), "missing header: {header}");
        }
        for header in ["Liability Facts", "Causation Chain", "Damages Progression"] {
            assert!(text.contains(header), "missing case-theory header: {header}");
        }
    }

    #[test]
    fn test_timeline_row_gets_chron_anchor() {
        let entries = vec![entry()];
        let edges: Vec<ClaimEdge> = vec![];
        let inp = input(&entries, &edges);
        let mut manifest = RenderManifest::default();
        build_report_text(&inp, &mut manifest);
        assert!(manifest.chron_anchors.contains(&"chron_row_e1".to_string()));
    }
}
