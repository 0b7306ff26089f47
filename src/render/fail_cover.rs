//! Fail-cover page: prepended to `chronology.md`/`chronology.pdf` when any
//! of {LUQA, Attorney-Readiness, Legal-Usability, the litigation checklist}
//! fails. Never alters the bytes beneath it — the underlying report is
//! still fully present, just pushed below the cover.

use crate::qa::{ScorerFailure, ScorerResult};

use super::RenderQa;

fn failure_lines(label: &str, result: &ScorerResult) -> Vec<String> {
    if result.pass_ {
        return Vec::new();
    }
    let mut lines = vec![format!("### {label}: FAIL (score {})", result.score_0_100)];
    for failure in &result.failures {
        lines.push(format!("- [{}] {}", failure.code, failure.message));
        for example in failure.examples.iter().take(3) {
            lines.push(format!("  - e.g. \"{example}\""));
        }
    }
    lines
}

fn hard_failures(result: &ScorerResult) -> impl Iterator<Item = &ScorerFailure> {
    result.failures.iter().filter(|f| f.severity == "hard")
}

/// Builds the cover-page text if any QA verdict failed, or `None` if the
/// run is clean and no cover is needed.
pub fn build_cover_text(qa: &RenderQa) -> Option<String> {
    let any_failed = !qa.luqa.pass_ || !qa.attorney_readiness.pass_ || !qa.legal_usability.pass_ || !qa.checklist.pass_;
    if !any_failed {
        return None;
    }

    let mut lines = vec![
        "# QUALITY ASSURANCE FAILURE".to_string(),
        String::new(),
        "This chronology did not pass one or more automated QA gates. The full rendered report follows this cover page unchanged; review the failures below before relying on it.".to_string(),
        String::new(),
    ];

    lines.extend(failure_lines("LUQA", qa.luqa));
    lines.extend(failure_lines("Attorney Readiness", qa.attorney_readiness));
    lines.extend(failure_lines("Legal Usability", qa.legal_usability));
    lines.extend(failure_lines("Litigation Checklist", qa.checklist));

    let hard_count = hard_failures(qa.checklist).count()
        + hard_failures(qa.luqa).count()
        + hard_failures(qa.attorney_readiness).count()
        + hard_failures(qa.legal_usability).count();
    lines.push(String::new());
    lines.push(format!("Hard-gate failures across all scorers: {hard_count}."));
    lines.push("---".to_string());
    lines.push(String::new());

    Some(lines.join("\n"))
}

/// Prepends `cover_text` to the Markdown artifact bytes.
pub fn prepend_markdown(cover_text: &str, markdown_bytes: &[u8]) -> Vec<u8> {
    let mut out = cover_text.as_bytes().to_vec();
    out.push(b'\n');
    out.extend_from_slice(markdown_bytes);
    out
}

/// Prepends `cover_text` to the plain report text before PDF typesetting.
pub fn prepend_report_text(cover_text: &str, report_text: &str) -> String {
    format!("{cover_text}\n{report_text}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn result(pass: bool) -> ScorerResult {
        ScorerResult {
            pass_: pass,
            score_0_100: if pass { 100 } else { 40 },
            failures: if pass {
                Vec::new()
            } else {
                vec![ScorerFailure::new("TEST_CODE", crate::qa::Severity::Hard, "something failed", vec!["evidence".to_string()])]
            },
            metrics: Map::new(),
        }
    }

    #[test]
    fn test_all_passing_produces_no_cover() {
        let passing = result(true);
        let qa = RenderQa { luqa: &passing, attorney_readiness: &passing, legal_usability: &passing, checklist: &passing };
        assert!(build_cover_text(&qa).is_none());
    }

    #[test]
    fn test_one_failure_produces_cover_naming_it() {
        let passing = result(true);
        let failing = result(false);
        let qa = RenderQa { luqa: &failing, attorney_readiness: &passing, legal_usability: &passing, checklist: &passing };
        let cover = build_cover_text(&qa).unwrap();
        assert!(cover.contains("LUQA: FAIL"));
        assert!(cover.contains("TEST_CODE"));
        assert!(!cover.contains("Attorney Readiness: FAIL"));
    }

    #[test]
    fn test_prepend_markdown_keeps_original_bytes_intact() {
        let original = b"# Report\nbody".to_vec();
        let prepended = prepend_markdown("# COVER", &original);
        assert!(prepended.ends_with(b"# Report\nbody"));
    }
}
