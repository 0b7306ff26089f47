//! Page classifier (component B).
//!
//! Scores each page's text against class-specific keyword lexicons and
//! assigns the highest-scoring `PageType`, breaking ties by a fixed class
//! priority order.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::PageType;

struct Lexicon {
    page_type: PageType,
    keywords: &'static [&'static str],
}

static LEXICONS: Lazy<Vec<Lexicon>> = Lazy::new(|| {
    vec![
        Lexicon {
            page_type: PageType::Billing,
            keywords: &["invoice", "statement", "balance due", "copay", "cpt", "charge", "amount billed"],
        },
        Lexicon {
            page_type: PageType::ImagingReport,
            keywords: &["mri", "ct scan", "x-ray", "radiology", "impression", "findings", "ultrasound"],
        },
        Lexicon {
            page_type: PageType::OperativeReport,
            keywords: &["operative report", "surgeon", "anesthesia", "procedure performed", "incision"],
        },
        Lexicon {
            page_type: PageType::PtNote,
            keywords: &["physical therapy", "range of motion", "rom", "therex", "plan of care", "gait"],
        },
        Lexicon {
            page_type: PageType::Lab,
            keywords: &["lab", "specimen", "reference range", "wbc", "hemoglobin", "panel"],
        },
        Lexicon {
            page_type: PageType::DischargeSummary,
            keywords: &["discharge summary", "discharge instructions", "discharge diagnosis"],
        },
        Lexicon {
            page_type: PageType::ClinicalNote,
            keywords: &["chief complaint", "history of present illness", "assessment", "plan", "hpi"],
        },
        Lexicon {
            page_type: PageType::Administrative,
            keywords: &["consent form", "registration", "authorization", "hipaa", "patient rights"],
        },
    ]
});

static WORD_BOUNDARY_CACHE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

fn normalized(text: &str) -> String {
    text.to_ascii_lowercase()
}

fn score_for(lexicon: &Lexicon, text_lower: &str) -> u32 {
    lexicon
        .keywords
        .iter()
        .filter(|kw| text_lower.contains(*kw))
        .count() as u32
}

/// Returns `(page_type, confidence)`. Confidence is the winning score's
/// margin over the runner-up, scaled into `0..=100`.
pub fn classify_page(text: &str) -> (PageType, i32) {
    let text_lower = normalized(text);
    let _ = &*WORD_BOUNDARY_CACHE;

    let mut scores: Vec<(PageType, u32)> = LEXICONS
        .iter()
        .map(|lex| (lex.page_type, score_for(lex, &text_lower)))
        .collect();

    // Stable tiebreak: sort by (−score, tiebreak priority index).
    let priority = PageType::tiebreak_order();
    scores.sort_by_key(|(pt, score)| {
        let idx = priority.iter().position(|p| p == pt).unwrap_or(priority.len());
        (std::cmp::Reverse(*score), idx)
    });

    let (best_type, best_score) = scores[0];
    if best_score == 0 {
        return (PageType::Other, 0);
    }
    let runner_up = scores.get(1).map(|(_, s)| *s).unwrap_or(0);
    let margin = best_score.saturating_sub(runner_up);
    let confidence = (50 + margin * 15).min(100) as i32;
    (best_type, confidence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_billing_page() {
        let text = "Patient Statement\nAmount Billed: $450.00\nCPT 99213\nBalance Due: $120.00";
        let (pt, conf) = classify_page(text);
        assert_eq!(pt, PageType::Billing);
        assert!(conf > 50);
    }

    #[test]
    fn test_classify_imaging_page() {
        let text = "MRI Lumbar Spine without contrast.\nFindings: disc herniation at L4-L5.\nImpression: lumbar radiculopathy.";
        let (pt, _) = classify_page(text);
        assert_eq!(pt, PageType::ImagingReport);
    }

    #[test]
    fn test_classify_blank_page_is_other() {
        let (pt, conf) = classify_page("   ");
        assert_eq!(pt, PageType::Other);
        assert_eq!(conf, 0);
    }

    #[test]
    fn test_tie_prefers_billing_over_clinical() {
        // Contrived text scoring one keyword hit in both billing and clinical lexicons.
        let text = "charge assessment";
        let (pt, _) = classify_page(text);
        assert_eq!(pt, PageType::Billing);
    }
}
