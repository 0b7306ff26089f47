//! Three independent quality scorers (component N).
//!
//! Each scorer is a pure function of `(report_text, run_context)` returning
//! a `ScorerResult`: a pass/fail, a 0-100 score, a list of typed failures,
//! and metrics for audit. `legal_usability` composes the other two rather
//! than re-deriving their checks.

pub mod attorney_readiness;
pub mod checklist;
pub mod legal_usability;
pub mod luqa;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::ChronologyProjectionEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Hard,
    Soft,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Hard => "hard",
            Severity::Soft => "soft",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerFailure {
    pub code: String,
    pub severity: String,
    pub message: String,
    pub examples: Vec<String>,
}

impl ScorerFailure {
    pub fn new(code: &str, severity: Severity, message: impl Into<String>, examples: Vec<String>) -> Self {
        Self { code: code.to_string(), severity: severity.as_str().to_string(), message: message.into(), examples }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerResult {
    pub pass_: bool,
    pub score_0_100: i32,
    pub failures: Vec<ScorerFailure>,
    pub metrics: serde_json::Map<String, serde_json::Value>,
}

/// Context shared by all three scorers: the projection rows that fed the
/// render, and the raw page text keyed by page number (for bucket-presence
/// and noise-citation checks).
pub struct ScorerContext<'a> {
    pub projection_entries: &'a [ChronologyProjectionEntry],
    pub page_text_by_number: &'a HashMap<u32, String>,
}
