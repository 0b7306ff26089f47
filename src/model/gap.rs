use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapRationale {
    HospiceContinuityBreak,
    RehabSnfTransitionGap,
    PostAdmissionFollowupMissing,
    PostProcedureFollowupMissing,
    RoutineContinuityGap,
    RoutineContinuityGapCollapsed,
}

impl GapRationale {
    pub fn as_str(&self) -> &'static str {
        match self {
            GapRationale::HospiceContinuityBreak => "hospice_continuity_break",
            GapRationale::RehabSnfTransitionGap => "rehab_snf_transition_gap",
            GapRationale::PostAdmissionFollowupMissing => "post_admission_followup_missing",
            GapRationale::PostProcedureFollowupMissing => "post_procedure_followup_missing",
            GapRationale::RoutineContinuityGap => "routine_continuity_gap",
            GapRationale::RoutineContinuityGapCollapsed => "routine_continuity_gap_collapsed",
        }
    }
}

/// A detected treatment gap. Invariant: `start_date < end_date`;
/// `related_event_ids[0]` dates <= start, `[1]` dates >= end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gap {
    pub gap_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: i64,
    pub threshold_days: i64,
    pub confidence: i32,
    pub related_event_ids: [String; 2],
    pub rationale: GapRationale,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_label: Option<String>,
}

impl Gap {
    pub fn is_well_formed(&self) -> bool {
        self.start_date < self.end_date
    }
}
