use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::event_date::EventDate;
use super::fact::Fact;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    OfficeVisit,
    PtVisit,
    ImagingStudy,
    Procedure,
    LabResult,
    ErVisit,
    HospitalAdmission,
    HospitalDischarge,
    InpatientDailyNote,
    BillingEvent,
    WorkStatus,
    Administrative,
    Other,
}

impl EventType {
    /// Event types whose mere occurrence contributes to confidence, per
    /// the scoring formula.
    pub fn is_high_acuity(&self) -> bool {
        matches!(
            self,
            EventType::ErVisit
                | EventType::HospitalAdmission
                | EventType::HospitalDischarge
                | EventType::Procedure
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::OfficeVisit => "office_visit",
            EventType::PtVisit => "pt_visit",
            EventType::ImagingStudy => "imaging_study",
            EventType::Procedure => "procedure",
            EventType::LabResult => "lab_result",
            EventType::ErVisit => "er_visit",
            EventType::HospitalAdmission => "hospital_admission",
            EventType::HospitalDischarge => "hospital_discharge",
            EventType::InpatientDailyNote => "inpatient_daily_note",
            EventType::BillingEvent => "billing_event",
            EventType::WorkStatus => "work_status",
            EventType::Administrative => "administrative",
            EventType::Other => "other",
        }
    }
}

/// A typed clinical/billing/administrative occurrence, with its supporting
/// facts and citations. Produced by the event extractors (component F),
/// annotated with `flags` by later stages (dedup, confidence, gap) but
/// never mutated in its core fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    pub event_type: EventType,
    pub date: EventDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter_type_raw: Option<String>,
    pub facts: Vec<Fact>,
    #[serde(default)]
    pub diagnoses: Vec<String>,
    #[serde(default)]
    pub procedures: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imaging: Option<ImagingDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing: Option<BillingDetails>,
    pub confidence: i32,
    pub flags: BTreeSet<String>,
    pub citation_ids: Vec<String>,
    pub source_page_numbers: Vec<u32>,
    #[serde(default)]
    pub extensions: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagingDetails {
    pub modality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impression: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingDetails {
    pub amount_type: String,
    pub amount_cents: i64,
    #[serde(default)]
    pub codes: Vec<String>,
}

impl Event {
    pub fn patient_scope_id(&self) -> Option<&str> {
        self.extensions.get("patient_scope_id").and_then(|v| v.as_str())
    }

    pub fn provider_is_known(&self) -> bool {
        matches!(&self.provider_id, Some(id) if id != "unknown")
    }

    pub fn anchor_fact_count(&self) -> usize {
        self.facts.iter().filter(|f| f.kind.is_anchor()).count()
    }

    pub fn is_multi_page(&self) -> bool {
        self.source_page_numbers.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_high_acuity() {
        assert!(EventType::ErVisit.is_high_acuity());
        assert!(!EventType::OfficeVisit.is_high_acuity());
    }

    #[test]
    fn test_provider_is_known() {
        let mut e = sample_event();
        e.provider_id = Some("unknown".to_string());
        assert!(!e.provider_is_known());
        e.provider_id = Some("prov-1".to_string());
        assert!(e.provider_is_known());
    }

    fn sample_event() -> Event {
        use super::super::event_date::{DateSource, EventDate};
        Event {
            event_id: "e1".into(),
            provider_id: None,
            event_type: EventType::OfficeVisit,
            date: EventDate::single(
                chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                DateSource::Tier1,
            ),
            encounter_type_raw: None,
            facts: vec![],
            diagnoses: vec![],
            procedures: vec![],
            imaging: None,
            billing: None,
            confidence: 0,
            flags: Default::default(),
            citation_ids: vec![],
            source_page_numbers: vec![1],
            extensions: Default::default(),
        }
    }
}
