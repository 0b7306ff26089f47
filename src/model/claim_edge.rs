use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimType {
    InjuryDx,
    Symptom,
    ImagingFinding,
    Procedure,
    MedicationChange,
    WorkRestriction,
    TreatmentVisit,
    GapInCare,
    PreExistingMention,
}

/// An atomic assertion tied to an event, scored for its usefulness in the
/// case-theory narrative (Top-10 selection, Liability/Causation/Damages
/// chains).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimEdge {
    pub id: String,
    pub event_id: String,
    pub patient_label: String,
    pub claim_type: ClaimType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub assertion: String,
    pub citations: Vec<String>,
    pub support_score: i32,
    pub flags: BTreeSet<String>,
    pub materiality_weight: i32,
    #[serde(default)]
    pub extras: Map<String, Value>,
}

impl ClaimEdge {
    pub fn selection_score(&self) -> i32 {
        self.support_score * self.materiality_weight
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "id" => Some(Value::String(self.id.clone())),
            "event_id" => Some(Value::String(self.event_id.clone())),
            "patient_label" => Some(Value::String(self.patient_label.clone())),
            "assertion" => Some(Value::String(self.assertion.clone())),
            "support_score" => Some(Value::from(self.support_score)),
            "materiality_weight" => Some(Value::from(self.materiality_weight)),
            "selection_score" => Some(Value::from(self.selection_score())),
            _ => self.extras.get(key).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_score() {
        let edge = ClaimEdge {
            id: "c1".into(),
            event_id: "e1".into(),
            patient_label: "Patient A".into(),
            claim_type: ClaimType::Procedure,
            date: None,
            body_region: None,
            provider: None,
            assertion: "lumbar epidural injection".into(),
            citations: vec!["cit-1".into()],
            support_score: 7,
            flags: Default::default(),
            materiality_weight: 3,
            extras: Default::default(),
        };
        assert_eq!(edge.selection_score(), 21);
    }
}
