use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The rendering-layer view of an event; rows correspond 1:1 to rows in the
/// final PDF timeline. Same-day events with the same
/// `(patient, type, provider, fact-fingerprint)` are merged here, not in the
/// evidence graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChronologyProjectionEntry {
    pub event_id: String,
    pub date_display: String,
    pub provider_display: String,
    pub event_type_display: String,
    pub patient_label: String,
    pub facts: Vec<String>,
    pub citation_display: String,
    pub confidence: i32,
    /// Forward/backward tolerance for fields the named columns don't cover,
    /// per the dict-as-object call sites this type stands in for.
    #[serde(default)]
    pub extras: Map<String, Value>,
}

impl ChronologyProjectionEntry {
    /// Reads a named field first, then falls through to `extras`, mirroring
    /// `row.get("field")` call sites from the dict-shaped original.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "event_id" => Some(Value::String(self.event_id.clone())),
            "date_display" => Some(Value::String(self.date_display.clone())),
            "provider_display" => Some(Value::String(self.provider_display.clone())),
            "event_type_display" => Some(Value::String(self.event_type_display.clone())),
            "patient_label" => Some(Value::String(self.patient_label.clone())),
            "citation_display" => Some(Value::String(self.citation_display.clone())),
            "confidence" => Some(Value::from(self.confidence)),
            _ => self.extras.get(key).cloned(),
        }
    }

    pub fn is_unknown_patient(&self) -> bool {
        self.patient_label == "Unknown Patient"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> ChronologyProjectionEntry {
        ChronologyProjectionEntry {
            event_id: "e1".into(),
            date_display: "2024-01-01 (time not documented)".into(),
            provider_display: "St. Mary Hospital".into(),
            event_type_display: "Office Visit".into(),
            patient_label: "Patient A".into(),
            facts: vec!["Assessment: back pain".into()],
            citation_display: "[packet.pdf p. 3]".into(),
            confidence: 80,
            extras: Map::new(),
        }
    }

    #[test]
    fn test_get_named_field() {
        let e = entry();
        assert_eq!(e.get("confidence"), Some(Value::from(80)));
    }

    #[test]
    fn test_get_extras_fallback() {
        let mut e = entry();
        e.extras.insert("body_region".into(), Value::String("lumbar".into()));
        assert_eq!(e.get("body_region"), Some(Value::String("lumbar".into())));
        assert_eq!(e.get("missing_key"), None);
    }

    #[test]
    fn test_unknown_patient() {
        let mut e = entry();
        e.patient_label = "Unknown Patient".to_string();
        assert!(e.is_unknown_patient());
    }
}
