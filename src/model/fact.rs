use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    ChiefComplaint,
    Assessment,
    Plan,
    Diagnosis,
    Medication,
    Impression,
    Finding,
    ProcedureNote,
    BillingItem,
    Restriction,
    Lab,
    Procedure,
    Provider,
    RomValue,
    StrengthGrade,
    PainScore,
    NeuroSymptom,
    Other,
}

impl FactKind {
    /// Fact kinds that count as "anchor" facts for confidence scoring: a
    /// concrete clinical assertion rather than incidental metadata.
    pub fn is_anchor(&self) -> bool {
        matches!(
            self,
            FactKind::ChiefComplaint | FactKind::Assessment | FactKind::Plan | FactKind::Impression
        )
    }
}

/// A verbatim, citation-backed snippet from source text, tagged with its
/// semantic role within the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    /// Verbatim snippet, roughly <= 300 chars.
    pub text: String,
    pub kind: FactKind,
    pub verbatim: bool,
    pub citation_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_kinds() {
        assert!(FactKind::Assessment.is_anchor());
        assert!(FactKind::Impression.is_anchor());
        assert!(!FactKind::Lab.is_anchor());
    }
}
