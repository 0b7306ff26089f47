use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::RunConfig;
use crate::warning::Warning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Success,
    Partial,
    Failed,
}

impl RunStatus {
    /// Lifecycle transitions monotonically: `pending -> running ->
    /// {success, partial, failed}`. Nothing transitions back.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        use RunStatus::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Running, Success)
                | (Running, Partial)
                | (Running, Failed)
                | (Pending, Failed)
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Provenance {
    pub pipeline_version: String,
    pub extractor: String,
    pub ocr_engine: String,
    pub inputs_sha256: String,
    pub outputs_sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub run_id: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub config: RunConfig,
    #[serde(default)]
    pub metrics: serde_json::Map<String, Value>,
    pub warnings: Vec<Warning>,
    pub provenance: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Run {
    pub fn new(run_id: impl Into<String>, config: RunConfig, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: run_id.into(),
            status: RunStatus::Pending,
            started_at,
            finished_at: None,
            config,
            metrics: Default::default(),
            warnings: Vec::new(),
            provenance: Provenance::default(),
            error_message: None,
        }
    }

    pub fn transition_to(&mut self, next: RunStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        assert!(RunStatus::Pending.can_transition_to(RunStatus::Running));
        assert!(RunStatus::Running.can_transition_to(RunStatus::Success));
        assert!(!RunStatus::Success.can_transition_to(RunStatus::Running));
        assert!(!RunStatus::Pending.can_transition_to(RunStatus::Success));
    }

    #[test]
    fn test_run_transition_mutates_on_success() {
        let mut run = Run::new("run-1", RunConfig::default(), Utc::now());
        assert!(run.transition_to(RunStatus::Running));
        assert!(run.transition_to(RunStatus::Partial));
        assert!(!run.transition_to(RunStatus::Running));
    }
}
