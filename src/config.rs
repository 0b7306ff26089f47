//! Run configuration: the typed `RunConfig` input contract plus environment
//! toggles collected once at orchestrator setup.

use serde::{Deserialize, Serialize};

fn default_max_pages() -> u32 {
    500
}

fn default_gap_threshold_days() -> i64 {
    45
}

fn default_event_confidence_min_export() -> i32 {
    60
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PtMode {
    Aggregate,
    PerVisit,
}

impl Default for PtMode {
    fn default() -> Self {
        PtMode::Aggregate
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LowConfidenceEventBehavior {
    ExcludeFromExport,
    IncludeWithFlag,
}

impl Default for LowConfidenceEventBehavior {
    fn default() -> Self {
        LowConfidenceEventBehavior::ExcludeFromExport
    }
}

/// The typed input-contract configuration for a run. Every field has a
/// default matching spec so a caller can supply a partial JSON object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub max_pages: u32,
    pub pt_mode: PtMode,
    pub gap_threshold_days: i64,
    pub event_confidence_min_export: i32,
    pub low_confidence_event_behavior: LowConfidenceEventBehavior,
    pub include_billing_events_in_timeline: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            pt_mode: PtMode::default(),
            gap_threshold_days: default_gap_threshold_days(),
            event_confidence_min_export: default_event_confidence_min_export(),
            low_confidence_event_behavior: LowConfidenceEventBehavior::default(),
            include_billing_events_in_timeline: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrMode {
    Full,
    Fast,
    Sample,
    Off,
}

impl OcrMode {
    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "fast" => OcrMode::Fast,
            "sample" => OcrMode::Sample,
            "off" => OcrMode::Off,
            _ => OcrMode::Full,
        }
    }
}

/// Environment-sourced toggles, read once at orchestrator setup (mirrors the
/// teacher's `get_python_config` pattern of resolving settings up front
/// rather than re-reading `std::env` ad hoc from inside stages).
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub ocr_workers: usize,
    pub ocr_dpi: u32,
    pub ocr_mode: OcrMode,
    pub ocr_timeout_seconds: u64,
    pub ocr_total_timeout_seconds: u64,
    pub ocr_fast_limit: u32,
    pub ocr_sample_every: u32,
    pub disable_ocr: bool,
    pub debug_artifacts: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            ocr_workers: 4,
            ocr_dpi: 300,
            ocr_mode: OcrMode::Full,
            ocr_timeout_seconds: 30,
            ocr_total_timeout_seconds: 600,
            ocr_fast_limit: 50,
            ocr_sample_every: 5,
            disable_ocr: false,
            debug_artifacts: false,
        }
    }
}

impl EnvConfig {
    /// Reads every toggle from `std::env` once. Missing or unparsable values
    /// fall back to the default silently, the way the teacher's
    /// settings loader tolerates a partial `config.json`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ocr_workers: env_usize("OCR_WORKERS").unwrap_or(defaults.ocr_workers),
            ocr_dpi: env_u32("OCR_DPI").unwrap_or(defaults.ocr_dpi),
            ocr_mode: std::env::var("OCR_MODE")
                .ok()
                .map(|v| OcrMode::parse(&v))
                .unwrap_or(defaults.ocr_mode),
            ocr_timeout_seconds: env_u64("OCR_TIMEOUT_SECONDS")
                .unwrap_or(defaults.ocr_timeout_seconds),
            ocr_total_timeout_seconds: env_u64("OCR_TOTAL_TIMEOUT_SECONDS")
                .unwrap_or(defaults.ocr_total_timeout_seconds),
            ocr_fast_limit: env_u32("OCR_FAST_LIMIT").unwrap_or(defaults.ocr_fast_limit),
            ocr_sample_every: env_u32("OCR_SAMPLE_EVERY").unwrap_or(defaults.ocr_sample_every),
            disable_ocr: env_bool("DISABLE_OCR").unwrap_or(defaults.disable_ocr),
            debug_artifacts: env_bool("DEBUG_ARTIFACTS").unwrap_or(defaults.debug_artifacts),
        }
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|v| {
        let v = v.to_ascii_lowercase();
        v == "1" || v == "true" || v == "yes"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_config_defaults() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.max_pages, 500);
        assert_eq!(cfg.gap_threshold_days, 45);
        assert_eq!(cfg.event_confidence_min_export, 60);
        assert_eq!(cfg.pt_mode, PtMode::Aggregate);
        assert_eq!(
            cfg.low_confidence_event_behavior,
            LowConfidenceEventBehavior::ExcludeFromExport
        );
    }

    #[test]
    fn test_run_config_deserializes_partial_json() {
        let cfg: RunConfig = serde_json::from_str(r#"{"max_pages": 10}"#).unwrap();
        assert_eq!(cfg.max_pages, 10);
        assert_eq!(cfg.gap_threshold_days, 45);
    }

    #[test]
    fn test_ocr_mode_parse_falls_back_to_full() {
        assert_eq!(OcrMode::parse("fast"), OcrMode::Fast);
        assert_eq!(OcrMode::parse("bogus"), OcrMode::Full);
    }
}
