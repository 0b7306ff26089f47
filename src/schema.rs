//! JSON Schema validation of the `pi-chronology-mvp` output contract
//! (component Q's final step). A failure here does not fail the run; it
//! downgrades `RunStatus::Success` to `RunStatus::Partial` and attaches a
//! `SCHEMA_VALIDATION_ERROR` warning per violation, capped at the first 10.

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::warning::{Warning, WarningCode};

const MAX_REPORTED_ERRORS: usize = 10;

static OUTPUT_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "$id": "pi-chronology-mvp",
        "type": "object",
        "required": ["run", "evidence_graph", "chronology"],
        "properties": {
            "run": {
                "type": "object",
                "required": ["run_id", "status"],
                "properties": {
                    "run_id": { "type": "string", "minLength": 1 },
                    "status": { "enum": ["pending", "running", "success", "partial", "failed"] }
                }
            },
            "chronology": {
                "type": "object",
                "required": ["export_format_version", "events_exported", "exports"],
                "properties": {
                    "export_format_version": { "type": "string", "minLength": 1 },
                    "events_exported": { "type": "integer", "minimum": 0 },
                    "exports": {
                        "type": "object",
                        "required": ["pdf", "csv", "docx"],
                        "properties": {
                            "pdf": { "$ref": "#/$defs/artifact_ref" },
                            "csv": { "$ref": "#/$defs/artifact_ref" },
                            "docx": { "$ref": "#/$defs/artifact_ref" }
                        }
                    }
                }
            }
        },
        "$defs": {
            "artifact_ref": {
                "type": "object",
                "required": ["uri", "sha256", "bytes"],
                "properties": {
                    "uri": { "type": "string", "minLength": 1 },
                    "sha256": { "type": "string", "pattern": "^[0-9a-f]{64}$" },
                    "bytes": { "type": "integer", "minimum": 0 }
                }
            }
        }
    })
});

/// Validates `instance` against the output contract, returning up to
/// [`MAX_REPORTED_ERRORS`] `SCHEMA_VALIDATION_ERROR` warnings. An empty
/// result means the instance is schema-valid.
pub fn validate_output(instance: &Value) -> Vec<Warning> {
    let validator = match jsonschema::validator_for(&OUTPUT_SCHEMA) {
        Ok(v) => v,
        Err(e) => {
            return vec![Warning::new(WarningCode::SchemaValidationError, format!("output schema itself is invalid: {e}"))];
        }
    };

    validator
        .iter_errors(instance)
        .take(MAX_REPORTED_ERRORS)
        .map(|e| Warning::new(WarningCode::SchemaValidationError, format!("{} at {}", e, e.instance_path)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_output_produces_no_warnings() {
        let instance = json!({
            "run": { "run_id": "run-1", "status": "success" },
            "evidence_graph": {},
            "chronology": {
                "export_format_version": "1.0",
                "events_exported": 3,
                "exports": {
                    "pdf": { "uri": "runs/run-1/chronology.pdf", "sha256": "a".repeat(64), "bytes": 10 },
                    "csv": { "uri": "runs/run-1/chronology.csv", "sha256": "b".repeat(64), "bytes": 10 },
                    "docx": { "uri": "runs/run-1/chronology.docx", "sha256": "c".repeat(64), "bytes": 10 }
                }
            }
        });
        assert!(validate_output(&instance).is_empty());
    }

    #[test]
    fn test_missing_required_field_produces_warning() {
        let instance = json!({ "run": { "run_id": "run-1", "status": "success" } });
        let warnings = validate_output(&instance);
        assert!(!warnings.is_empty());
        assert_eq!(warnings[0].code, "SCHEMA_VALIDATION_ERROR");
    }

    #[test]
    fn test_error_count_is_capped() {
        let instance = json!({});
        let warnings = validate_output(&instance);
        assert!(warnings.len() <= MAX_REPORTED_ERRORS);
    }
}
