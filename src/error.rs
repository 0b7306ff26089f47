//! Centralized error handling for the chronology core.
//!
//! Provides `CoreError` with variants for all error categories, so a caller
//! embedding this library (an HTTP handler, a worker loop, a CLI) can
//! classify a failure without matching on message text.
//!
//! # Serialization
//!
//! Serializes to JSON with structure:
//! ```json
//! { "error_type": "variant_name", "message": "details" }
//! ```

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Crate-wide error type. Each variant is a distinct failure category.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input-contract violation: bad mime type, bad sha256, empty document set.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Document/page processing failure (text acquisition, classification,
    /// segmentation, extraction).
    #[error("Processing error: {0}")]
    Processing(String),

    /// Artifact rendering failure (PDF/CSV/DOCX/Markdown export).
    #[error("Rendering error: {0}")]
    Rendering(String),

    /// Persistence adapter failure (run/artifact write-through).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Output contract failed JSON Schema validation beyond recovery.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Run was cancelled via its `CancellationToken`.
    #[error("Operation cancelled")]
    Cancelled,

    /// Every source document failed validation, or no pages survived
    /// extraction — there is nothing left for the pipeline to run on.
    #[error("Unrecoverable: {0}")]
    Unrecoverable(String),
}

impl CoreError {
    /// Returns the error type name for serialization.
    fn error_type(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "Validation",
            CoreError::Processing(_) => "Processing",
            CoreError::Rendering(_) => "Rendering",
            CoreError::Storage(_) => "Storage",
            CoreError::Schema(_) => "Schema",
            CoreError::Cancelled => "Cancelled",
            CoreError::Unrecoverable(_) => "Unrecoverable",
        }
    }

    /// Returns the error message content.
    fn message(&self) -> String {
        match self {
            CoreError::Validation(msg) => msg.clone(),
            CoreError::Processing(msg) => msg.clone(),
            CoreError::Rendering(msg) => msg.clone(),
            CoreError::Storage(msg) => msg.clone(),
            CoreError::Schema(msg) => msg.clone(),
            CoreError::Cancelled => "Operation cancelled".to_string(),
            CoreError::Unrecoverable(msg) => msg.clone(),
        }
    }

    /// Truncates to the 2000-char limit the `Run` record allows for
    /// `error_message`.
    pub fn truncated_message(&self) -> String {
        let msg = self.to_string();
        if msg.chars().count() > 2000 {
            msg.chars().take(2000).collect()
        } else {
            msg
        }
    }
}

/// Custom serialization for the output contract.
///
/// Produces JSON in the format:
/// ```json
/// { "error_type": "Validation", "message": "sha256 mismatch for page 4" }
/// ```
impl Serialize for CoreError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("CoreError", 2)?;
        state.serialize_field("error_type", self.error_type())?;
        state.serialize_field("message", &self.message())?;
        state.end()
    }
}

// ============================================================================
// From implementations for automatic error conversion
// ============================================================================

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => {
                CoreError::Storage(format!("File not found: {}", err))
            }
            std::io::ErrorKind::PermissionDenied => {
                CoreError::Storage(format!("Permission denied: {}", err))
            }
            std::io::ErrorKind::InvalidInput | std::io::ErrorKind::InvalidData => {
                CoreError::Validation(format!("Invalid data: {}", err))
            }
            _ => CoreError::Storage(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        match err.classify() {
            serde_json::error::Category::Io => {
                CoreError::Storage(format!("JSON I/O error: {}", err))
            }
            serde_json::error::Category::Syntax => {
                CoreError::Schema(format!("Invalid JSON syntax: {}", err))
            }
            serde_json::error::Category::Data => {
                CoreError::Schema(format!("Invalid JSON data: {}", err))
            }
            serde_json::error::Category::Eof => {
                CoreError::Schema(format!("Unexpected end of JSON: {}", err))
            }
        }
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => CoreError::Storage("Record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                CoreError::Storage(format!("Database error: {}", db_err))
            }
            sqlx::Error::Io(io_err) => {
                CoreError::Storage(format!("Database I/O error: {}", io_err))
            }
            sqlx::Error::Configuration(config_err) => {
                CoreError::Storage(format!("Database configuration error: {}", config_err))
            }
            _ => CoreError::Storage(err.to_string()),
        }
    }
}

// ============================================================================
// Convenience type alias
// ============================================================================

/// Result type alias using `CoreError`.
pub type CoreResult<T> = Result<T, CoreError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::Validation("sha256 mismatch".to_string());
        assert_eq!(err.to_string(), "Validation error: sha256 mismatch");

        let err = CoreError::Cancelled;
        assert_eq!(err.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_error_serialization() {
        let err = CoreError::Processing("OCR timed out".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"error_type\":\"Processing\""));
        assert!(json.contains("\"message\":\"OCR timed out\""));

        let err = CoreError::Cancelled;
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"error_type\":\"Cancelled\""));
        assert!(json.contains("\"message\":\"Operation cancelled\""));
    }

    #[test]
    fn test_error_type_classification() {
        assert_eq!(CoreError::Validation("x".into()).error_type(), "Validation");
        assert_eq!(CoreError::Processing("x".into()).error_type(), "Processing");
        assert_eq!(CoreError::Rendering("x".into()).error_type(), "Rendering");
        assert_eq!(CoreError::Storage("x".into()).error_type(), "Storage");
        assert_eq!(CoreError::Schema("x".into()).error_type(), "Schema");
        assert_eq!(CoreError::Cancelled.error_type(), "Cancelled");
        assert_eq!(CoreError::Unrecoverable("x".into()).error_type(), "Unrecoverable");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let core_err: CoreError = io_err.into();
        assert!(matches!(core_err, CoreError::Storage(_)));

        let io_err = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad bytes");
        let core_err: CoreError = io_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let core_err: CoreError = json_err.into();
        assert!(matches!(core_err, CoreError::Schema(_)));
    }

    #[test]
    fn test_truncated_message() {
        let long = "x".repeat(2500);
        let err = CoreError::Unrecoverable(long);
        assert_eq!(err.truncated_message().chars().count(), 2000);
    }
}
