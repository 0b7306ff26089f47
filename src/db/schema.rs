//! SQLite schema for the evidence graph.
//!
//! Every table is scoped by `run_id` and stores its structured fields as a
//! single JSON column (the model types already round-trip through serde),
//! mirroring how the original schema kept a `metadata TEXT DEFAULT '{}'`
//! column alongside a handful of indexed scalar fields rather than
//! normalizing every nested shape into its own table. `run_id` cascades on
//! delete so [`super::Database::replace_run_children`] can clear a prior
//! attempt's rows with one statement per table.

#[allow(unused_imports)]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// SQL to create all tables, run once at startup.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS runs (
    run_id TEXT PRIMARY KEY,
    status TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_json TEXT NOT NULL DEFAULT '{}',
    metrics_json TEXT NOT NULL DEFAULT '{}',
    warnings_json TEXT NOT NULL DEFAULT '[]',
    provenance_json TEXT NOT NULL DEFAULT '{}',
    error_message TEXT
);

CREATE TABLE IF NOT EXISTS source_documents (
    document_id TEXT PRIMARY KEY,
    run_id TEXT NOT NULL REFERENCES runs(run_id) ON DELETE CASCADE,
    filename TEXT NOT NULL,
    mime_type TEXT NOT NULL,
    sha256 TEXT NOT NULL,
    bytes INTEGER NOT NULL,
    uploaded_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pages (
    page_id TEXT PRIMARY KEY,
    run_id TEXT NOT NULL REFERENCES runs(run_id) ON DELETE CASCADE,
    source_document_id TEXT NOT NULL,
    page_number INTEGER NOT NULL,
    text TEXT NOT NULL,
    text_source TEXT NOT NULL,
    page_type TEXT NOT NULL,
    layout_json TEXT
);

CREATE TABLE IF NOT EXISTS documents (
    document_id TEXT PRIMARY KEY,
    run_id TEXT NOT NULL REFERENCES runs(run_id) ON DELETE CASCADE,
    source_document_id TEXT NOT NULL,
    page_start INTEGER NOT NULL,
    page_end INTEGER NOT NULL,
    page_types_json TEXT NOT NULL DEFAULT '[]',
    declared_type TEXT NOT NULL,
    confidence INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS providers (
    provider_id TEXT PRIMARY KEY,
    run_id TEXT NOT NULL REFERENCES runs(run_id) ON DELETE CASCADE,
    detected_name_raw TEXT NOT NULL,
    normalized_name TEXT NOT NULL,
    provider_type TEXT NOT NULL,
    confidence INTEGER NOT NULL,
    evidence_json TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS citations (
    citation_id TEXT PRIMARY KEY,
    run_id TEXT NOT NULL REFERENCES runs(run_id) ON DELETE CASCADE,
    source_document_id TEXT NOT NULL,
    page_number INTEGER NOT NULL,
    snippet TEXT NOT NULL,
    bbox_json TEXT NOT NULL DEFAULT '{}',
    text_hash TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    event_id TEXT PRIMARY KEY,
    run_id TEXT NOT NULL REFERENCES runs(run_id) ON DELETE CASCADE,
    provider_id TEXT,
    event_type TEXT NOT NULL,
    date_json TEXT NOT NULL,
    encounter_type_raw TEXT,
    facts_json TEXT NOT NULL DEFAULT '[]',
    diagnoses_json TEXT NOT NULL DEFAULT '[]',
    procedures_json TEXT NOT NULL DEFAULT '[]',
    imaging_json TEXT,
    billing_json TEXT,
    confidence INTEGER NOT NULL,
    flags_json TEXT NOT NULL DEFAULT '[]',
    citation_ids_json TEXT NOT NULL DEFAULT '[]',
    source_page_numbers_json TEXT NOT NULL DEFAULT '[]',
    extensions_json TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS gaps (
    gap_id TEXT PRIMARY KEY,
    run_id TEXT NOT NULL REFERENCES runs(run_id) ON DELETE CASCADE,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    duration_days INTEGER NOT NULL,
    threshold_days INTEGER NOT NULL,
    confidence INTEGER NOT NULL,
    related_event_ids_json TEXT NOT NULL,
    rationale TEXT NOT NULL,
    patient_label TEXT
);

CREATE TABLE IF NOT EXISTS claim_edges (
    id TEXT PRIMARY KEY,
    run_id TEXT NOT NULL REFERENCES runs(run_id) ON DELETE CASCADE,
    event_id TEXT NOT NULL,
    claim_type TEXT NOT NULL,
    support_score INTEGER NOT NULL,
    materiality_weight INTEGER NOT NULL,
    body_json TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS artifacts (
    run_id TEXT NOT NULL REFERENCES runs(run_id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    sha256 TEXT NOT NULL,
    bytes INTEGER NOT NULL,
    path TEXT NOT NULL,
    PRIMARY KEY (run_id, name)
);

CREATE INDEX IF NOT EXISTS idx_pages_run ON pages(run_id);
CREATE INDEX IF NOT EXISTS idx_events_run ON events(run_id);
CREATE INDEX IF NOT EXISTS idx_citations_run ON citations(run_id);
"#;

/// The list of tables whose rows are entirely owned by one run, in an order
/// safe for deletion before a fresh insert (children before nothing in
/// particular here, since all are leaves off `runs`).
pub const RUN_CHILD_TABLES: &[&str] = &[
    "source_documents",
    "pages",
    "documents",
    "providers",
    "citations",
    "events",
    "gaps",
    "claim_edges",
    "artifacts",
];

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RunRow {
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_json: String,
    pub metrics_json: String,
    pub warnings_json: String,
    pub provenance_json: String,
    pub error_message: Option<String>,
}
