//! Persistence adapter: an optional SQLite mirror of a run's evidence
//! graph, written through once rendering succeeds.
//!
//! A run is idempotent by `run_id`: persisting the same `run_id` twice
//! replaces every child row rather than appending duplicates, so retrying
//! a failed export never leaves two copies of the same citation behind.

pub mod schema;

use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use std::path::PathBuf;
use thiserror::Error;

use crate::model::{Citation, ClaimEdge, Document, Event, Gap, Page, Provider, Run, SourceDocument};

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Query error: {0}")]
    Query(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Everything a run needs persisted, gathered in one place so
/// [`Database::persist_run`] can write it inside one transaction.
pub struct RunGraph<'a> {
    pub run: &'a Run,
    pub source_documents: &'a [SourceDocument],
    pub pages: &'a [Page],
    pub documents: &'a [Document],
    pub providers: &'a [Provider],
    pub citations: &'a [Citation],
    pub events: &'a [Event],
    pub gaps: &'a [Gap],
    pub claim_edges: &'a [ClaimEdge],
}

/// SQLite connection pool plus the evidence-graph persistence API.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(db_path: PathBuf) -> DbResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .idle_timeout(std::time::Duration::from_secs(600))
            .connect(&db_url)
            .await?;

        sqlx::query("PRAGMA journal_mode = WAL;").execute(&pool).await?;
        sqlx::query("PRAGMA busy_timeout = 5000;").execute(&pool).await?;
        sqlx::query("PRAGMA synchronous = NORMAL;").execute(&pool).await?;
        sqlx::query("PRAGMA cache_size = -64000;").execute(&pool).await?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    async fn run_migrations(&self) -> DbResult<()> {
        sqlx::query(schema::CREATE_TABLES)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::Migration(e.to_string()))?;

        log::info!("Database migrations completed");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Deletes every row belonging to `run_id` across the run-child tables
    /// plus the `runs` row itself. Safe to call on a `run_id` that was
    /// never persisted.
    pub async fn clear_run(&self, run_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        for table in schema::RUN_CHILD_TABLES {
            sqlx::query(&format!("DELETE FROM {table} WHERE run_id = ?"))
                .bind(run_id)
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query("DELETE FROM runs WHERE run_id = ?")
            .bind(run_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Replaces the full evidence graph for `graph.run.run_id`: clears any
    /// prior rows for that run, then inserts the run and every child
    /// record inside a single transaction.
    pub async fn persist_run(&self, graph: &RunGraph<'_>) -> DbResult<()> {
        let run_id = graph.run.run_id.clone();
        self.clear_run(&run_id).await?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO runs (run_id, status, started_at, finished_at, config_json, metrics_json, warnings_json, provenance_json, error_message)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&run_id)
        .bind(serde_json::to_string(&graph.run.status)?)
        .bind(graph.run.started_at.to_rfc3339())
        .bind(graph.run.finished_at.map(|t| t.to_rfc3339()))
        .bind(serde_json::to_string(&graph.run.config)?)
        .bind(serde_json::to_string(&graph.run.metrics)?)
        .bind(serde_json::to_string(&graph.run.warnings)?)
        .bind(serde_json::to_string(&graph.run.provenance)?)
        .bind(&graph.run.error_message)
        .execute(&mut *tx)
        .await?;

        for doc in graph.source_documents {
            sqlx::query(
                "INSERT INTO source_documents (document_id, run_id, filename, mime_type, sha256, bytes, uploaded_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&doc.document_id)
            .bind(&run_id)
            .bind(&doc.filename)
            .bind(&doc.mime_type)
            .bind(&doc.sha256)
            .bind(doc.bytes as i64)
            .bind(doc.uploaded_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        for page in graph.pages {
            sqlx::query(
                "INSERT INTO pages (page_id, run_id, source_document_id, page_number, text, text_source, page_type, layout_json)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&page.page_id)
            .bind(&run_id)
            .bind(&page.source_document_id)
            .bind(page.page_number as i64)
            .bind(&page.text)
            .bind(serde_json::to_string(&page.text_source)?)
            .bind(serde_json::to_string(&page.page_type)?)
            .bind(page.layout.map(|l| serde_json::to_string(&l)).transpose()?)
            .execute(&mut *tx)
            .await?;
        }

        for document in graph.documents {
            sqlx::query(
                "INSERT INTO documents (document_id, run_id, source_document_id, page_start, page_end, page_types_json, declared_type, confidence)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&document.document_id)
            .bind(&run_id)
            .bind(&document.source_document_id)
            .bind(document.page_start as i64)
            .bind(document.page_end as i64)
            .bind(serde_json::to_string(&document.page_types)?)
            .bind(serde_json::to_string(&document.declared_type)?)
            .bind(document.confidence)
            .execute(&mut *tx)
            .await?;
        }

        for provider in graph.providers {
            sqlx::query(
                "INSERT INTO providers (provider_id, run_id, detected_name_raw, normalized_name, provider_type, confidence, evidence_json)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&provider.provider_id)
            .bind(&run_id)
            .bind(&provider.detected_name_raw)
            .bind(&provider.normalized_name)
            .bind(serde_json::to_string(&provider.provider_type)?)
            .bind(provider.confidence)
            .bind(serde_json::to_string(&provider.evidence)?)
            .execute(&mut *tx)
            .await?;
        }

        for citation in graph.citations {
            sqlx::query(
                "INSERT INTO citations (citation_id, run_id, source_document_id, page_number, snippet, bbox_json, text_hash)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&citation.citation_id)
            .bind(&run_id)
            .bind(&citation.source_document_id)
            .bind(citation.page_number as i64)
            .bind(&citation.snippet)
            .bind(serde_json::to_string(&citation.bbox)?)
            .bind(&citation.text_hash)
            .execute(&mut *tx)
            .await?;
        }

        for event in graph.events {
            sqlx::query(
                "INSERT INTO events (event_id, run_id, provider_id, event_type, date_json, encounter_type_raw, facts_json, diagnoses_json, procedures_json, imaging_json, billing_json, confidence, flags_json, citation_ids_json, source_page_numbers_json, extensions_json)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&event.event_id)
            .bind(&run_id)
            .bind(&event.provider_id)
            .bind(serde_json::to_string(&event.event_type)?)
            .bind(serde_json::to_string(&event.date)?)
            .bind(&event.encounter_type_raw)
            .bind(serde_json::to_string(&event.facts)?)
            .bind(serde_json::to_string(&event.diagnoses)?)
            .bind(serde_json::to_string(&event.procedures)?)
            .bind(event.imaging.as_ref().map(serde_json::to_string).transpose()?)
            .bind(event.billing.as_ref().map(serde_json::to_string).transpose()?)
            .bind(event.confidence)
            .bind(serde_json::to_string(&event.flags)?)
            .bind(serde_json::to_string(&event.citation_ids)?)
            .bind(serde_json::to_string(&event.source_page_numbers)?)
            .bind(serde_json::to_string(&event.extensions)?)
            .execute(&mut *tx)
            .await?;
        }

        for gap in graph.gaps {
            sqlx::query(
                "INSERT INTO gaps (gap_id, run_id, start_date, end_date, duration_days, threshold_days, confidence, related_event_ids_json, rationale, patient_label)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&gap.gap_id)
            .bind(&run_id)
            .bind(gap.start_date.to_string())
            .bind(gap.end_date.to_string())
            .bind(gap.duration_days)
            .bind(gap.threshold_days)
            .bind(gap.confidence)
            .bind(serde_json::to_string(&gap.related_event_ids)?)
            .bind(serde_json::to_string(&gap.rationale)?)
            .bind(&gap.patient_label)
            .execute(&mut *tx)
            .await?;
        }

        for edge in graph.claim_edges {
            sqlx::query(
                "INSERT INTO claim_edges (id, run_id, event_id, claim_type, support_score, materiality_weight, body_json)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&edge.id)
            .bind(&run_id)
            .bind(&edge.event_id)
            .bind(serde_json::to_string(&edge.claim_type)?)
            .bind(edge.support_score)
            .bind(edge.materiality_weight)
            .bind(serde_json::to_string(edge)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        log::info!("Persisted run {} ({} events, {} pages)", run_id, graph.events.len(), graph.pages.len());
        Ok(())
    }

    pub async fn record_artifact(&self, run_id: &str, name: &str, sha256: &str, bytes: u64, path: &str) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO artifacts (run_id, name, sha256, bytes, path) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(run_id, name) DO UPDATE SET sha256 = excluded.sha256, bytes = excluded.bytes, path = excluded.path",
        )
        .bind(run_id)
        .bind(name)
        .bind(sha256)
        .bind(bytes as i64)
        .bind(path)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// True if a `runs` row already exists for `run_id` (used by the
    /// orchestrator to decide whether a re-invocation is a retry).
    pub async fn run_exists(&self, run_id: &str) -> DbResult<bool> {
        let row = sqlx::query("SELECT 1 FROM runs WHERE run_id = ?")
            .bind(run_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn load_run_status(&self, run_id: &str) -> DbResult<Option<String>> {
        let row = sqlx::query("SELECT status FROM runs WHERE run_id = ?")
            .bind(run_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>("status")))
    }
}
