use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use serde::Serialize;
use tracing::debug;

use crate::model::MetricsReportManifest;
use crate::util::ensure_directory;

/// SQLite history of collected reports.
pub struct HistoryStore {
    connection: Connection,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredRun {
    pub id: i64,
    pub run_id: String,
    pub generated_at: String,
    pub model_config_checksum: String,
    pub embedding_model_id: String,
    pub detector_model_id: String,
    pub failed_count: i64,
    pub duration_ms: i64,
    pub scores: Vec<StoredScore>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredScore {
    pub key: String,
    /// `None` for a non-finite sentinel.
    pub score: Option<f64>,
    pub status: String,
    pub error: Option<String>,
}

impl HistoryStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_directory(parent)?;
            }
        }

        let connection = Connection::open(db_path)
            .with_context(|| format!("failed to open history database: {}", db_path.display()))?;
        connection
            .pragma_update(None, "journal_mode", "WAL")
            .context("failed to set journal_mode=WAL")?;
        connection
            .pragma_update(None, "synchronous", "NORMAL")
            .context("failed to set synchronous=NORMAL")?;

        Self::with_connection(connection)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().context("failed to open in-memory history")?;
        Self::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<Self> {
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    /// Stores one report with all its entries; returns the new row id.
    pub fn record_report(&mut self, manifest: &MetricsReportManifest) -> Result<i64> {
        let tx = self
            .connection
            .transaction()
            .context("failed to start history transaction")?;

        tx.execute(
            "
            INSERT INTO metric_runs(
              run_id, generated_at, model_config_checksum, embedding_model_id,
              detector_model_id, failed_count, duration_ms
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                manifest.run_id,
                manifest.generated_at,
                manifest.model_config_checksum,
                manifest.model_config.embedding_model_id,
                manifest.model_config.detector_model_id,
                manifest.failed_count as i64,
                manifest.duration_ms as i64,
            ],
        )?;
        let row_id = tx.last_insert_rowid();

        {
            let mut statement = tx.prepare(
                "
                INSERT INTO metric_scores(
                  run_row_id, key, metric, role, score, status, error, duration_ms
                )
                VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ",
            )?;
            for entry in &manifest.entries {
                statement.execute(params![
                    row_id,
                    entry.key,
                    entry.metric,
                    entry.role,
                    entry.score.is_finite().then_some(entry.score),
                    entry.status,
                    entry.error,
                    entry.duration_ms as i64,
                ])?;
            }
        }

        tx.commit().context("failed to commit history transaction")?;
        debug!(run_id = %manifest.run_id, row_id, entries = manifest.entries.len(), "recorded report history");
        Ok(row_id)
    }

    /// Newest first, optionally restricted to one run id.
    pub fn recent_runs(&self, run_id: Option<&str>, limit: usize) -> Result<Vec<StoredRun>> {
        let mut statement = self.connection.prepare(
            "
            SELECT id, run_id, generated_at, model_config_checksum,
                   COALESCE(embedding_model_id, ''), COALESCE(detector_model_id, ''),
                   failed_count, duration_ms
            FROM metric_runs
            WHERE ?1 IS NULL OR run_id = ?1
            ORDER BY generated_at DESC, id DESC
            LIMIT ?2
            ",
        )?;

        let mut rows = statement.query(params![run_id, limit as i64])?;
        let mut runs = Vec::<StoredRun>::new();
        while let Some(row) = rows.next()? {
            runs.push(StoredRun {
                id: row.get(0)?,
                run_id: row.get(1)?,
                generated_at: row.get(2)?,
                model_config_checksum: row.get(3)?,
                embedding_model_id: row.get(4)?,
                detector_model_id: row.get(5)?,
                failed_count: row.get(6)?,
                duration_ms: row.get(7)?,
                scores: Vec::new(),
            });
        }

        for run in &mut runs {
            run.scores = self.run_scores(run.id)?;
        }
        Ok(runs)
    }

    fn run_scores(&self, run_row_id: i64) -> Result<Vec<StoredScore>> {
        let mut statement = self.connection.prepare(
            "
            SELECT key, score, status, error
            FROM metric_scores
            WHERE run_row_id = ?1
            ORDER BY rowid ASC
            ",
        )?;

        let mut rows = statement.query(params![run_row_id])?;
        let mut scores = Vec::<StoredScore>::new();
        while let Some(row) = rows.next()? {
            scores.push(StoredScore {
                key: row.get(0)?,
                score: row.get(1)?,
                status: row.get(2)?,
                error: row.get(3)?,
            });
        }
        Ok(scores)
    }
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metric_runs (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              run_id TEXT NOT NULL,
              generated_at TEXT NOT NULL,
              model_config_checksum TEXT NOT NULL,
              embedding_model_id TEXT,
              detector_model_id TEXT,
              failed_count INTEGER NOT NULL DEFAULT 0,
              duration_ms INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS metric_scores (
              run_row_id INTEGER NOT NULL,
              key TEXT NOT NULL,
              metric TEXT NOT NULL,
              role TEXT,
              score REAL,
              status TEXT NOT NULL,
              error TEXT,
              duration_ms INTEGER NOT NULL DEFAULT 0,
              PRIMARY KEY(run_row_id, key),
              FOREIGN KEY(run_row_id) REFERENCES metric_runs(id)
            );

            CREATE INDEX IF NOT EXISTS idx_metric_runs_run_id
              ON metric_runs(run_id, generated_at);
            ",
        )
        .context("failed to create history schema")
}
