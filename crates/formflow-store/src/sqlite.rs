use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, SqlitePool};

use crate::{RunRecord, RunStore, StoreError};

/// SQLite-based store implementation.
pub struct SqliteRunStore {
  pool: SqlitePool,
}

/// A run as stored in the `form_runs` table. The other columns duplicate
/// lookup fields out of the serialized record.
#[derive(Debug, FromRow)]
struct RunRow {
  record: String,
}

impl TryFrom<RunRow> for RunRecord {
  type Error = StoreError;

  fn try_from(row: RunRow) -> Result<Self, Self::Error> {
    Ok(serde_json::from_str(&row.record)?)
  }
}

impl SqliteRunStore {
  /// Create a new SQLite store with the given connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Open (creating if needed) the database file at `path` and migrate it.
  pub async fn connect(path: &Path) -> Result<Self, StoreError> {
    let options = SqliteConnectOptions::new()
      .filename(path)
      .create_if_missing(true);
    let store = Self::new(SqlitePool::connect_with(options).await?);
    store.migrate().await?;
    Ok(store)
  }

  /// Create the `form_runs` table if it does not exist.
  pub async fn migrate(&self) -> Result<(), StoreError> {
    sqlx::query(
      r#"
      CREATE TABLE IF NOT EXISTS form_runs (
        run_id TEXT PRIMARY KEY NOT NULL,
        workflow_id TEXT NOT NULL,
        resume_token TEXT,
        status TEXT NOT NULL,
        record TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
      )
      "#,
    )
    .execute(&self.pool)
    .await?;

    sqlx::query(
      "CREATE INDEX IF NOT EXISTS form_runs_resume_token ON form_runs (resume_token)",
    )
    .execute(&self.pool)
    .await?;

    Ok(())
  }
}

#[async_trait]
impl RunStore for SqliteRunStore {
  async fn save_run(&self, record: &RunRecord) -> Result<(), StoreError> {
    let raw = serde_json::to_string(record)?;

    sqlx::query(
      r#"
      INSERT INTO form_runs (run_id, workflow_id, resume_token, status, record, created_at, updated_at)
      VALUES (?, ?, ?, ?, ?, ?, ?)
      ON CONFLICT (run_id) DO UPDATE SET
        resume_token = excluded.resume_token,
        status = excluded.status,
        record = excluded.record,
        updated_at = excluded.updated_at
      "#,
    )
    .bind(&record.run_id)
    .bind(&record.workflow_id)
    .bind(record.resume_token())
    .bind(record.status)
    .bind(raw)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn get_run(&self, run_id: &str) -> Result<RunRecord, StoreError> {
    let row: Option<RunRow> =
      sqlx::query_as("SELECT record FROM form_runs WHERE run_id = ?")
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await?;

    row
      .ok_or_else(|| StoreError::NotFound(format!("run '{}'", run_id)))?
      .try_into()
  }

  async fn find_by_token(&self, token: &str) -> Result<Option<RunRecord>, StoreError> {
    let row: Option<RunRow> =
      sqlx::query_as("SELECT record FROM form_runs WHERE resume_token = ?")
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

    row.map(RunRecord::try_from).transpose()
  }

  async fn list_runs(&self, workflow_id: &str) -> Result<Vec<RunRecord>, StoreError> {
    let rows: Vec<RunRow> = sqlx::query_as(
      r#"
      SELECT record
      FROM form_runs
      WHERE workflow_id = ?
      ORDER BY created_at ASC, run_id ASC
      "#,
    )
    .bind(workflow_id)
    .fetch_all(&self.pool)
    .await?;

    rows.into_iter().map(RunRecord::try_from).collect()
  }
}
