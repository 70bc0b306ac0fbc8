//! Formflow Store
//!
//! This crate provides the storage trait and implementations for form runs.
//! A run parked on a form node may wait for days, across process restarts,
//! so everything the engine needs to continue it lives in a [`RunRecord`].
//!
//! Records are serialized to JSON on every save. Nothing read back from a
//! store shares identity with what was written.
//!
//! The [`RunStore`] trait defines operations for:
//! - Saving (inserting or replacing) run records
//! - Looking runs up by id or by waiting token
//! - Listing a workflow's runs

mod memory;
mod sqlite;
mod types;

pub use memory::InMemoryRunStore;
pub use sqlite::SqliteRunStore;
pub use types::{PendingNode, RunRecord, RunStatus};

use async_trait::async_trait;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// The requested record was not found.
  #[error("not found: {0}")]
  NotFound(String),

  /// A record could not be converted to or from its stored form.
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),
}

/// Storage trait for form runs.
#[async_trait]
pub trait RunStore: Send + Sync {
  /// Insert a run, or replace the stored copy.
  async fn save_run(&self, record: &RunRecord) -> Result<(), StoreError>;

  /// Get a run by ID.
  async fn get_run(&self, run_id: &str) -> Result<RunRecord, StoreError>;

  /// Find the run holding `token`, whatever its status.
  async fn find_by_token(&self, token: &str) -> Result<Option<RunRecord>, StoreError>;

  /// List runs of a workflow, oldest first.
  async fn list_runs(&self, workflow_id: &str) -> Result<Vec<RunRecord>, StoreError>;
}
