use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{RunRecord, RunStore, StoreError};

/// Process-local store. Records are kept serialized, as a database would
/// keep them.
#[derive(Default)]
pub struct InMemoryRunStore {
  runs: RwLock<HashMap<String, String>>,
}

impl InMemoryRunStore {
  pub fn new() -> Self {
    Self::default()
  }

  async fn decode_all(&self) -> Result<Vec<RunRecord>, StoreError> {
    let runs = self.runs.read().await;
    runs
      .values()
      .map(|raw| serde_json::from_str(raw).map_err(StoreError::from))
      .collect()
  }
}

#[async_trait]
impl RunStore for InMemoryRunStore {
  async fn save_run(&self, record: &RunRecord) -> Result<(), StoreError> {
    let raw = serde_json::to_string(record)?;
    self.runs.write().await.insert(record.run_id.clone(), raw);
    Ok(())
  }

  async fn get_run(&self, run_id: &str) -> Result<RunRecord, StoreError> {
    let runs = self.runs.read().await;
    let raw = runs
      .get(run_id)
      .ok_or_else(|| StoreError::NotFound(format!("run '{}'", run_id)))?;
    Ok(serde_json::from_str(raw)?)
  }

  async fn find_by_token(&self, token: &str) -> Result<Option<RunRecord>, StoreError> {
    Ok(
      self
        .decode_all()
        .await?
        .into_iter()
        .find(|record| record.resume_token() == Some(token)),
    )
  }

  async fn list_runs(&self, workflow_id: &str) -> Result<Vec<RunRecord>, StoreError> {
    let mut runs: Vec<RunRecord> = self
      .decode_all()
      .await?
      .into_iter()
      .filter(|record| record.workflow_id == workflow_id)
      .collect();
    runs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.run_id.cmp(&b.run_id)));
    Ok(runs)
  }
}
