use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use formflow_form::{ItemBatch, RunState};
use serde::{Deserialize, Serialize};

/// Status of a form run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RunStatus {
  Running,
  /// Parked on a form node until a request arrives with the run's token.
  Waiting,
  Succeeded,
  Failed,
  Cancelled,
}

impl RunStatus {
  /// Whether the run can make no further progress.
  pub fn is_terminal(&self) -> bool {
    matches!(
      self,
      RunStatus::Succeeded | RunStatus::Failed | RunStatus::Cancelled
    )
  }
}

/// A node scheduled to run, with the items it will receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingNode {
  pub node_id: String,
  pub input: ItemBatch,
}

/// Everything the engine needs to pick a run back up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
  pub run_id: String,
  pub workflow_id: String,
  pub status: RunStatus,
  /// Form node state, including the waiting token and preserved batch.
  pub state: RunState,
  /// Nodes queued behind the one currently waiting.
  #[serde(default)]
  pub pending: VecDeque<PendingNode>,
  /// Output of every node that has finished, keyed by node id.
  #[serde(default)]
  pub outputs: HashMap<String, ItemBatch>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl RunRecord {
  pub fn new(run_id: impl Into<String>, workflow_id: impl Into<String>, state: RunState) -> Self {
    let now = Utc::now();
    Self {
      run_id: run_id.into(),
      workflow_id: workflow_id.into(),
      status: RunStatus::Running,
      state,
      pending: VecDeque::new(),
      outputs: HashMap::new(),
      error: None,
      created_at: now,
      updated_at: now,
    }
  }

  /// Token inbound requests for this run must present.
  pub fn resume_token(&self) -> Option<&str> {
    self.state.waiting_token.as_deref()
  }

  /// The form node the run is parked on, if any.
  pub fn waiting_node(&self) -> Option<&str> {
    self.state.waiting_node()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use formflow_config::RunMode;

  #[test]
  fn test_status_terminal() {
    assert!(!RunStatus::Waiting.is_terminal());
    assert!(!RunStatus::Running.is_terminal());
    assert!(RunStatus::Cancelled.is_terminal());
  }

  #[test]
  fn test_record_json_shape() {
    let mut state = RunState::new(RunMode::Test);
    state.waiting_token = Some("tok".to_string());
    let record = RunRecord::new("run-1", "wizard", state);

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["status"], "running");
    assert_eq!(json["state"]["waiting_token"], "tok");
    assert_eq!(record.resume_token(), Some("tok"));
  }
}
