use formflow_form::FormError;
use formflow_store::{RunStatus, StoreError};
use formflow_workflow::WorkflowError;

/// Errors from driving a run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  #[error("invalid workflow: {0}")]
  Workflow(#[from] WorkflowError),

  /// A node failed and took the run down with it.
  #[error("node '{node_id}' failed: {source}")]
  NodeFailed {
    node_id: String,
    #[source]
    source: FormError,
  },

  /// A page was sent a method it does not serve. The run is left parked.
  #[error("node '{node_id}' does not accept {method} requests")]
  MethodNotAllowed { node_id: String, method: String },

  #[error("run not found: {0}")]
  RunNotFound(String),

  /// No run of this workflow holds the token.
  #[error("no run holds token '{0}'")]
  TokenNotFound(String),

  #[error("run '{run_id}' is not waiting for input (status: {status:?})")]
  NotWaiting { run_id: String, status: RunStatus },

  #[error("storage error: {0}")]
  Store(#[from] StoreError),
}

impl EngineError {
  /// HTTP status reported to the requester.
  pub fn status_code(&self) -> u16 {
    match self {
      EngineError::RunNotFound(_) | EngineError::TokenNotFound(_) => 404,
      EngineError::MethodNotAllowed { .. } => 405,
      EngineError::NotWaiting { .. } => 409,
      EngineError::Workflow(_) | EngineError::NodeFailed { .. } | EngineError::Store(_) => 500,
    }
  }

  pub(crate) fn node_failed(source: FormError) -> Self {
    EngineError::NodeFailed {
      node_id: source.node_id().to_string(),
      source,
    }
  }
}
