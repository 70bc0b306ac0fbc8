use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("node not found: {0}")]
  NodeNotFound(String),

  #[error("duplicate node id: {0}")]
  DuplicateNode(String),

  #[error("edge references unknown node: from={from}, to={to}")]
  InvalidEdge { from: String, to: String },

  #[error("no entry points found (all nodes have incoming edges)")]
  NoEntryPoints,

  #[error("workflow graph contains a cycle through node '{0}'")]
  Cycle(String),

  #[error("node '{node_id}' declares field key '{key}' more than once")]
  DuplicateFieldKey { node_id: String, key: String },

  #[error("invalid workflow timezone '{0}': expected a UTC offset such as +02:00")]
  InvalidTimezone(String),
}
