use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::node::NodeDef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub workflow_id: String,
  pub name: String,
  #[serde(default)]
  pub settings: WorkflowSettings,
  pub nodes: Vec<NodeDef>,
  #[serde(default)]
  pub edges: Vec<Edge>,
}

/// Workflow-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSettings {
  /// Fixed UTC offset such as `"+02:00"`. Defaults to UTC.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timezone: Option<String>,
}
