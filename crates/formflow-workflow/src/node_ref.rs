use formflow_config::{NodeDef, NodeType};
use serde::{Deserialize, Serialize};

/// The kind of a workflow node, without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
  Trigger,
  Form,
  Noop,
}

impl From<&NodeType> for NodeKind {
  fn from(node_type: &NodeType) -> Self {
    match node_type {
      NodeType::Trigger(_) => NodeKind::Trigger,
      NodeType::Form(_) => NodeKind::Form,
      NodeType::Noop => NodeKind::Noop,
    }
  }
}

/// Lightweight descriptor of another node in the workflow.
///
/// Used for ancestor/descendant existence checks and to locate the trigger
/// whose parameters a form node inherits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNodeRef {
  pub name: String,
  pub kind: NodeKind,
  pub type_version: u32,
}

impl GraphNodeRef {
  pub fn new(name: impl Into<String>, kind: NodeKind, type_version: u32) -> Self {
    Self {
      name: name.into(),
      kind,
      type_version,
    }
  }
}

impl From<&NodeDef> for GraphNodeRef {
  fn from(node: &NodeDef) -> Self {
    Self {
      name: node.node_id.clone(),
      kind: NodeKind::from(&node.node_type),
      type_version: node.type_version,
    }
  }
}
