use serde::{Deserialize, Serialize};

use crate::field::FieldSpec;
use crate::options::{NodeOptions, TriggerOptions};

fn default_type_version() -> u32 {
  1
}

fn default_operation() -> String {
  "page".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
  pub node_id: String,
  /// Declared version of the node type. Some defaults are gated on it.
  #[serde(default = "default_type_version")]
  pub type_version: u32,
  #[serde(flatten)]
  pub node_type: NodeType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeType {
  /// A form trigger that starts a run from an initial submission.
  Trigger(TriggerParams),
  /// A form page or completion screen.
  Form(FormParams),
  /// Forwards its input unchanged.
  Noop,
}

/// Parameters of a form trigger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerParams {
  #[serde(default)]
  pub title: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default)]
  pub options: TriggerOptions,
}

/// Parameters of a form node.
///
/// `operation` is kept as written in the definition ("page" or "completion")
/// and interpreted each time the node runs, so a definition written for a
/// newer node version fails loudly instead of being misread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormParams {
  #[serde(default = "default_operation")]
  pub operation: String,
  #[serde(default)]
  pub fields: Vec<FieldSpec>,
  #[serde(default)]
  pub options: NodeOptions,
}

impl Default for FormParams {
  fn default() -> Self {
    Self {
      operation: default_operation(),
      fields: Vec::new(),
      options: NodeOptions::default(),
    }
  }
}

impl NodeDef {
  pub fn trigger(node_id: impl Into<String>, type_version: u32, params: TriggerParams) -> Self {
    Self {
      node_id: node_id.into(),
      type_version,
      node_type: NodeType::Trigger(params),
    }
  }

  pub fn form(node_id: impl Into<String>, params: FormParams) -> Self {
    Self {
      node_id: node_id.into(),
      type_version: default_type_version(),
      node_type: NodeType::Form(params),
    }
  }

  pub fn noop(node_id: impl Into<String>) -> Self {
    Self {
      node_id: node_id.into(),
      type_version: default_type_version(),
      node_type: NodeType::Noop,
    }
  }
}
