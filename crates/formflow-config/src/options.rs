use serde::{Deserialize, Serialize};

/// Cosmetic overrides on a form node.
///
/// Every option is optional. Unset or empty options fall back to the upstream
/// trigger's parameters, then to a hard default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeOptions {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub button_label: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub completion_title: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub completion_message: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub append_attribution: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub use_workflow_timezone: Option<bool>,
}

/// Options owned by a form trigger and inherited by downstream form pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerOptions {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub button_label: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub append_attribution: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub use_workflow_timezone: Option<bool>,
}
