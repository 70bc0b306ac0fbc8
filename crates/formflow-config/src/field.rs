use serde::{Deserialize, Serialize};

use crate::enums::FieldKind;

/// A single input field on a form page.
///
/// `key` names the value in the captured item and must be unique within one
/// node's field list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
  pub key: String,
  pub label: String,
  #[serde(default)]
  pub kind: FieldKind,
  #[serde(default)]
  pub required: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_value: Option<serde_json::Value>,
  /// Choices offered by a dropdown field.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub options: Vec<String>,
  /// Dropdowns only: allow several choices, captured as an array.
  #[serde(default)]
  pub multiselect: bool,
  /// Dates only: strftime pattern applied to the submitted `YYYY-MM-DD` value.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub format_date: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub placeholder: Option<String>,
}

impl FieldSpec {
  pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
    Self {
      key: key.into(),
      label: label.into(),
      kind,
      required: false,
      default_value: None,
      options: Vec::new(),
      multiselect: false,
      format_date: None,
      placeholder: None,
    }
  }

  pub fn required(mut self) -> Self {
    self.required = true;
    self
  }
}
