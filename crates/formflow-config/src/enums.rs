use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a run was started from the editor (test) or a live trigger.
///
/// The mode is cosmetic for form nodes: it only changes what the rendered
/// document shows and the `formMode` recorded on captured items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
  Test,
  #[default]
  Production,
}

impl fmt::Display for RunMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RunMode::Test => write!(f, "test"),
      RunMode::Production => write!(f, "production"),
    }
  }
}

/// The declared kind of a form field. Submitted values are coerced to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
  #[default]
  Text,
  Number,
  Email,
  Password,
  Textarea,
  Date,
  Datetime,
  Dropdown,
  File,
}

impl FieldKind {
  /// The HTML input type used when rendering this field.
  pub fn input_type(&self) -> &'static str {
    match self {
      FieldKind::Text => "text",
      FieldKind::Number => "number",
      FieldKind::Email => "email",
      FieldKind::Password => "password",
      FieldKind::Textarea => "textarea",
      FieldKind::Date => "date",
      FieldKind::Datetime => "datetime-local",
      FieldKind::Dropdown => "select",
      FieldKind::File => "file",
    }
  }
}
