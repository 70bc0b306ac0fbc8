use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FormError;

/// What a form node does once a request reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
  /// Show fields, capture a submission.
  Page,
  /// Show a closing screen and pass the entry batch through.
  Completion,
}

impl Operation {
  /// Interpret the operation string of `node_id`'s definition.
  pub fn parse(node_id: &str, raw: &str) -> Result<Self, FormError> {
    match raw {
      "page" => Ok(Operation::Page),
      "completion" => Ok(Operation::Completion),
      other => Err(FormError::UnrecognizedOperation {
        node_id: node_id.to_string(),
        operation: other.to_string(),
      }),
    }
  }
}

impl fmt::Display for Operation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Operation::Page => write!(f, "page"),
      Operation::Completion => write!(f, "completion"),
    }
  }
}
