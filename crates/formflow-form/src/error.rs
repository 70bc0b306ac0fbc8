//! Form node error types.

/// Broad classification of a [`FormError`], used by hosts to decide who
/// needs to hear about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The workflow graph is misconfigured. Raised at entry, before any end
  /// user sees a form.
  Structural,
  /// The submitted data did not satisfy the declared fields.
  Capture,
  /// The node definition or the call sequence does not match this node
  /// version.
  Configuration,
}

/// Errors raised by a form node. All of them are fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
  /// No form trigger is reachable upstream of the node.
  #[error("node '{node_id}': a form trigger must be set before this node")]
  MissingTrigger { node_id: String },

  /// A completion node has further form nodes after it.
  #[error("node '{node_id}': completion has to be the last form node in the workflow")]
  NonTerminalCompletion { node_id: String },

  /// The node declares an operation this version does not know.
  #[error("node '{node_id}': unrecognized operation '{operation}'")]
  UnrecognizedOperation { node_id: String, operation: String },

  /// The node's parameters could not be read.
  #[error("node '{node_id}': invalid parameters: {message}")]
  InvalidParameters { node_id: String, message: String },

  /// A required field was absent or empty in the submission.
  #[error("node '{node_id}': required field '{field}' is missing")]
  MissingRequiredField { node_id: String, field: String },

  /// A submitted value could not be coerced to its field kind.
  #[error("node '{node_id}': invalid value for field '{field}': {message}")]
  InvalidFieldValue {
    node_id: String,
    field: String,
    message: String,
  },

  /// The inbound request method has no transition for this node.
  #[error("node '{node_id}': method {method} is not allowed for operation '{operation}'")]
  MethodNotAllowed {
    node_id: String,
    method: String,
    operation: String,
  },

  /// A resume candidate arrived for an instance that is not suspended.
  #[error("node '{node_id}' is not suspended")]
  NotSuspended { node_id: String },

  /// The batch preserved at entry is missing from the run state.
  #[error("node '{node_id}': no batch was preserved at entry")]
  MissingPreservedBatch { node_id: String },

  /// A document template failed to render.
  #[error("node '{node_id}': failed to render document: {message}")]
  Render { node_id: String, message: String },
}

impl FormError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      FormError::MissingTrigger { .. } | FormError::NonTerminalCompletion { .. } => {
        ErrorKind::Structural
      }
      FormError::MissingRequiredField { .. } | FormError::InvalidFieldValue { .. } => {
        ErrorKind::Capture
      }
      FormError::UnrecognizedOperation { .. }
      | FormError::InvalidParameters { .. }
      | FormError::MethodNotAllowed { .. }
      | FormError::NotSuspended { .. }
      | FormError::MissingPreservedBatch { .. }
      | FormError::Render { .. } => ErrorKind::Configuration,
    }
  }

  /// Node the error was raised for.
  pub fn node_id(&self) -> &str {
    match self {
      FormError::MissingTrigger { node_id }
      | FormError::NonTerminalCompletion { node_id }
      | FormError::UnrecognizedOperation { node_id, .. }
      | FormError::InvalidParameters { node_id, .. }
      | FormError::MissingRequiredField { node_id, .. }
      | FormError::InvalidFieldValue { node_id, .. }
      | FormError::MethodNotAllowed { node_id, .. }
      | FormError::NotSuspended { node_id }
      | FormError::MissingPreservedBatch { node_id }
      | FormError::Render { node_id, .. } => node_id,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_kinds() {
    let structural = FormError::MissingTrigger {
      node_id: "step1".to_string(),
    };
    assert_eq!(structural.kind(), ErrorKind::Structural);
    assert_eq!(structural.node_id(), "step1");

    let capture = FormError::MissingRequiredField {
      node_id: "step1".to_string(),
      field: "name".to_string(),
    };
    assert_eq!(capture.kind(), ErrorKind::Capture);

    let config = FormError::UnrecognizedOperation {
      node_id: "step1".to_string(),
      operation: "wizard".to_string(),
    };
    assert_eq!(config.kind(), ErrorKind::Configuration);
    assert_eq!(
      config.to_string(),
      "node 'step1': unrecognized operation 'wizard'"
    );
  }
}
