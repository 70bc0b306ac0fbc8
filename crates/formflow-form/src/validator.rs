//! Graph shape checks run when a form node is entered.

use formflow_workflow::{GraphNodeRef, NodeKind};

use crate::error::FormError;
use crate::operation::Operation;

/// Checks a form node's position in the workflow before it suspends, so a
/// misconfigured workflow fails immediately instead of parking forever.
pub struct GraphValidator;

impl GraphValidator {
  pub fn validate(
    node: &GraphNodeRef,
    operation: Operation,
    ancestors: &[GraphNodeRef],
    descendants: &[GraphNodeRef],
  ) -> Result<(), FormError> {
    if Self::find_trigger(ancestors).is_none() {
      return Err(FormError::MissingTrigger {
        node_id: node.name.clone(),
      });
    }

    if operation == Operation::Completion && descendants.iter().any(|d| d.kind == node.kind) {
      return Err(FormError::NonTerminalCompletion {
        node_id: node.name.clone(),
      });
    }

    Ok(())
  }

  /// The nearest trigger among `ancestors`.
  pub fn find_trigger(ancestors: &[GraphNodeRef]) -> Option<&GraphNodeRef> {
    ancestors.iter().find(|a| a.kind == NodeKind::Trigger)
  }

  /// Whether another form node follows this one.
  pub fn has_next_page(node: &GraphNodeRef, descendants: &[GraphNodeRef]) -> bool {
    descendants.iter().any(|d| d.kind == node.kind)
  }
}
