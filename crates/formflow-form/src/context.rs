//! What a form node needs from the engine running it.

use chrono::{DateTime, FixedOffset, Utc};
use formflow_config::{FormParams, RunMode};
use formflow_workflow::GraphNodeRef;

use crate::error::FormError;
use crate::item::ItemBatch;

/// Engine services available to a form node during one invocation.
///
/// Implementations are built fresh for every call. Parameters in particular
/// must be read from the workflow definition each time, not cached on the
/// node across a suspension.
pub trait NodeContext {
  /// Descriptor of the node being invoked.
  fn node(&self) -> &GraphNodeRef;

  /// The node's current form parameters.
  fn parameters(&self) -> Result<FormParams, FormError>;

  /// All upstream nodes, nearest first.
  fn ancestors(&self) -> Vec<GraphNodeRef>;

  /// All downstream nodes, nearest first.
  fn descendants(&self) -> Vec<GraphNodeRef>;

  /// Parameters of another node as JSON, for expression lookups.
  fn node_parameters(&self, node_id: &str) -> Option<serde_json::Value>;

  /// Items delivered to the node on this arrival. Empty outside `enter`.
  fn input_batch(&self) -> ItemBatch;

  fn run_mode(&self) -> RunMode;

  /// URL the run can be resumed at, once the engine has assigned a token.
  fn resume_url(&self) -> Option<String>;

  fn timezone(&self) -> FixedOffset;

  fn now(&self) -> DateTime<Utc>;

  fn node_id(&self) -> &str {
    &self.node().name
  }
}
