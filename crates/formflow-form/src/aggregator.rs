//! Carries a node's entry batch across its own suspension.

use tracing::debug;

use crate::error::FormError;
use crate::item::ItemBatch;
use crate::state::{InstanceSlot, Phase, RunState};

/// Keeps the items present when a node is entered available until the same
/// node completes.
///
/// The batch lives in the persisted [`RunState`], never in the node value,
/// so a completion request served by a different process (or after a
/// restart) still sees it. Threading items across distinct node instances is
/// ordinary data flow and not handled here.
pub struct DataAggregator;

impl DataAggregator {
  /// Park `node_id` with `batch` as its preserved input.
  ///
  /// A slot left by a previous instance is replaced: only one instance of a
  /// run can be waiting at a time.
  pub fn preserve(state: &mut RunState, node_id: &str, batch: ItemBatch) {
    debug!(node_id, items = batch.len(), "preserving entry batch");
    state.slot = Some(InstanceSlot {
      node_id: node_id.to_string(),
      phase: Phase::Suspended,
      preserved_batch: batch,
    });
  }

  /// Read the batch preserved for `node_id` without releasing it.
  pub fn restore(state: &RunState, node_id: &str) -> Result<ItemBatch, FormError> {
    state
      .slot
      .as_ref()
      .filter(|slot| slot.node_id == node_id)
      .map(|slot| slot.preserved_batch.clone())
      .ok_or_else(|| FormError::MissingPreservedBatch {
        node_id: node_id.to_string(),
      })
  }

  /// Clear the slot once its instance has resumed.
  pub fn release(state: &mut RunState) -> Option<InstanceSlot> {
    state.slot.take()
  }
}
