//! Persisted run state.
//!
//! [`RunState`] is owned and persisted by the engine between invocations.
//! Form nodes read and write it only through the controller and the
//! [`DataAggregator`](crate::DataAggregator); nothing in it may be assumed to
//! survive in process memory.

use formflow_config::RunMode;
use serde::{Deserialize, Serialize};

use crate::item::ItemBatch;

/// Lifecycle phase of one form node instance.
///
/// Only `Suspended` is ever persisted. `Entered`, `Rendering`, `Submitting`
/// and `Completing` exist for the duration of a single call; `Resumed` is
/// reported to the engine and clears the instance slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Entered,
  Suspended,
  Rendering,
  Submitting,
  Completing,
  Resumed,
}

/// The instance currently parked in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSlot {
  pub node_id: String,
  pub phase: Phase,
  /// The input batch handed to the node when it was entered.
  pub preserved_batch: ItemBatch,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
  pub mode: RunMode,
  /// Token inbound requests must present while the run is parked.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub waiting_token: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub slot: Option<InstanceSlot>,
}

impl RunState {
  pub fn new(mode: RunMode) -> Self {
    Self {
      mode,
      waiting_token: None,
      slot: None,
    }
  }

  /// Phase of `node_id`, if it is the parked instance.
  pub fn phase_of(&self, node_id: &str) -> Option<Phase> {
    self
      .slot
      .as_ref()
      .filter(|slot| slot.node_id == node_id)
      .map(|slot| slot.phase)
  }

  /// The parked node, if any.
  pub fn waiting_node(&self) -> Option<&str> {
    self.slot.as_ref().map(|slot| slot.node_id.as_str())
  }
}
