//! Run events and notifiers for observability.
//!
//! Events are emitted as a run moves through its nodes and suspensions, so
//! consumers can persist history, stream progress to a UI, etc.

use formflow_form::ItemBatch;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted while driving a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// A run has been created from a trigger payload.
  RunStarted { run_id: String, workflow_id: String },

  /// A node has been handed its input.
  NodeStarted { run_id: String, node_id: String },

  /// A node has produced its output.
  NodeCompleted {
    run_id: String,
    node_id: String,
    output: ItemBatch,
  },

  /// A node has failed. The run fails with it.
  NodeFailed {
    run_id: String,
    node_id: String,
    error: String,
  },

  /// The run is parked on a form node.
  RunSuspended {
    run_id: String,
    node_id: String,
    resume_url: String,
  },

  /// A parked form node has resumed the run.
  NodeResumed { run_id: String, node_id: String },

  /// Every node has run.
  RunCompleted { run_id: String },

  RunFailed { run_id: String, error: String },

  RunCancelled { run_id: String },
}

/// Trait for receiving run events.
///
/// The engine calls `notify` for each event; implementations decide what to
/// do with them.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// A notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow consumer never holds up a request. Volume is a few
  // events per request.
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // The receiver may have been dropped.
    let _ = self.sender.send(event);
  }
}
