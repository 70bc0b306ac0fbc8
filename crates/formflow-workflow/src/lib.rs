//! Formflow Workflow
//!
//! This crate provides the "locked" workflow representation for formflow.
//! A locked workflow is a validated form of a workflow definition that is
//! ready for execution.
//!
//! Key differences from `formflow-config`:
//! - Graph structure is validated (unique ids, valid edges, no cycles)
//! - Form field keys are checked for uniqueness per node
//! - The workflow timezone is parsed once
//! - Ancestors and descendants of any node can be looked up by id

mod error;
mod graph;
mod node_ref;
mod workflow;

pub use error::WorkflowError;
pub use graph::Graph;
pub use node_ref::{GraphNodeRef, NodeKind};
pub use workflow::Workflow;
