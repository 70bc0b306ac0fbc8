//! Formflow Config
//!
//! This crate contains the serializable workflow configuration types for formflow.
//! These types represent workflow definitions before they are locked by
//! `formflow-workflow` and executed by the engine.
//!
//! Configuration is loaded from JSON files (via CLI with `formflow start workflow.json`)
//! or from any other source able to produce a [`WorkflowDef`].
//!
//! Form nodes carry their fields and cosmetic options here. Options left unset
//! are resolved at run time against the upstream trigger's parameters.

mod edge;
mod enums;
mod field;
mod node;
mod options;
mod workflow;

pub use edge::Edge;
pub use enums::{FieldKind, RunMode};
pub use field::FieldSpec;
pub use node::{FormParams, NodeDef, NodeType, TriggerParams};
pub use options::{NodeOptions, TriggerOptions};
pub use workflow::{WorkflowDef, WorkflowSettings};
