use std::collections::{HashMap, HashSet};

use chrono::{FixedOffset, Offset, Utc};
use formflow_config::{NodeDef, NodeType, WorkflowDef};

use crate::error::WorkflowError;
use crate::graph::Graph;
use crate::node_ref::GraphNodeRef;

/// A locked workflow ready for execution.
#[derive(Debug, Clone)]
pub struct Workflow {
  pub workflow_id: String,
  pub name: String,
  pub nodes: HashMap<String, NodeDef>,
  pub edges: Vec<(String, String)>,
  timezone: FixedOffset,
  graph: Graph,
}

impl Workflow {
  /// Validate a workflow definition and lock it.
  pub fn lock(def: WorkflowDef) -> Result<Self, WorkflowError> {
    let timezone = parse_timezone(def.settings.timezone.as_deref())?;

    let mut nodes = HashMap::with_capacity(def.nodes.len());
    for node in def.nodes {
      check_field_keys(&node)?;
      let node_id = node.node_id.clone();
      if nodes.insert(node_id.clone(), node).is_some() {
        return Err(WorkflowError::DuplicateNode(node_id));
      }
    }

    let mut edges = Vec::with_capacity(def.edges.len());
    for edge in def.edges {
      if !nodes.contains_key(&edge.from) || !nodes.contains_key(&edge.to) {
        return Err(WorkflowError::InvalidEdge {
          from: edge.from,
          to: edge.to,
        });
      }
      edges.push((edge.from, edge.to));
    }

    let graph = Graph::new(nodes.keys(), &edges);
    if !nodes.is_empty() && graph.entry_points().is_empty() {
      return Err(WorkflowError::NoEntryPoints);
    }
    graph.check_acyclic()?;

    Ok(Self {
      workflow_id: def.workflow_id,
      name: def.name,
      nodes,
      edges,
      timezone,
      graph,
    })
  }

  /// The graph structure for traversal.
  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  /// Get a node by ID.
  pub fn get_node(&self, node_id: &str) -> Option<&NodeDef> {
    self.nodes.get(node_id)
  }

  /// The workflow timezone as a fixed offset from UTC.
  pub fn timezone(&self) -> FixedOffset {
    self.timezone
  }

  /// Descriptor for a node, if it exists.
  pub fn node_ref(&self, node_id: &str) -> Option<GraphNodeRef> {
    self.nodes.get(node_id).map(GraphNodeRef::from)
  }

  /// All transitive upstream nodes of `node_id`, nearest first.
  pub fn ancestors(&self, node_id: &str) -> Vec<GraphNodeRef> {
    self.refs(self.graph.ancestors(node_id))
  }

  /// All transitive downstream nodes of `node_id`, nearest first.
  pub fn descendants(&self, node_id: &str) -> Vec<GraphNodeRef> {
    self.refs(self.graph.descendants(node_id))
  }

  /// A node's parameters as JSON, the shape expressions see them in.
  pub fn parameters(&self, node_id: &str) -> Option<serde_json::Value> {
    let node = self.nodes.get(node_id)?;
    let value = match &node.node_type {
      NodeType::Trigger(params) => serde_json::to_value(params),
      NodeType::Form(params) => serde_json::to_value(params),
      NodeType::Noop => Ok(serde_json::Value::Object(serde_json::Map::new())),
    };
    value.ok()
  }

  fn refs(&self, ids: Vec<String>) -> Vec<GraphNodeRef> {
    ids.iter().filter_map(|id| self.node_ref(id)).collect()
  }
}

fn parse_timezone(value: Option<&str>) -> Result<FixedOffset, WorkflowError> {
  match value {
    None => Ok(utc()),
    Some(raw) => {
      let trimmed = raw.trim();
      if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
        return Ok(utc());
      }
      trimmed
        .parse::<FixedOffset>()
        .map_err(|_| WorkflowError::InvalidTimezone(raw.to_string()))
    }
  }
}

fn utc() -> FixedOffset {
  Utc.fix()
}

fn check_field_keys(node: &NodeDef) -> Result<(), WorkflowError> {
  if let NodeType::Form(params) = &node.node_type {
    let mut seen = HashSet::new();
    for field in &params.fields {
      if !seen.insert(field.key.as_str()) {
        return Err(WorkflowError::DuplicateFieldKey {
          node_id: node.node_id.clone(),
          key: field.key.clone(),
        });
      }
    }
  }
  Ok(())
}
