use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::WorkflowError;

/// Graph structure for traversal and analysis.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Adjacency list: node_id -> list of downstream node_ids.
  adjacency: HashMap<String, Vec<String>>,
  /// Reverse adjacency: node_id -> list of upstream node_ids.
  reverse_adjacency: HashMap<String, Vec<String>>,
  /// Nodes with no incoming edges, sorted by id.
  entry_points: Vec<String>,
}

impl Graph {
  /// Build a graph from node ids and edges.
  ///
  /// Edges are expected to reference known nodes; `Workflow::lock` checks this
  /// before building the graph.
  pub fn new<'a>(node_ids: impl IntoIterator<Item = &'a String>, edges: &[(String, String)]) -> Self {
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut reverse_adjacency: HashMap<String, Vec<String>> = HashMap::new();

    // Initialize all nodes
    for node_id in node_ids {
      adjacency.entry(node_id.clone()).or_default();
      reverse_adjacency.entry(node_id.clone()).or_default();
    }

    // Build adjacency lists
    for (from, to) in edges {
      adjacency.entry(from.clone()).or_default().push(to.clone());
      reverse_adjacency
        .entry(to.clone())
        .or_default()
        .push(from.clone());
    }

    let mut entry_points: Vec<String> = reverse_adjacency
      .iter()
      .filter(|(_, incoming)| incoming.is_empty())
      .map(|(id, _)| id.clone())
      .collect();
    entry_points.sort();

    Self {
      adjacency,
      reverse_adjacency,
      entry_points,
    }
  }

  /// Get entry points (nodes with no incoming edges).
  pub fn entry_points(&self) -> &[String] {
    &self.entry_points
  }

  /// Get direct downstream nodes for a given node.
  pub fn downstream(&self, node_id: &str) -> &[String] {
    self
      .adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Get direct upstream nodes for a given node.
  pub fn upstream(&self, node_id: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// All nodes reachable by walking edges backwards, nearest first.
  pub fn ancestors(&self, node_id: &str) -> Vec<String> {
    Self::reachable(node_id, &self.reverse_adjacency)
  }

  /// All nodes reachable by walking edges forwards, nearest first.
  pub fn descendants(&self, node_id: &str) -> Vec<String> {
    Self::reachable(node_id, &self.adjacency)
  }

  fn reachable(start: &str, edges: &HashMap<String, Vec<String>>) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut order = Vec::new();
    let mut queue: VecDeque<&str> = VecDeque::new();

    seen.insert(start);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
      for next in edges.get(current).map(|v| v.as_slice()).unwrap_or(&[]) {
        if seen.insert(next.as_str()) {
          order.push(next.clone());
          queue.push_back(next.as_str());
        }
      }
    }

    order
  }

  /// Check that the graph is acyclic (Kahn's algorithm).
  ///
  /// On failure the error names one node that sits on a cycle.
  pub fn check_acyclic(&self) -> Result<(), WorkflowError> {
    let mut in_degree: HashMap<&str, usize> = self
      .reverse_adjacency
      .iter()
      .map(|(id, incoming)| (id.as_str(), incoming.len()))
      .collect();

    let mut queue: VecDeque<&str> = self.entry_points.iter().map(|s| s.as_str()).collect();
    let mut visited = 0usize;

    while let Some(current) = queue.pop_front() {
      visited += 1;
      for next in self.downstream(current) {
        if let Some(degree) = in_degree.get_mut(next.as_str()) {
          *degree -= 1;
          if *degree == 0 {
            queue.push_back(next.as_str());
          }
        }
      }
    }

    if visited == in_degree.len() {
      return Ok(());
    }

    let mut stuck: Vec<&str> = in_degree
      .into_iter()
      .filter(|(_, degree)| *degree > 0)
      .map(|(id, _)| id)
      .collect();
    stuck.sort();

    Err(WorkflowError::Cycle(
      stuck.first().map(|s| s.to_string()).unwrap_or_default(),
    ))
  }
}
