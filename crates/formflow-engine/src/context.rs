use chrono::{DateTime, FixedOffset, Utc};
use formflow_config::{FormParams, NodeType, RunMode};
use formflow_form::{FormError, ItemBatch, NodeContext};
use formflow_workflow::{GraphNodeRef, Workflow};

/// [`NodeContext`] over a locked workflow, built fresh for every call.
pub struct EngineNodeContext<'a> {
  workflow: &'a Workflow,
  node: GraphNodeRef,
  input: ItemBatch,
  mode: RunMode,
  resume_url: Option<String>,
}

impl<'a> EngineNodeContext<'a> {
  pub fn new(
    workflow: &'a Workflow,
    node: GraphNodeRef,
    input: ItemBatch,
    mode: RunMode,
    resume_url: Option<String>,
  ) -> Self {
    Self {
      workflow,
      node,
      input,
      mode,
      resume_url,
    }
  }
}

impl NodeContext for EngineNodeContext<'_> {
  fn node(&self) -> &GraphNodeRef {
    &self.node
  }

  fn parameters(&self) -> Result<FormParams, FormError> {
    match self.workflow.get_node(&self.node.name).map(|n| &n.node_type) {
      Some(NodeType::Form(params)) => Ok(params.clone()),
      Some(_) => Err(FormError::InvalidParameters {
        node_id: self.node.name.clone(),
        message: "node is not a form node".to_string(),
      }),
      None => Err(FormError::InvalidParameters {
        node_id: self.node.name.clone(),
        message: "node is no longer part of the workflow".to_string(),
      }),
    }
  }

  fn ancestors(&self) -> Vec<GraphNodeRef> {
    self.workflow.ancestors(&self.node.name)
  }

  fn descendants(&self) -> Vec<GraphNodeRef> {
    self.workflow.descendants(&self.node.name)
  }

  fn node_parameters(&self, node_id: &str) -> Option<serde_json::Value> {
    self.workflow.parameters(node_id)
  }

  fn input_batch(&self) -> ItemBatch {
    self.input.clone()
  }

  fn run_mode(&self) -> RunMode {
    self.mode
  }

  fn resume_url(&self) -> Option<String> {
    self.resume_url.clone()
  }

  fn timezone(&self) -> FixedOffset {
    self.workflow.timezone()
  }

  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}
