//! Run execution engine.
//!
//! The `FormEngine` drives runs of one workflow. Nodes run breadth-first
//! along edges until a form node parks the run; a request presenting the
//! run's token picks it back up. Every step is persisted before the call
//! returns, so a run can be resumed by a different process.

use chrono::Utc;
use formflow_config::{NodeType, RunMode};
use formflow_form::{
  DataAggregator, FormError, GraphValidator, HttpMethod, InboundRequest, Item, ItemBatch,
  NodeResponse, Operation, RunState, SuspensionController,
};
use formflow_store::{PendingNode, RunRecord, RunStatus, RunStore, StoreError};
use formflow_workflow::{NodeKind, Workflow, WorkflowError};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::context::EngineNodeContext;
use crate::error::EngineError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::http::HttpResponse;

/// Configuration for the form engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// Resume URLs are `{resume_base_url}/{token}`.
  pub resume_base_url: String,
  pub mode: RunMode,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      resume_base_url: "http://localhost:5678/form-waiting".to_string(),
      mode: RunMode::Production,
    }
  }
}

/// The form run engine.
///
/// Generic over `N: ExecutionNotifier` to allow different notification
/// strategies. Use `FormEngine::new()` for an engine with no-op
/// notifications, or `FormEngine::with_notifier()` to observe events.
pub struct FormEngine<S: RunStore, N: ExecutionNotifier = NoopNotifier> {
  workflow: Workflow,
  store: S,
  config: EngineConfig,
  notifier: N,
  controller: SuspensionController,
}

impl<S: RunStore> FormEngine<S, NoopNotifier> {
  pub fn new(workflow: Workflow, store: S, config: EngineConfig) -> Self {
    Self::with_notifier(workflow, store, config, NoopNotifier)
  }
}

impl<S: RunStore, N: ExecutionNotifier> FormEngine<S, N> {
  pub fn with_notifier(workflow: Workflow, store: S, config: EngineConfig, notifier: N) -> Self {
    Self {
      workflow,
      store,
      config,
      notifier,
      controller: SuspensionController::new(),
    }
  }

  pub fn workflow(&self) -> &Workflow {
    &self.workflow
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  /// The URL a run holding `token` is served at.
  pub fn resume_url(&self, token: &str) -> String {
    format!("{}/{}", self.config.resume_base_url.trim_end_matches('/'), token)
  }

  /// Start a run from a trigger payload.
  ///
  /// Returns the run as persisted: `Waiting` when a form node parked it,
  /// `Succeeded` when every node ran.
  #[instrument(
    name = "run_start",
    skip(self, payload),
    fields(workflow_id = %self.workflow.workflow_id)
  )]
  pub async fn start(&self, payload: serde_json::Value) -> Result<RunRecord, EngineError> {
    let mut record = RunRecord::new(
      Uuid::new_v4().to_string(),
      self.workflow.workflow_id.clone(),
      RunState::new(self.config.mode),
    );

    info!(
      run_id = %record.run_id,
      workflow_id = %record.workflow_id,
      mode = %record.state.mode,
      "run_started"
    );
    self.notifier.notify(ExecutionEvent::RunStarted {
      run_id: record.run_id.clone(),
      workflow_id: record.workflow_id.clone(),
    });

    let input = vec![Item::from_json(payload)];
    for node_id in self.workflow.graph().entry_points() {
      record.pending.push_back(PendingNode {
        node_id: node_id.clone(),
        input: input.clone(),
      });
    }

    let outcome = self.drive(&mut record);
    self.persist(&mut record, outcome.as_ref().err()).await?;
    outcome.map(|()| record)
  }

  /// Dispatch an inbound request to the run holding `token`.
  ///
  /// GET and HEAD on a page render the form and leave the run parked. A POST
  /// on a page, or any request on a completion, resumes the run and drives
  /// it to its next suspension or its end. A POST followed by another page is
  /// answered with a redirect to that page's URL.
  ///
  /// Each suspension holds its own token, so a redelivered request for a page
  /// that already resumed finds no run.
  #[instrument(name = "run_request", skip(self, request), fields(method = %request.method))]
  pub async fn handle_request(
    &self,
    token: &str,
    request: InboundRequest,
  ) -> Result<HttpResponse, EngineError> {
    let mut record = self
      .store
      .find_by_token(token)
      .await?
      .filter(|record| record.workflow_id == self.workflow.workflow_id)
      .ok_or_else(|| EngineError::TokenNotFound(token.to_string()))?;

    let node_id = match (record.status, record.waiting_node()) {
      (RunStatus::Waiting, Some(node_id)) => node_id.to_string(),
      _ => {
        return Err(EngineError::NotWaiting {
          run_id: record.run_id.clone(),
          status: record.status,
        });
      }
    };

    let outcome = self.resume(&mut record, &node_id, &request);
    if matches!(outcome, Err(EngineError::MethodNotAllowed { .. })) {
      // Nothing moved; the run stays parked on the page.
      warn!(run_id = %record.run_id, node_id = %node_id, "request_rejected");
      return outcome;
    }
    self.persist(&mut record, outcome.as_ref().err()).await?;

    let mut response = outcome?;
    if request.method == HttpMethod::Head {
      response.body.clear();
    }
    Ok(response)
  }

  /// Cancel a run that has not finished. Its token stops resolving.
  #[instrument(name = "run_cancel", skip(self))]
  pub async fn cancel(&self, run_id: &str) -> Result<RunRecord, EngineError> {
    let mut record = self.get_run(run_id).await?;
    if record.status.is_terminal() {
      return Err(EngineError::NotWaiting {
        run_id: record.run_id,
        status: record.status,
      });
    }

    record.status = RunStatus::Cancelled;
    record.state.waiting_token = None;
    DataAggregator::release(&mut record.state);
    record.pending.clear();
    record.updated_at = Utc::now();
    self.store.save_run(&record).await?;

    info!(run_id = %record.run_id, "run_cancelled");
    self.notifier.notify(ExecutionEvent::RunCancelled {
      run_id: record.run_id.clone(),
    });
    Ok(record)
  }

  pub async fn get_run(&self, run_id: &str) -> Result<RunRecord, EngineError> {
    match self.store.get_run(run_id).await {
      Ok(record) if record.workflow_id == self.workflow.workflow_id => Ok(record),
      Ok(_) | Err(StoreError::NotFound(_)) => Err(EngineError::RunNotFound(run_id.to_string())),
      Err(e) => Err(e.into()),
    }
  }

  /// Runs of this engine's workflow, oldest first.
  pub async fn list_runs(&self) -> Result<Vec<RunRecord>, EngineError> {
    Ok(self.store.list_runs(&self.workflow.workflow_id).await?)
  }

  /// Run queued nodes until a form node parks the run or the queue drains.
  fn drive(&self, record: &mut RunRecord) -> Result<(), EngineError> {
    while let Some(PendingNode { node_id, input }) = record.pending.pop_front() {
      let node = self
        .workflow
        .get_node(&node_id)
        .ok_or_else(|| WorkflowError::NodeNotFound(node_id.clone()))?;

      info!(
        run_id = %record.run_id,
        node_id = %node_id,
        items = input.len(),
        "node_entered"
      );
      self.notifier.notify(ExecutionEvent::NodeStarted {
        run_id: record.run_id.clone(),
        node_id: node_id.clone(),
      });

      match &node.node_type {
        NodeType::Trigger(_) | NodeType::Noop => self.complete_node(record, &node_id, input),
        NodeType::Form(_) => {
          record.state.waiting_token = Some(Uuid::new_v4().to_string());
          let ctx = self.context(record, &node_id, input)?;
          self
            .controller
            .enter(&ctx, &mut record.state)
            .map_err(EngineError::node_failed)?;

          record.status = RunStatus::Waiting;
          let resume_url = self.run_resume_url(record).unwrap_or_default();
          info!(
            run_id = %record.run_id,
            node_id = %node_id,
            resume_url = %resume_url,
            "run_suspended"
          );
          self.notifier.notify(ExecutionEvent::RunSuspended {
            run_id: record.run_id.clone(),
            node_id,
            resume_url,
          });
          return Ok(());
        }
      }
    }

    record.status = RunStatus::Succeeded;
    info!(run_id = %record.run_id, "run_completed");
    self.notifier.notify(ExecutionEvent::RunCompleted {
      run_id: record.run_id.clone(),
    });
    Ok(())
  }

  /// Hand a request to the parked node and act on its resolution.
  fn resume(
    &self,
    record: &mut RunRecord,
    node_id: &str,
    request: &InboundRequest,
  ) -> Result<HttpResponse, EngineError> {
    let ctx = self.context(record, node_id, Vec::new())?;
    let resolution = self
      .controller
      .resume_candidate(&ctx, &mut record.state, request)
      .map_err(|e| match e {
        FormError::MethodNotAllowed {
          node_id, method, ..
        } => EngineError::MethodNotAllowed { node_id, method },
        e => EngineError::node_failed(e),
      })?;

    let html = resolution
      .response
      .to_html(node_id)
      .map_err(EngineError::node_failed)?;

    let Some(output) = resolution.resume else {
      debug!(run_id = %record.run_id, node_id, "form served");
      return Ok(HttpResponse::html(html.unwrap_or_default()));
    };

    info!(
      run_id = %record.run_id,
      node_id,
      items = output.len(),
      "node_resumed"
    );
    self.notifier.notify(ExecutionEvent::NodeResumed {
      run_id: record.run_id.clone(),
      node_id: node_id.to_string(),
    });

    record.status = RunStatus::Running;
    self.complete_node(record, node_id, output);
    self.drive(record)?;

    let next_url = match record.status {
      RunStatus::Waiting => self.run_resume_url(record),
      _ => None,
    };

    Ok(match (resolution.response, html, next_url) {
      (NodeResponse::Continue, _, Some(next_url)) => {
        debug!(run_id = %record.run_id, node_id, next_url = %next_url, "continuing to next page");
        HttpResponse::redirect(next_url)
      }
      (NodeResponse::Form(_) | NodeResponse::Completion(_), Some(html), _) => {
        HttpResponse::html(html)
      }
      (_, _, next_url) => {
        let mut body = serde_json::json!({
          "status": "received",
          "run_status": record.status,
        });
        if let Some(next_url) = next_url {
          body["resume_url"] = next_url.into();
        }
        HttpResponse::json(200, &body)
      }
    })
  }

  /// Record a node's output and queue its downstream nodes.
  fn complete_node(&self, record: &mut RunRecord, node_id: &str, output: ItemBatch) {
    for next in self.workflow.graph().downstream(node_id) {
      record.pending.push_back(PendingNode {
        node_id: next.clone(),
        input: output.clone(),
      });
    }

    self.notifier.notify(ExecutionEvent::NodeCompleted {
      run_id: record.run_id.clone(),
      node_id: node_id.to_string(),
      output: output.clone(),
    });
    record.outputs.insert(node_id.to_string(), output);
  }

  fn context(
    &self,
    record: &RunRecord,
    node_id: &str,
    input: ItemBatch,
  ) -> Result<EngineNodeContext<'_>, EngineError> {
    let node = self
      .workflow
      .node_ref(node_id)
      .ok_or_else(|| WorkflowError::NodeNotFound(node_id.to_string()))?;

    Ok(EngineNodeContext::new(
      &self.workflow,
      node,
      input,
      record.state.mode,
      self.run_resume_url(record),
    ))
  }

  fn run_resume_url(&self, record: &RunRecord) -> Option<String> {
    record.resume_token().map(|token| self.resume_url(token))
  }

  /// Save the run, marking it failed first when `failure` is set.
  async fn persist(
    &self,
    record: &mut RunRecord,
    failure: Option<&EngineError>,
  ) -> Result<(), EngineError> {
    if let Some(e) = failure {
      self.mark_failed(record, e);
    }
    record.updated_at = Utc::now();
    self.store.save_run(record).await?;
    Ok(())
  }

  fn mark_failed(&self, record: &mut RunRecord, failure: &EngineError) {
    record.status = RunStatus::Failed;
    record.error = Some(failure.to_string());
    DataAggregator::release(&mut record.state);
    record.pending.clear();

    if let EngineError::NodeFailed { node_id, source } = failure {
      self.notifier.notify(ExecutionEvent::NodeFailed {
        run_id: record.run_id.clone(),
        node_id: node_id.clone(),
        error: source.to_string(),
      });
    }

    error!(run_id = %record.run_id, error = %failure, "run_failed");
    self.notifier.notify(ExecutionEvent::RunFailed {
      run_id: record.run_id.clone(),
      error: failure.to_string(),
    });
  }
}

/// Check every form node's position in the workflow without starting a run.
///
/// Reports the same structural errors `enter` would raise, plus
/// unrecognized operations.
pub fn validate_forms(workflow: &Workflow) -> Vec<FormError> {
  let mut node_ids: Vec<&String> = workflow.nodes.keys().collect();
  node_ids.sort();

  node_ids
    .into_iter()
    .filter_map(|node_id| {
      let node = workflow.node_ref(node_id)?;
      if node.kind != NodeKind::Form {
        return None;
      }
      let operation = match workflow.get_node(node_id).map(|n| &n.node_type) {
        Some(NodeType::Form(params)) => Operation::parse(node_id, &params.operation),
        _ => return None,
      };

      operation
        .and_then(|operation| {
          GraphValidator::validate(
            &node,
            operation,
            &workflow.ancestors(node_id),
            &workflow.descendants(node_id),
          )
        })
        .err()
    })
    .collect()
}
