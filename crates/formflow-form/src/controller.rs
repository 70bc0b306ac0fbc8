//! The form node's suspension state machine.
//!
//! ```text
//!            enter
//!   Entered ───────▶ Suspended ◀──────────── Rendering   (GET/HEAD, page)
//!                        │
//!                        ├──────▶ Submitting ──▶ Resumed (POST, page)
//!                        └──────▶ Completing ──▶ Resumed (any, completion)
//! ```
//!
//! Only `Suspended` is persisted. Every other phase lives for the duration of
//! one call.

use chrono::{DateTime, Utc};
use formflow_config::{FormParams, RunMode};
use tracing::debug;

use crate::aggregator::DataAggregator;
use crate::capture::{CaptureSettings, capture_submission};
use crate::context::NodeContext;
use crate::error::FormError;
use crate::expression::{ExpressionEvaluator, MinijinjaEvaluator, expression_scope};
use crate::item::ItemBatch;
use crate::operation::Operation;
use crate::render::{CompletionDocument, FormAction, FormDocument, NodeResponse, RenderedField};
use crate::request::{HttpMethod, InboundRequest};
use crate::resolver::{ConfigurationResolver, TextOption};
use crate::state::{Phase, RunState};
use crate::validator::GraphValidator;

/// Request to park the run, returned from [`SuspensionController::enter`].
#[derive(Debug, Clone, PartialEq)]
pub struct Suspension {
  pub node_id: String,
  pub operation: Operation,
  /// Always `None`: form nodes wait indefinitely.
  pub deadline: Option<DateTime<Utc>>,
}

/// Outcome of a resume candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
  /// What to send back to the requester.
  pub response: NodeResponse,
  /// Output to resume the run with. `None` keeps the run parked.
  pub resume: Option<ItemBatch>,
  /// Phase the instance is left in.
  pub phase: Phase,
}

/// Transitions out of `Suspended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  Render,
  Submit,
  Complete,
}

impl Transition {
  /// Select the transition for a request reaching `node_id`.
  ///
  /// HEAD is served like GET. Any other method besides POST is refused on a
  /// page; a completion accepts every method.
  pub fn select(
    node_id: &str,
    phase: Option<Phase>,
    operation: Operation,
    method: HttpMethod,
  ) -> Result<Self, FormError> {
    match (phase, operation, method) {
      (Some(Phase::Suspended), Operation::Page, HttpMethod::Get | HttpMethod::Head) => {
        Ok(Transition::Render)
      }
      (Some(Phase::Suspended), Operation::Page, HttpMethod::Post) => Ok(Transition::Submit),
      (
        Some(Phase::Suspended),
        Operation::Page,
        HttpMethod::Put | HttpMethod::Patch | HttpMethod::Delete | HttpMethod::Options,
      ) => Err(FormError::MethodNotAllowed {
        node_id: node_id.to_string(),
        method: method.to_string(),
        operation: operation.to_string(),
      }),
      (Some(Phase::Suspended), Operation::Completion, _) => Ok(Transition::Complete),
      (
        None
        | Some(
          Phase::Entered
          | Phase::Rendering
          | Phase::Submitting
          | Phase::Completing
          | Phase::Resumed,
        ),
        _,
        _,
      ) => Err(FormError::NotSuspended {
        node_id: node_id.to_string(),
      }),
    }
  }

  /// Phase held while the transition runs.
  pub fn transient_phase(&self) -> Phase {
    match self {
      Transition::Render => Phase::Rendering,
      Transition::Submit => Phase::Submitting,
      Transition::Complete => Phase::Completing,
    }
  }

  /// Phase the instance ends in.
  pub fn target_phase(&self) -> Phase {
    match self {
      Transition::Render => Phase::Suspended,
      Transition::Submit | Transition::Complete => Phase::Resumed,
    }
  }
}

/// Drives a form node through its suspensions.
///
/// The controller holds no per-run data. Everything that must outlive a call
/// is written to the [`RunState`] the engine persists.
#[derive(Debug, Clone, Default)]
pub struct SuspensionController<E: ExpressionEvaluator = MinijinjaEvaluator> {
  evaluator: E,
}

impl SuspensionController<MinijinjaEvaluator> {
  pub fn new() -> Self {
    Self {
      evaluator: MinijinjaEvaluator::new(),
    }
  }
}

impl<E: ExpressionEvaluator> SuspensionController<E> {
  pub fn with_evaluator(evaluator: E) -> Self {
    Self { evaluator }
  }

  /// Handle the node's arrival: validate its position in the graph, then park
  /// it with the incoming batch preserved.
  ///
  /// Fails without touching `state` when the graph is misconfigured.
  pub fn enter<C: NodeContext + ?Sized>(
    &self,
    ctx: &C,
    state: &mut RunState,
  ) -> Result<Suspension, FormError> {
    let node_id = ctx.node_id();
    let params = ctx.parameters()?;
    let operation = Operation::parse(node_id, &params.operation)?;

    GraphValidator::validate(ctx.node(), operation, &ctx.ancestors(), &ctx.descendants())?;

    DataAggregator::preserve(state, node_id, ctx.input_batch());
    debug!(node_id, %operation, from = ?Phase::Entered, to = ?Phase::Suspended, "transition");

    Ok(Suspension {
      node_id: node_id.to_string(),
      operation,
      deadline: None,
    })
  }

  /// Handle an inbound request matched to the run while this node is
  /// parked.
  ///
  /// Rendering leaves `state` unchanged. Submission and completion release
  /// the instance slot and return the output to resume with. On error
  /// `state` is left as it was.
  pub fn resume_candidate<C: NodeContext + ?Sized>(
    &self,
    ctx: &C,
    state: &mut RunState,
    request: &InboundRequest,
  ) -> Result<Resolution, FormError> {
    let node_id = ctx.node_id();
    let params = ctx.parameters()?;
    let operation = Operation::parse(node_id, &params.operation)?;

    let transition = Transition::select(node_id, state.phase_of(node_id), operation, request.method)?;
    debug!(
      node_id,
      method = %request.method,
      phase = ?transition.transient_phase(),
      "transition"
    );

    let resolver = self.resolver(ctx);

    let resolution = match transition {
      Transition::Render => Resolution {
        response: NodeResponse::Form(form_document(ctx, &params, &resolver)),
        resume: None,
        phase: transition.target_phase(),
      },
      Transition::Submit => {
        let settings = CaptureSettings {
          use_workflow_timezone: resolver
            .use_workflow_timezone(params.options.use_workflow_timezone),
          timezone: ctx.timezone(),
          now: ctx.now(),
          mode: ctx.run_mode(),
        };
        let item = capture_submission(node_id, &params.fields, &request.body, &settings)?;
        DataAggregator::release(state);

        let response = if GraphValidator::has_next_page(ctx.node(), &ctx.descendants()) {
          NodeResponse::Continue
        } else {
          NodeResponse::Acknowledge
        };
        Resolution {
          response,
          resume: Some(vec![item]),
          phase: transition.target_phase(),
        }
      }
      Transition::Complete => {
        let batch = DataAggregator::restore(state, node_id)?;
        let document = completion_document(&params, &resolver);
        DataAggregator::release(state);

        Resolution {
          response: NodeResponse::Completion(document),
          resume: Some(batch),
          phase: transition.target_phase(),
        }
      }
    };

    debug!(node_id, phase = ?resolution.phase, "transition complete");
    Ok(resolution)
  }

  /// Build a resolver scoped to the node's nearest upstream trigger.
  fn resolver<C: NodeContext + ?Sized>(&self, ctx: &C) -> ConfigurationResolver<'_, E> {
    let ancestors = ctx.ancestors();
    let trigger = GraphValidator::find_trigger(&ancestors).cloned();
    let trigger_params = trigger
      .as_ref()
      .and_then(|trigger| ctx.node_parameters(&trigger.name));
    let resume_url = ctx.resume_url();

    let scope = expression_scope(
      trigger.as_ref(),
      trigger_params,
      resume_url.as_deref(),
      ctx.run_mode(),
    );
    ConfigurationResolver::new(&self.evaluator, scope, trigger)
  }
}

fn form_document<C: NodeContext + ?Sized, E: ExpressionEvaluator>(
  ctx: &C,
  params: &FormParams,
  resolver: &ConfigurationResolver<'_, E>,
) -> FormDocument {
  let options = &params.options;

  let action = if GraphValidator::has_next_page(ctx.node(), &ctx.descendants()) {
    resolver
      .resume_url()
      .map(FormAction::ContinueTo)
      .unwrap_or(FormAction::Submit)
  } else {
    FormAction::Submit
  };

  FormDocument {
    title: resolver.resolve(TextOption::Title, options.title.as_deref()),
    description: resolver.resolve(TextOption::Description, options.description.as_deref()),
    fields: params.fields.iter().map(RenderedField::from).collect(),
    button_label: resolver.resolve(TextOption::ButtonLabel, options.button_label.as_deref()),
    action,
    append_attribution: resolver.append_attribution(options.append_attribution),
    test_mode: ctx.run_mode() == RunMode::Test,
  }
}

fn completion_document<E: ExpressionEvaluator>(
  params: &FormParams,
  resolver: &ConfigurationResolver<'_, E>,
) -> CompletionDocument {
  let options = &params.options;

  CompletionDocument {
    title: resolver.resolve(
      TextOption::CompletionTitle,
      options.completion_title.as_deref(),
    ),
    message: resolver.resolve(
      TextOption::CompletionMessage,
      options.completion_message.as_deref(),
    ),
    form_title: resolver.resolve(TextOption::Title, options.title.as_deref()),
    append_attribution: resolver.append_attribution(options.append_attribution),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_transition_table() {
    let suspended = Some(Phase::Suspended);

    assert_eq!(
      Transition::select("n", suspended, Operation::Page, HttpMethod::Get).unwrap(),
      Transition::Render
    );
    assert_eq!(
      Transition::select("n", suspended, Operation::Page, HttpMethod::Head).unwrap(),
      Transition::Render
    );
    assert_eq!(
      Transition::select("n", suspended, Operation::Page, HttpMethod::Post).unwrap(),
      Transition::Submit
    );
    for method in [HttpMethod::Get, HttpMethod::Post, HttpMethod::Delete] {
      assert_eq!(
        Transition::select("n", suspended, Operation::Completion, method).unwrap(),
        Transition::Complete
      );
    }
  }

  #[test]
  fn test_page_rejects_other_methods() {
    let result = Transition::select(
      "step1",
      Some(Phase::Suspended),
      Operation::Page,
      HttpMethod::Put,
    );
    assert!(matches!(
      result,
      Err(FormError::MethodNotAllowed { method, .. }) if method == "PUT"
    ));
  }

  #[test]
  fn test_not_suspended() {
    for phase in [None, Some(Phase::Resumed), Some(Phase::Entered)] {
      let result = Transition::select("step1", phase, Operation::Completion, HttpMethod::Get);
      assert!(matches!(result, Err(FormError::NotSuspended { .. })));
    }
  }

  #[test]
  fn test_phases() {
    assert_eq!(Transition::Render.transient_phase(), Phase::Rendering);
    assert_eq!(Transition::Render.target_phase(), Phase::Suspended);
    assert_eq!(Transition::Submit.transient_phase(), Phase::Submitting);
    assert_eq!(Transition::Complete.target_phase(), Phase::Resumed);
  }
}
