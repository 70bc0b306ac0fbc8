//! Deferred expressions evaluated against a node's surroundings.
//!
//! Fallback options are not copied from the trigger when a workflow is
//! defined. Each form node instead carries expressions such as
//! `trigger.params.title`, evaluated only when the value is needed:
//!
//! ```json
//! {
//!   "trigger": { "name": "signup", "type_version": 3, "params": { "title": "Signup" } },
//!   "execution": { "resume_url": "https://host/form-waiting/4f0c…", "mode": "production" }
//! }
//! ```

use formflow_config::RunMode;
use formflow_workflow::GraphNodeRef;
use minijinja::{Environment, UndefinedBehavior};
use serde_json::json;
use tracing::warn;

/// Evaluates an expression against a JSON scope.
///
/// Evaluation is pure: the same expression and scope always give the same
/// result. `None` means the expression produced nothing usable (undefined,
/// none, or an evaluation error).
pub trait ExpressionEvaluator {
  fn evaluate(&self, expression: &str, scope: &serde_json::Value) -> Option<serde_json::Value>;
}

/// Expression evaluator backed by minijinja.
///
/// Lookups through missing attributes are chainable, so
/// `trigger.params.options.button_label` yields nothing instead of failing
/// when the trigger has no options.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinijinjaEvaluator;

impl MinijinjaEvaluator {
  pub fn new() -> Self {
    Self
  }

  fn environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Chainable);
    env
  }
}

impl ExpressionEvaluator for MinijinjaEvaluator {
  fn evaluate(&self, expression: &str, scope: &serde_json::Value) -> Option<serde_json::Value> {
    let env = Self::environment();

    let compiled = match env.compile_expression(expression) {
      Ok(compiled) => compiled,
      Err(e) => {
        warn!(expression, error = %e, "failed to compile expression");
        return None;
      }
    };

    match compiled.eval(minijinja::Value::from_serialize(scope)) {
      Ok(value) if value.is_undefined() || value.is_none() => None,
      Ok(value) => match serde_json::to_value(&value) {
        Ok(json) => Some(json),
        Err(e) => {
          warn!(expression, error = %e, "expression result is not representable as JSON");
          None
        }
      },
      Err(e) => {
        warn!(expression, error = %e, "failed to evaluate expression");
        None
      }
    }
  }
}

/// Build the scope form-node expressions are evaluated in.
pub fn expression_scope(
  trigger: Option<&GraphNodeRef>,
  trigger_params: Option<serde_json::Value>,
  resume_url: Option<&str>,
  mode: RunMode,
) -> serde_json::Value {
  let trigger = match trigger {
    Some(node) => json!({
      "name": node.name,
      "type_version": node.type_version,
      "params": trigger_params.unwrap_or_else(|| json!({})),
    }),
    None => json!({}),
  };

  json!({
    "trigger": trigger,
    "execution": {
      "resume_url": resume_url,
      "mode": mode,
    },
  })
}
