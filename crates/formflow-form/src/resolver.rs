//! Option resolution with trigger fallback.
//!
//! A form node's cosmetic options resolve in three steps:
//! 1. the node's own value, when present and non-empty;
//! 2. a deferred expression over the upstream trigger's parameters;
//! 3. a hard default.
//!
//! Two boolean options follow their own rules, see
//! [`ConfigurationResolver::append_attribution`] and
//! [`ConfigurationResolver::use_workflow_timezone`].

use formflow_workflow::GraphNodeRef;

use crate::expression::ExpressionEvaluator;

pub const DEFAULT_TITLE: &str = "Form";
pub const DEFAULT_BUTTON_LABEL: &str = "Submit form";
pub const DEFAULT_COMPLETION_TITLE: &str = "Form Submitted";

const RESUME_URL: &str = "execution.resume_url";
const TRIGGER_APPEND_ATTRIBUTION: &str = "trigger.params.options.append_attribution";
const TRIGGER_USE_WORKFLOW_TIMEZONE: &str = "trigger.params.options.use_workflow_timezone";

/// Trigger versions above this default `use_workflow_timezone` to true.
const WORKFLOW_TIMEZONE_SINCE_VERSION: u32 = 2;

/// Text options of a form node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOption {
  Title,
  Description,
  ButtonLabel,
  CompletionTitle,
  CompletionMessage,
}

impl TextOption {
  /// Expression locating the trigger's counterpart of this option.
  fn fallback_expression(&self) -> Option<&'static str> {
    match self {
      TextOption::Title => Some("trigger.params.title"),
      TextOption::Description => Some("trigger.params.description"),
      TextOption::ButtonLabel => Some("trigger.params.options.button_label"),
      TextOption::CompletionTitle | TextOption::CompletionMessage => None,
    }
  }

  fn hard_default(&self) -> &'static str {
    match self {
      TextOption::Title => DEFAULT_TITLE,
      TextOption::ButtonLabel => DEFAULT_BUTTON_LABEL,
      TextOption::CompletionTitle => DEFAULT_COMPLETION_TITLE,
      TextOption::Description | TextOption::CompletionMessage => "",
    }
  }
}

/// Resolves a form node's options against its upstream trigger.
///
/// Resolution never fails. Expression errors are logged by the evaluator and
/// treated as an absent value.
pub struct ConfigurationResolver<'a, E: ExpressionEvaluator> {
  evaluator: &'a E,
  scope: serde_json::Value,
  trigger: Option<GraphNodeRef>,
}

impl<'a, E: ExpressionEvaluator> ConfigurationResolver<'a, E> {
  /// # Arguments
  /// * `evaluator` - Evaluates the fallback expressions
  /// * `scope` - Expression scope, see [`expression_scope`](crate::expression_scope)
  /// * `trigger` - The upstream trigger, if one was found
  pub fn new(evaluator: &'a E, scope: serde_json::Value, trigger: Option<GraphNodeRef>) -> Self {
    Self {
      evaluator,
      scope,
      trigger,
    }
  }

  /// Resolve a text option.
  pub fn resolve(&self, option: TextOption, local: Option<&str>) -> String {
    if let Some(value) = local.filter(|v| !v.trim().is_empty()) {
      return value.to_string();
    }

    option
      .fallback_expression()
      .and_then(|expression| self.evaluate_text(expression))
      .unwrap_or_else(|| option.hard_default().to_string())
  }

  /// Whether the rendered document carries attribution.
  ///
  /// A local value wins. Otherwise attribution is on unless the trigger
  /// explicitly turned it off; any value other than `false` (including an
  /// absent one) keeps it on.
  pub fn append_attribution(&self, local: Option<bool>) -> bool {
    if let Some(value) = local {
      return value;
    }

    !matches!(
      self.evaluator.evaluate(TRIGGER_APPEND_ATTRIBUTION, &self.scope),
      Some(serde_json::Value::Bool(false))
    )
  }

  /// Whether submitted dates and times are interpreted in the workflow
  /// timezone rather than UTC.
  ///
  /// A local value wins, then the trigger's option. When neither is set the
  /// default depends on the trigger version: triggers newer than version 2
  /// default to the workflow timezone, older ones to UTC.
  pub fn use_workflow_timezone(&self, local: Option<bool>) -> bool {
    if let Some(value) = local {
      return value;
    }

    if let Some(serde_json::Value::Bool(value)) = self
      .evaluator
      .evaluate(TRIGGER_USE_WORKFLOW_TIMEZONE, &self.scope)
    {
      return value;
    }

    self
      .trigger
      .as_ref()
      .is_some_and(|trigger| trigger.type_version > WORKFLOW_TIMEZONE_SINCE_VERSION)
  }

  /// The run's resume URL, used as the continue target of a page with a
  /// next page.
  pub fn resume_url(&self) -> Option<String> {
    self.evaluate_text(RESUME_URL)
  }

  fn evaluate_text(&self, expression: &str) -> Option<String> {
    let text = match self.evaluator.evaluate(expression, &self.scope)? {
      serde_json::Value::String(s) => s,
      serde_json::Value::Bool(b) => b.to_string(),
      serde_json::Value::Number(n) => n.to_string(),
      _ => return None,
    };

    if text.trim().is_empty() {
      None
    } else {
      Some(text)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::expression::{MinijinjaEvaluator, expression_scope};
  use formflow_config::RunMode;
  use formflow_workflow::NodeKind;
  use serde_json::json;

  fn resolver_for(
    evaluator: &MinijinjaEvaluator,
    version: u32,
    params: serde_json::Value,
  ) -> ConfigurationResolver<'_, MinijinjaEvaluator> {
    let trigger = GraphNodeRef::new("trigger", NodeKind::Trigger, version);
    let scope = expression_scope(
      Some(&trigger),
      Some(params),
      Some("https://host/form-waiting/t1"),
      RunMode::Production,
    );
    ConfigurationResolver::new(evaluator, scope, Some(trigger))
  }

  #[test]
  fn test_local_value_wins() {
    let evaluator = MinijinjaEvaluator::new();
    let resolver = resolver_for(&evaluator, 1, json!({ "title": "Trigger title" }));

    assert_eq!(resolver.resolve(TextOption::Title, Some("Page title")), "Page title");
  }

  #[test]
  fn test_title_falls_back_to_trigger_then_default() {
    let evaluator = MinijinjaEvaluator::new();

    let with_title = resolver_for(&evaluator, 1, json!({ "title": "Signup" }));
    assert_eq!(with_title.resolve(TextOption::Title, None), "Signup");
    assert_eq!(with_title.resolve(TextOption::Title, Some("  ")), "Signup");

    let empty_title = resolver_for(&evaluator, 1, json!({ "title": "" }));
    assert_eq!(empty_title.resolve(TextOption::Title, None), DEFAULT_TITLE);

    let no_trigger = ConfigurationResolver::new(
      &evaluator,
      expression_scope(None, None, None, RunMode::Production),
      None,
    );
    assert_eq!(no_trigger.resolve(TextOption::Title, None), DEFAULT_TITLE);
  }

  #[test]
  fn test_button_label() {
    let evaluator = MinijinjaEvaluator::new();

    let inherited = resolver_for(&evaluator, 1, json!({ "options": { "button_label": "Next" } }));
    assert_eq!(inherited.resolve(TextOption::ButtonLabel, None), "Next");

    let defaulted = resolver_for(&evaluator, 1, json!({}));
    assert_eq!(
      defaulted.resolve(TextOption::ButtonLabel, Some("")),
      "Submit form"
    );
  }

  #[test]
  fn test_completion_options_do_not_inherit() {
    let evaluator = MinijinjaEvaluator::new();
    let resolver = resolver_for(&evaluator, 1, json!({ "title": "Signup" }));

    assert_eq!(
      resolver.resolve(TextOption::CompletionTitle, None),
      DEFAULT_COMPLETION_TITLE
    );
    assert_eq!(resolver.resolve(TextOption::CompletionMessage, None), "");
    assert_eq!(
      resolver.resolve(TextOption::CompletionMessage, Some("Thanks!")),
      "Thanks!"
    );
  }

  #[test]
  fn test_append_attribution_is_tri_state() {
    let evaluator = MinijinjaEvaluator::new();

    let unset = resolver_for(&evaluator, 1, json!({}));
    assert!(unset.append_attribution(None));

    let off = resolver_for(&evaluator, 1, json!({ "options": { "append_attribution": false } }));
    assert!(!off.append_attribution(None));
    assert!(off.append_attribution(Some(true)));

    let on = resolver_for(&evaluator, 1, json!({ "options": { "append_attribution": true } }));
    assert!(on.append_attribution(None));
    assert!(!on.append_attribution(Some(false)));

    let not_bool = resolver_for(&evaluator, 1, json!({ "options": { "append_attribution": "false" } }));
    assert!(not_bool.append_attribution(None));
  }

  #[test]
  fn test_use_workflow_timezone_is_version_gated() {
    let evaluator = MinijinjaEvaluator::new();

    assert!(resolver_for(&evaluator, 3, json!({})).use_workflow_timezone(None));
    assert!(!resolver_for(&evaluator, 2, json!({})).use_workflow_timezone(None));
    assert!(!resolver_for(&evaluator, 1, json!({})).use_workflow_timezone(None));

    let explicit_off = resolver_for(
      &evaluator,
      3,
      json!({ "options": { "use_workflow_timezone": false } }),
    );
    assert!(!explicit_off.use_workflow_timezone(None));

    let explicit_on = resolver_for(
      &evaluator,
      1,
      json!({ "options": { "use_workflow_timezone": true } }),
    );
    assert!(explicit_on.use_workflow_timezone(None));
    assert!(!explicit_on.use_workflow_timezone(Some(false)));
  }

  #[test]
  fn test_resume_url() {
    let evaluator = MinijinjaEvaluator::new();
    let resolver = resolver_for(&evaluator, 1, json!({}));
    assert_eq!(
      resolver.resume_url().as_deref(),
      Some("https://host/form-waiting/t1")
    );
  }
}
