//! Documents returned to the end user, and their HTML rendering.

use formflow_config::FieldSpec;
use minijinja::Environment;
use serde::{Deserialize, Serialize};

use crate::error::FormError;

const FORM_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{{ title }}</title></head>
<body>
{% if test_mode %}<p class="test-mode">This is a test form. Submissions will not be used in production.</p>{% endif %}
<h1>{{ title }}</h1>
{% if description %}<p class="description">{{ description }}</p>{% endif %}
<form method="post"{% if action.continue_to %} action="{{ action.continue_to }}"{% endif %}>
{% for field in fields %}
<label for="{{ field.key }}">{{ field.label }}{% if field.required %} *{% endif %}</label>
{% if field.input_type == "textarea" %}
<textarea id="{{ field.key }}" name="{{ field.key }}"{% if field.placeholder %} placeholder="{{ field.placeholder }}"{% endif %}{% if field.required %} required{% endif %}></textarea>
{% elif field.input_type == "select" %}
<select id="{{ field.key }}" name="{{ field.key }}"{% if field.multiselect %} multiple{% endif %}{% if field.required %} required{% endif %}>
{% for option in field.options %}<option value="{{ option }}">{{ option }}</option>{% endfor %}
</select>
{% else %}
<input type="{{ field.input_type }}" id="{{ field.key }}" name="{{ field.key }}"{% if field.placeholder %} placeholder="{{ field.placeholder }}"{% endif %}{% if field.required %} required{% endif %}>
{% endif %}
{% endfor %}
<button type="submit">{{ button_label }}</button>
</form>
{% if append_attribution %}<footer>Form automated with formflow</footer>{% endif %}
</body>
</html>
"#;

const COMPLETION_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{{ form_title }}</title></head>
<body>
<h1>{{ title }}</h1>
{% if message %}<p class="message">{{ message }}</p>{% endif %}
{% if append_attribution %}<footer>Form automated with formflow</footer>{% endif %}
</body>
</html>
"#;

/// Where a rendered form posts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormAction {
  /// Post back to the URL the form was served from.
  Submit,
  /// Another page follows; post to the run's resume URL, which answers by
  /// redirecting to the next page.
  ContinueTo(String),
}

/// A field as presented to the end user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedField {
  pub key: String,
  pub label: String,
  /// HTML control: an `<input>` type, `textarea` or `select`.
  pub input_type: String,
  pub required: bool,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub options: Vec<String>,
  #[serde(default)]
  pub multiselect: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub placeholder: Option<String>,
}

impl From<&FieldSpec> for RenderedField {
  fn from(field: &FieldSpec) -> Self {
    Self {
      key: field.key.clone(),
      label: field.label.clone(),
      input_type: field.kind.input_type().to_string(),
      required: field.required,
      options: field.options.clone(),
      multiselect: field.multiselect,
      placeholder: field.placeholder.clone(),
    }
  }
}

/// A form page, fully resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDocument {
  pub title: String,
  pub description: String,
  pub fields: Vec<RenderedField>,
  pub button_label: String,
  pub action: FormAction,
  pub append_attribution: bool,
  /// Cosmetic only: marks forms served by a test run.
  pub test_mode: bool,
}

/// The closing screen of a form chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionDocument {
  pub title: String,
  pub message: String,
  /// Page title of the document, inherited from the form title.
  pub form_title: String,
  pub append_attribution: bool,
}

/// What the engine sends back for a resume candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeResponse {
  Form(FormDocument),
  Completion(CompletionDocument),
  /// A submission was captured. The body is left to the engine.
  Acknowledge,
  /// A submission was captured and another page follows. The engine sends
  /// the requester on to it.
  Continue,
}

impl NodeResponse {
  /// Render the response as HTML. Acknowledgments have no document.
  pub fn to_html(&self, node_id: &str) -> Result<Option<String>, FormError> {
    match self {
      NodeResponse::Form(doc) => render("form.html", FORM_TEMPLATE, doc, node_id).map(Some),
      NodeResponse::Completion(doc) => {
        render("completion.html", COMPLETION_TEMPLATE, doc, node_id).map(Some)
      }
      NodeResponse::Acknowledge | NodeResponse::Continue => Ok(None),
    }
  }
}

/// Render `context` with a template named `*.html`, so values are escaped.
fn render<S: Serialize>(
  name: &'static str,
  source: &'static str,
  context: &S,
  node_id: &str,
) -> Result<String, FormError> {
  let render_error = |e: minijinja::Error| FormError::Render {
    node_id: node_id.to_string(),
    message: e.to_string(),
  };

  let mut env = Environment::new();
  env.add_template(name, source).map_err(render_error)?;
  env
    .get_template(name)
    .and_then(|template| template.render(context))
    .map_err(render_error)
}

#[cfg(test)]
mod tests {
  use super::*;
  use formflow_config::FieldKind;

  fn document(action: FormAction) -> FormDocument {
    let mut plan = FieldSpec::new("plan", "Plan", FieldKind::Dropdown);
    plan.options = vec!["free".to_string(), "pro".to_string()];

    FormDocument {
      title: "Signup <beta>".to_string(),
      description: String::new(),
      fields: vec![
        RenderedField::from(&FieldSpec::new("email", "Email", FieldKind::Email).required()),
        RenderedField::from(&plan),
      ],
      button_label: "Next".to_string(),
      action,
      append_attribution: true,
      test_mode: false,
    }
  }

  #[test]
  fn test_form_html() {
    let html = NodeResponse::Form(document(FormAction::Submit))
      .to_html("step1")
      .unwrap()
      .unwrap();

    assert!(html.contains("Signup &lt;beta&gt;"));
    assert!(html.contains(r#"type="email""#));
    assert!(html.contains(r#"<option value="pro">"#));
    assert!(html.contains("Next</button>"));
    assert!(html.contains("<footer>"));
    assert!(!html.contains("action="));
    assert!(!html.contains("test-mode"));
  }

  #[test]
  fn test_continue_action() {
    let html = NodeResponse::Form(document(FormAction::ContinueTo(
      "https://host/form-waiting/t1".to_string(),
    )))
    .to_html("step1")
    .unwrap()
    .unwrap();

    assert!(html.contains("action="));
    assert!(html.contains("form-waiting"));
  }

  #[test]
  fn test_completion_html() {
    let doc = CompletionDocument {
      title: "Form Submitted".to_string(),
      message: "Thanks!".to_string(),
      form_title: "Signup".to_string(),
      append_attribution: false,
    };
    let html = NodeResponse::Completion(doc).to_html("done").unwrap().unwrap();

    assert!(html.contains("<title>Signup</title>"));
    assert!(html.contains("<h1>Form Submitted</h1>"));
    assert!(html.contains("Thanks!"));
    assert!(!html.contains("<footer>"));
  }

  #[test]
  fn test_acknowledge_has_no_document() {
    assert!(NodeResponse::Acknowledge.to_html("step1").unwrap().is_none());
    assert!(NodeResponse::Continue.to_html("step1").unwrap().is_none());
  }
}
