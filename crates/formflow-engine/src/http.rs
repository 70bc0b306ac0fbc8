use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Response to an inbound request on a resume URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
  pub status: u16,
  pub content_type: String,
  pub body: String,
  /// Target of a redirect.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub location: Option<String>,
}

impl HttpResponse {
  pub fn html(body: String) -> Self {
    Self {
      status: 200,
      content_type: CONTENT_TYPE_HTML.to_string(),
      body,
      location: None,
    }
  }

  /// `303 See Other`, sending the browser on with a GET.
  pub fn redirect(location: String) -> Self {
    Self {
      status: 303,
      content_type: CONTENT_TYPE_HTML.to_string(),
      body: String::new(),
      location: Some(location),
    }
  }

  pub fn json(status: u16, value: &serde_json::Value) -> Self {
    Self {
      status,
      content_type: CONTENT_TYPE_JSON.to_string(),
      body: value.to_string(),
      location: None,
    }
  }

  /// A generic failure response. Error details stay in the logs and the run
  /// record; the end user only learns the broad cause.
  pub fn from_error(error: &EngineError) -> Self {
    let status = error.status_code();
    let message = match status {
      404 => "This form is no longer available",
      405 => "Method not allowed",
      409 => "This form has already been submitted",
      _ => "Problem loading form",
    };
    Self::json(status, &serde_json::json!({ "error": message }))
  }

  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}
