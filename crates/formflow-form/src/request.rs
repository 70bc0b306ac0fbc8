//! Inbound HTTP requests as seen by a form node.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
  Get,
  Head,
  Post,
  Put,
  Patch,
  Delete,
  Options,
}

impl fmt::Display for HttpMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      HttpMethod::Get => "GET",
      HttpMethod::Head => "HEAD",
      HttpMethod::Post => "POST",
      HttpMethod::Put => "PUT",
      HttpMethod::Patch => "PATCH",
      HttpMethod::Delete => "DELETE",
      HttpMethod::Options => "OPTIONS",
    };
    f.write_str(name)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method: {0}")]
pub struct UnsupportedMethod(pub String);

impl FromStr for HttpMethod {
  type Err = UnsupportedMethod;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_uppercase().as_str() {
      "GET" => Ok(HttpMethod::Get),
      "HEAD" => Ok(HttpMethod::Head),
      "POST" => Ok(HttpMethod::Post),
      "PUT" => Ok(HttpMethod::Put),
      "PATCH" => Ok(HttpMethod::Patch),
      "DELETE" => Ok(HttpMethod::Delete),
      "OPTIONS" => Ok(HttpMethod::Options),
      _ => Err(UnsupportedMethod(s.to_string())),
    }
  }
}

/// A request matched to a run's waiting token.
///
/// `body` holds the decoded form fields, keyed by field key. It is empty for
/// requests without a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundRequest {
  pub method: HttpMethod,
  #[serde(default)]
  pub body: serde_json::Map<String, serde_json::Value>,
}

impl InboundRequest {
  pub fn get() -> Self {
    Self {
      method: HttpMethod::Get,
      body: serde_json::Map::new(),
    }
  }

  /// A POST carrying `body`. Non-object bodies are treated as empty.
  pub fn post(body: serde_json::Value) -> Self {
    Self::with_body(HttpMethod::Post, body)
  }

  pub fn with_body(method: HttpMethod, body: serde_json::Value) -> Self {
    let body = match body {
      serde_json::Value::Object(map) => map,
      _ => serde_json::Map::new(),
    };
    Self { method, body }
  }
}
