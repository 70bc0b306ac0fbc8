//! Items flowing between workflow nodes.

use formflow_config::RunMode;
use serde::{Deserialize, Serialize};

/// One structured unit of data flowing between nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
  /// Field values, keyed by field key.
  pub json: serde_json::Map<String, serde_json::Value>,
  /// Set on items produced by a form submission.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub submission: Option<SubmissionMeta>,
}

/// Metadata recorded alongside a captured submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionMeta {
  /// RFC 3339 timestamp in the resolved timezone.
  pub submitted_at: String,
  pub form_mode: RunMode,
}

/// The items handed from one node to the next.
pub type ItemBatch = Vec<Item>;

impl Item {
  /// Build an item from a JSON value. Non-object values are wrapped under
  /// a `data` key.
  pub fn from_json(value: serde_json::Value) -> Self {
    let json = match value {
      serde_json::Value::Object(map) => map,
      serde_json::Value::Null => serde_json::Map::new(),
      other => {
        let mut map = serde_json::Map::new();
        map.insert("data".to_string(), other);
        map
      }
    };
    Self {
      json,
      submission: None,
    }
  }

  pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
    self.json.get(key)
  }
}
