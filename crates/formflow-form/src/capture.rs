//! Capture of a submitted form into an item.
//!
//! Every declared field produces exactly one value in the item, keyed by the
//! field key. Submitted values are coerced to the field's declared kind:
//!
//! | kind                   | submitted                       | captured                    |
//! |------------------------|---------------------------------|-----------------------------|
//! | `text`, `email`        | `"  Ada "`                      | `"Ada"`                     |
//! | `password`, `textarea` | `" keep "`                      | `" keep "`                  |
//! | `number`               | `"42"` / `"19.5"`               | `42` / `19.5`               |
//! | `date`                 | `"2024-03-05"`                  | reformatted by `format_date`|
//! | `datetime`             | `"2024-03-05T10:30"`            | RFC 3339 in the capture zone|
//! | `dropdown` multiselect | `["a","b"]` / `"[\"a\",\"b\"]"` | `["a","b"]`                 |
//! | `file`                 | anything                        | unchanged                   |
//!
//! Body keys that match no field are ignored. Optional fields left out take
//! their default value, or null.

use std::fmt::Write;

use chrono::format::{Item as FormatItem, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use formflow_config::{FieldKind, FieldSpec, RunMode};
use serde_json::Value;

use crate::error::FormError;
use crate::item::{Item, SubmissionMeta};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Settings that affect how a submission is captured.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
  /// Interpret local date-times, and stamp the submission, in `timezone`
  /// rather than UTC.
  pub use_workflow_timezone: bool,
  pub timezone: FixedOffset,
  pub now: DateTime<Utc>,
  pub mode: RunMode,
}

impl CaptureSettings {
  fn zone(&self) -> FixedOffset {
    if self.use_workflow_timezone {
      self.timezone
    } else {
      Utc.fix()
    }
  }
}

/// Capture `body` against `fields`, producing one item.
pub fn capture_submission(
  node_id: &str,
  fields: &[FieldSpec],
  body: &serde_json::Map<String, Value>,
  settings: &CaptureSettings,
) -> Result<Item, FormError> {
  let zone = settings.zone();
  let mut json = serde_json::Map::with_capacity(fields.len());

  for field in fields {
    let submitted = body.get(&field.key).filter(|v| !is_blank(v));

    let value = match submitted {
      Some(value) => coerce_value(node_id, field, value, zone)?,
      None if field.required => {
        return Err(FormError::MissingRequiredField {
          node_id: node_id.to_string(),
          field: field.key.clone(),
        });
      }
      None => field.default_value.clone().unwrap_or(Value::Null),
    };

    json.insert(field.key.clone(), value);
  }

  Ok(Item {
    json,
    submission: Some(SubmissionMeta {
      submitted_at: settings.now.with_timezone(&zone).to_rfc3339(),
      form_mode: settings.mode,
    }),
  })
}

fn is_blank(value: &Value) -> bool {
  match value {
    Value::Null => true,
    Value::String(s) => s.trim().is_empty(),
    Value::Array(items) => items.is_empty(),
    _ => false,
  }
}

fn as_text(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

/// Coerce a single submitted value to the field's kind.
fn coerce_value(
  node_id: &str,
  field: &FieldSpec,
  value: &Value,
  zone: FixedOffset,
) -> Result<Value, FormError> {
  let invalid = |message: String| FormError::InvalidFieldValue {
    node_id: node_id.to_string(),
    field: field.key.clone(),
    message,
  };

  match field.kind {
    FieldKind::Text | FieldKind::Email => Ok(Value::String(as_text(value).trim().to_string())),

    FieldKind::Password | FieldKind::Textarea => Ok(Value::String(as_text(value))),

    FieldKind::Number => {
      if let Value::Number(n) = value {
        return Ok(Value::Number(n.clone()));
      }
      let text = as_text(value);
      let text = text.trim();
      if let Ok(n) = text.parse::<i64>() {
        return Ok(Value::Number(n.into()));
      }
      text
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| invalid(format!("expected number, got '{}'", text)))
    }

    FieldKind::Date => {
      let text = as_text(value);
      let date = NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|e| invalid(format!("expected date YYYY-MM-DD, got '{}': {}", text, e)))?;

      match field.format_date.as_deref().filter(|f| !f.is_empty()) {
        Some(format) => format_date(date, format)
          .map(Value::String)
          .map_err(invalid),
        None => Ok(Value::String(date.format(DATE_FORMAT).to_string())),
      }
    }

    FieldKind::Datetime => {
      let text = as_text(value);
      parse_datetime(text.trim(), zone)
        .map(|dt| Value::String(dt.to_rfc3339()))
        .ok_or_else(|| invalid(format!("expected date and time, got '{}'", text)))
    }

    FieldKind::Dropdown if field.multiselect => match value {
      Value::Array(items) => Ok(Value::Array(items.clone())),
      other => {
        let text = as_text(other);
        match serde_json::from_str::<Vec<Value>>(&text) {
          Ok(items) => Ok(Value::Array(items)),
          Err(_) => Ok(Value::Array(vec![Value::String(text)])),
        }
      }
    },

    FieldKind::Dropdown => Ok(Value::String(as_text(value))),

    FieldKind::File => Ok(value.clone()),
  }
}

/// Format `date` with a strftime pattern, rejecting malformed patterns
/// instead of panicking on them.
fn format_date(date: NaiveDate, format: &str) -> Result<String, String> {
  let items: Vec<FormatItem<'_>> = StrftimeItems::new(format).collect();
  if items.iter().any(|item| matches!(item, FormatItem::Error)) {
    return Err(format!("invalid date format '{}'", format));
  }

  let mut out = String::new();
  write!(out, "{}", date.format_with_items(items.iter()))
    .map_err(|_| format!("date format '{}' cannot be applied to a date", format))?;
  Ok(out)
}

/// Parse a submitted date-time. Values carrying an offset keep their instant;
/// local values are read in `zone`.
fn parse_datetime(text: &str, zone: FixedOffset) -> Option<DateTime<FixedOffset>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
    return Some(dt.with_timezone(&zone));
  }

  DATETIME_FORMATS
    .iter()
    .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    .and_then(|naive| zone.from_local_datetime(&naive).single())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn settings(use_workflow_timezone: bool) -> CaptureSettings {
    CaptureSettings {
      use_workflow_timezone,
      timezone: FixedOffset::east_opt(2 * 3600).unwrap(),
      now: Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap(),
      mode: RunMode::Production,
    }
  }

  fn body(value: Value) -> serde_json::Map<String, Value> {
    value.as_object().cloned().unwrap()
  }

  #[test]
  fn test_one_value_per_field() {
    let fields = vec![
      FieldSpec::new("name", "Name", FieldKind::Text).required(),
      FieldSpec::new("age", "Age", FieldKind::Number),
      FieldSpec::new("bio", "Bio", FieldKind::Textarea),
    ];

    let item = capture_submission(
      "step1",
      &fields,
      &body(json!({ "name": "  Ada ", "age": "36", "unrelated": "x" })),
      &settings(false),
    )
    .unwrap();

    assert_eq!(item.json.len(), 3);
    assert_eq!(item.json["name"], "Ada");
    assert_eq!(item.json["age"], 36);
    assert_eq!(item.json["bio"], Value::Null);
    assert!(item.get("unrelated").is_none());
  }

  #[test]
  fn test_missing_required_field() {
    let fields = vec![FieldSpec::new("email", "Email", FieldKind::Email).required()];

    for submitted in [json!({}), json!({ "email": "   " }), json!({ "email": null })] {
      let result = capture_submission("step2", &fields, &body(submitted), &settings(false));
      assert!(matches!(
        result,
        Err(FormError::MissingRequiredField { field, .. }) if field == "email"
      ));
    }
  }

  #[test]
  fn test_optional_field_default() {
    let mut field = FieldSpec::new("plan", "Plan", FieldKind::Dropdown);
    field.default_value = Some(json!("free"));

    let item = capture_submission("step", &[field], &body(json!({})), &settings(false)).unwrap();
    assert_eq!(item.json["plan"], "free");
  }

  #[test]
  fn test_number_coercion() {
    let fields = vec![FieldSpec::new("price", "Price", FieldKind::Number)];

    let item = capture_submission(
      "step",
      &fields,
      &body(json!({ "price": "19.5" })),
      &settings(false),
    )
    .unwrap();
    assert_eq!(item.json["price"], 19.5);

    let item = capture_submission("step", &fields, &body(json!({ "price": 7 })), &settings(false))
      .unwrap();
    assert_eq!(item.json["price"], 7);

    let result = capture_submission(
      "step",
      &fields,
      &body(json!({ "price": "cheap" })),
      &settings(false),
    );
    assert!(matches!(result, Err(FormError::InvalidFieldValue { .. })));
  }

  #[test]
  fn test_date_formatting() {
    let mut field = FieldSpec::new("birthday", "Birthday", FieldKind::Date);
    let submitted = body(json!({ "birthday": "2024-03-05" }));

    let plain = capture_submission("step", &[field.clone()], &submitted, &settings(false)).unwrap();
    assert_eq!(plain.json["birthday"], "2024-03-05");

    field.format_date = Some("%d/%m/%Y".to_string());
    let formatted =
      capture_submission("step", &[field.clone()], &submitted, &settings(false)).unwrap();
    assert_eq!(formatted.json["birthday"], "05/03/2024");

    let bad = capture_submission(
      "step",
      &[field],
      &body(json!({ "birthday": "March 5th" })),
      &settings(false),
    );
    assert!(matches!(bad, Err(FormError::InvalidFieldValue { .. })));
  }

  #[test]
  fn test_datetime_uses_resolved_zone() {
    let fields = vec![FieldSpec::new("slot", "Slot", FieldKind::Datetime)];
    let submitted = body(json!({ "slot": "2024-03-05T10:30" }));

    let utc = capture_submission("step", &fields, &submitted, &settings(false)).unwrap();
    assert_eq!(utc.json["slot"], "2024-03-05T10:30:00+00:00");

    let local = capture_submission("step", &fields, &submitted, &settings(true)).unwrap();
    assert_eq!(local.json["slot"], "2024-03-05T10:30:00+02:00");
  }

  #[test]
  fn test_submission_meta_uses_resolved_zone() {
    let utc = capture_submission("step", &[], &body(json!({})), &settings(false)).unwrap();
    let meta = utc.submission.unwrap();
    assert_eq!(meta.submitted_at, "2024-03-05T08:00:00+00:00");
    assert_eq!(meta.form_mode, RunMode::Production);

    let local = capture_submission("step", &[], &body(json!({})), &settings(true)).unwrap();
    assert_eq!(
      local.submission.unwrap().submitted_at,
      "2024-03-05T10:00:00+02:00"
    );
  }

  #[test]
  fn test_multiselect_dropdown() {
    let mut field = FieldSpec::new("tags", "Tags", FieldKind::Dropdown);
    field.multiselect = true;

    let from_array = capture_submission(
      "step",
      &[field.clone()],
      &body(json!({ "tags": ["a", "b"] })),
      &settings(false),
    )
    .unwrap();
    assert_eq!(from_array.json["tags"], json!(["a", "b"]));

    let from_string = capture_submission(
      "step",
      &[field],
      &body(json!({ "tags": "[\"c\"]" })),
      &settings(false),
    )
    .unwrap();
    assert_eq!(from_string.json["tags"], json!(["c"]));
  }

  #[test]
  fn test_text_kinds_trim_but_textarea_keeps() {
    let fields = vec![
      FieldSpec::new("email", "Email", FieldKind::Email),
      FieldSpec::new("note", "Note", FieldKind::Textarea),
      FieldSpec::new("upload", "Upload", FieldKind::File),
    ];

    let item = capture_submission(
      "step",
      &fields,
      &body(json!({ "email": " a@x.com ", "note": " hi ", "upload": { "name": "cv.pdf" } })),
      &settings(false),
    )
    .unwrap();

    assert_eq!(item.json["email"], "a@x.com");
    assert_eq!(item.json["note"], " hi ");
    assert_eq!(item.json["upload"], json!({ "name": "cv.pdf" }));
  }
}
