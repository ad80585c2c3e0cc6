//! Data Model Definition
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// One document read from an input file.
///
/// Field values stay dynamically typed; only the id field is ever inspected.
pub type Record = Map<String, JsonValue>;

/// Name of the JSON type of a value, used in error messages
pub fn json_type_name(value: &JsonValue) -> &'static str {
  match value {
    JsonValue::Null => "null",
    JsonValue::Bool(_) => "bool",
    JsonValue::Number(_) => "number",
    JsonValue::String(_) => "string",
    JsonValue::Array(_) => "array",
    JsonValue::Object(_) => "object",
  }
}

/// Target of a `create` action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTarget {
  /// Target index
  #[serde(rename = "_index")]
  pub index: String,

  /// Document type / category label
  #[serde(rename = "_type")]
  pub doc_type: String,

  /// Document id taken from the record
  #[serde(rename = "_id")]
  pub id: String,
}

/// Action descriptor preceding each document in a bulk body.
///
/// Serialises externally tagged: `{"create":{"_index":..,"_type":..,"_id":..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
  /// Create the document; the sink rejects an id that already exists
  Create(ActionTarget),
}

impl BulkAction {
  /// Builds a `create` action
  pub fn create(
    index: impl Into<String>,
    doc_type: impl Into<String>,
    id: impl Into<String>,
  ) -> Self {
    Self::Create(ActionTarget { index: index.into(), doc_type: doc_type.into(), id: id.into() })
  }

  /// Action name as it appears in the wire format and in response items
  pub fn name(&self) -> &'static str {
    match self {
      BulkAction::Create(_) => "create",
    }
  }

  /// Target of the action
  pub fn target(&self) -> &ActionTarget {
    match self {
      BulkAction::Create(target) => target,
    }
  }
}

/// One line of a bulk request body
///
/// Lines always come in `Action`, `Document` pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BulkRequestLine {
  /// Action line
  Action(BulkAction),
  /// Document line: the record's full JSON body
  Document(Record),
}

impl BulkRequestLine {
  /// Returns true for action lines
  pub fn is_action(&self) -> bool {
    matches!(self, BulkRequestLine::Action(_))
  }
}

/// Top level shape of a bulk response
///
/// `items` is required: a body without it is not a bulk response.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkResponse {
  /// Time taken by the sink in milliseconds
  #[serde(default)]
  pub took: Option<u64>,

  /// Whether any item failed
  #[serde(default)]
  pub errors: bool,

  /// One entry per document pair, in request order
  pub items: Vec<JsonValue>,
}

/// Outcome of a single document inside a bulk response
#[derive(Debug, Clone, PartialEq)]
pub struct BulkResponseItem {
  /// Action name the item is keyed by (e.g. "create")
  pub action: String,

  /// HTTP-like status for this document
  pub status: u16,

  /// Document id echoed by the sink, when present
  pub id: Option<String>,

  /// Full item payload as returned by the sink
  pub payload: JsonValue,
}

impl BulkResponseItem {
  /// Reads an item of the form `{"<action>": {"status": N, ...}}`.
  ///
  /// Returns `None` when the item is not an object with a single action key
  /// carrying a numeric status.
  pub fn from_value(value: &JsonValue) -> Option<Self> {
    let (action, body) = value.as_object()?.iter().next()?;
    let status = body.get("status")?.as_u64()?;
    let status = u16::try_from(status).ok()?;
    let id = body.get("_id").and_then(JsonValue::as_str).map(str::to_owned);
    Some(Self { action: action.clone(), status, id, payload: value.clone() })
  }

  /// Status >= 400 means the document was not written
  pub fn is_failure(&self) -> bool {
    self.status >= 400
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn create_action_serialises_in_wire_shape() {
    let action = BulkAction::create("people", "person", "p-1");
    let line = serde_json::to_string(&BulkRequestLine::Action(action)).unwrap();
    assert_eq!(line, r#"{"create":{"_index":"people","_type":"person","_id":"p-1"}}"#);
  }

  #[test]
  fn document_line_serialises_as_the_record() {
    let mut record = Record::new();
    record.insert("id".to_string(), json!("a"));
    record.insert("age".to_string(), json!(42));
    let line = serde_json::to_string(&BulkRequestLine::Document(record)).unwrap();
    assert_eq!(line, r#"{"id":"a","age":42}"#);
  }

  #[test]
  fn response_item_reads_action_and_status() {
    let value = json!({"create": {"_id": "x", "status": 201}});
    let item = BulkResponseItem::from_value(&value).unwrap();
    assert_eq!(item.action, "create");
    assert_eq!(item.status, 201);
    assert_eq!(item.id.as_deref(), Some("x"));
    assert!(!item.is_failure());
  }

  #[test]
  fn response_item_without_status_is_rejected() {
    assert!(BulkResponseItem::from_value(&json!({"create": {"_id": "x"}})).is_none());
    assert!(BulkResponseItem::from_value(&json!("create")).is_none());
    assert!(BulkResponseItem::from_value(&json!({})).is_none());
  }

  #[test]
  fn bulk_response_requires_items() {
    assert!(serde_json::from_str::<BulkResponse>(r#"{"error":"boom","status":500}"#).is_err());
    let ok: BulkResponse = serde_json::from_str(r#"{"took":3,"errors":false,"items":[]}"#).unwrap();
    assert!(ok.items.is_empty());
  }

  #[test]
  fn json_type_names() {
    assert_eq!(json_type_name(&json!(1)), "number");
    assert_eq!(json_type_name(&json!(null)), "null");
    assert_eq!(json_type_name(&json!([1])), "array");
  }
}
