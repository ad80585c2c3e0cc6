//! Shared helpers for esloader integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Value as JsonValue, json};

use esloader::LoaderConfig;
use esloader::errors::TransportError;
use esloader::sink::{HttpMethod, HttpRequest, RawResponse, Transport};

pub const BASE_URL: &str = "http://es.test:9200";
pub const INDEX: &str = "people";

/// In-memory sink: answers queued responses first, then accepts everything.
///
/// Accepted bulk requests get one `201` item per action line.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
  script: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
  requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
  pub fn accepting() -> Self {
    Self::default()
  }

  pub fn with_script(script: Vec<Result<RawResponse, TransportError>>) -> Self {
    Self { script: Mutex::new(script.into()), requests: Mutex::default() }
  }

  pub fn requests(&self) -> Vec<HttpRequest> {
    self.requests.lock().unwrap().clone()
  }

  pub fn bulk_requests(&self) -> Vec<HttpRequest> {
    self.requests().into_iter().filter(|r| r.url.ends_with("/_bulk")).collect()
  }

  pub fn methods(&self) -> Vec<(HttpMethod, String)> {
    self.requests().into_iter().map(|r| (r.method, r.url)).collect()
  }
}

impl Transport for ScriptedTransport {
  async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
    self.requests.lock().unwrap().push(request.clone());
    if let Some(scripted) = self.script.lock().unwrap().pop_front() {
      return scripted;
    }
    Ok(accept(&request))
  }
}

fn accept(request: &HttpRequest) -> RawResponse {
  if !request.url.ends_with("/_bulk") {
    return RawResponse::new(200, r#"{"acknowledged":true}"#);
  }
  let lines = request.body.as_ref().map(|b| b.content.lines().count()).unwrap_or(0);
  let items: Vec<JsonValue> = (0..lines / 2).map(|_| json!({"create": {"status": 201}})).collect();
  RawResponse::new(200, json!({"took": 3, "errors": false, "items": items}).to_string())
}

/// Bulk response with the given per-item statuses
pub fn bulk_response(statuses: &[u16]) -> Result<RawResponse, TransportError> {
  let items: Vec<JsonValue> = statuses
    .iter()
    .map(|status| {
      let mut payload = json!({"_index": INDEX, "status": status});
      if *status >= 400 {
        payload["error"] = json!({"type": "version_conflict_engine_exception"});
      }
      json!({"create": payload})
    })
    .collect();
  let errors = statuses.iter().any(|s| *s >= 400);
  Ok(RawResponse::new(200, json!({"took": 1, "errors": errors, "items": items}).to_string()))
}

pub fn network_error() -> Result<RawResponse, TransportError> {
  Err(TransportError::Network {
    method: "POST".to_string(),
    url: format!("{BASE_URL}/_bulk"),
    reason: "connection reset by peer".to_string(),
  })
}

pub fn config() -> LoaderConfig {
  let mut config = LoaderConfig::default();
  config.sink.base_url = BASE_URL.to_string();
  config.sink.index = INDEX.to_string();
  config
}

/// Writes `records` as a JSON array file
pub fn write_array(dir: &Path, name: &str, records: &[JsonValue]) -> PathBuf {
  let path = dir.join(name);
  std::fs::write(&path, JsonValue::Array(records.to_vec()).to_string()).unwrap();
  path
}

/// Writes raw text
pub fn write_text(dir: &Path, name: &str, content: &str) -> PathBuf {
  let path = dir.join(name);
  std::fs::write(&path, content).unwrap();
  path
}

/// `count` records with ids `{prefix}0`, `{prefix}1`, ...
pub fn people(prefix: &str, count: usize) -> Vec<JsonValue> {
  (0..count).map(|i| json!({"id": format!("{prefix}{i}"), "n": i})).collect()
}

/// Parses an NDJSON body into its lines
pub fn body_lines(request: &HttpRequest) -> Vec<JsonValue> {
  let body = request.body.as_ref().expect("bulk request without body");
  assert!(body.content.ends_with('\n'), "bulk body must end with a newline");
  body.content.lines().map(|line| serde_json::from_str(line).unwrap()).collect()
}
