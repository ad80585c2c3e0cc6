//! Index Lifecycle Manager
//!
//! Delete-then-create of the target index before a load, and optional
//! bulk-friendly settings (refresh off, no replicas) restored afterwards.

use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use tracing::{debug, info};

use crate::errors::LifecycleError;
use crate::sink::{BulkSinkClient, HttpMethod, RawResponse, RequestBody, Transport};

/// Settings touched by [`IndexLifecycle::tune_for_bulk`], as read before the change.
///
/// `None` means the index did not set the value explicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexSettings {
  /// `index.refresh_interval`
  pub refresh_interval: Option<JsonValue>,
  /// `index.number_of_replicas`
  pub number_of_replicas: Option<JsonValue>,
}

impl IndexSettings {
  /// Settings body writing these values back; unset values become `null`.
  pub fn to_update_body(&self) -> JsonValue {
    json!({
      "index": {
        "refresh_interval": self.refresh_interval.clone().unwrap_or(JsonValue::Null),
        "number_of_replicas": self.number_of_replicas.clone().unwrap_or(JsonValue::Null),
      }
    })
  }

  /// Settings used while bulk loading
  pub fn bulk_profile() -> Self {
    Self { refresh_interval: Some(json!("-1")), number_of_replicas: Some(json!(0)) }
  }
}

/// Lifecycle operations on one index.
#[derive(Debug)]
pub struct IndexLifecycle<'a, T> {
  client: &'a BulkSinkClient<T>,
  index_name: String,
  index_url: String,
}

impl<'a, T: Transport> IndexLifecycle<'a, T> {
  /// Operations on `index_name`, reachable at `index_url`.
  pub fn new(
    client: &'a BulkSinkClient<T>,
    index_name: impl Into<String>,
    index_url: impl Into<String>,
  ) -> Self {
    Self { client, index_name: index_name.into(), index_url: index_url.into() }
  }

  /// URL of the index
  pub fn index_url(&self) -> &str {
    &self.index_url
  }

  /// Deletes the index and creates it again, with `mapping` as the creation body.
  ///
  /// A 404 on delete (the index does not exist yet) is accepted.
  ///
  /// # Errors
  /// - `LifecycleError::Transport`: a request did not complete
  /// - `LifecycleError::UnexpectedStatus`: delete answered neither 2xx nor 404, or create was not 2xx
  pub async fn recreate(&self, mapping: Option<&str>) -> Result<(), LifecycleError> {
    let deleted = self.request(HttpMethod::Delete, &self.index_url, None).await?;
    match deleted.status {
      404 => info!(index = %self.index_name, "index does not exist, nothing to delete"),
      _ if deleted.is_success() => info!(index = %self.index_name, "index deleted"),
      _ => return Err(self.unexpected(HttpMethod::Delete, &self.index_url, deleted)),
    }

    let body = mapping.map(RequestBody::json);
    let created = self.request(HttpMethod::Put, &self.index_url, body).await?;
    if !created.is_success() {
      return Err(self.unexpected(HttpMethod::Put, &self.index_url, created));
    }
    info!(index = %self.index_name, with_mapping = mapping.is_some(), "index created");
    Ok(())
  }

  /// Reads the current refresh interval and replica count, then disables
  /// refresh and drops replicas for the duration of the load.
  ///
  /// Returns the settings to hand to [`IndexLifecycle::restore_settings`].
  pub async fn tune_for_bulk(&self) -> Result<IndexSettings, LifecycleError> {
    let settings_url = self.settings_url();
    let response = self.request(HttpMethod::Get, &settings_url, None).await?;
    if !response.is_success() {
      return Err(self.unexpected(HttpMethod::Get, &settings_url, response));
    }
    let previous = parse_index_settings(&self.index_name, &response.body)?;
    debug!(index = %self.index_name, ?previous, "captured index settings");

    self.put_settings(&IndexSettings::bulk_profile()).await?;
    info!(index = %self.index_name, "refresh disabled and replicas set to 0 for bulk load");
    Ok(previous)
  }

  /// Writes back settings captured by [`IndexLifecycle::tune_for_bulk`].
  pub async fn restore_settings(&self, previous: &IndexSettings) -> Result<(), LifecycleError> {
    self.put_settings(previous).await?;
    info!(index = %self.index_name, "index settings restored");
    Ok(())
  }

  async fn put_settings(&self, settings: &IndexSettings) -> Result<(), LifecycleError> {
    let settings_url = self.settings_url();
    let body = RequestBody::json(settings.to_update_body().to_string());
    let response = self.request(HttpMethod::Put, &settings_url, Some(body)).await?;
    if !response.is_success() {
      return Err(self.unexpected(HttpMethod::Put, &settings_url, response));
    }
    Ok(())
  }

  async fn request(
    &self,
    method: HttpMethod,
    url: &str,
    body: Option<RequestBody>,
  ) -> Result<RawResponse, LifecycleError> {
    debug!(%method, url, "index lifecycle request");
    Ok(self.client.send_single(method, url, body).await?)
  }

  fn settings_url(&self) -> String {
    format!("{}/_settings", self.index_url)
  }

  fn unexpected(
    &self,
    method: HttpMethod,
    url: &str,
    response: RawResponse,
  ) -> LifecycleError {
    LifecycleError::UnexpectedStatus {
      method: method.to_string(),
      url: url.to_string(),
      status: response.status,
      body: response.body,
    }
  }
}

/// Extracts refresh interval and replica count from a `GET _settings` body.
///
/// The body is keyed by the concrete index name, which differs from the
/// requested name when an alias was used; a single entry is taken as is.
pub fn parse_index_settings(index: &str, body: &str) -> Result<IndexSettings, LifecycleError> {
  let invalid = |reason: String| LifecycleError::InvalidSettings { index: index.to_string(), reason };

  let value: JsonValue = serde_json::from_str(body).map_err(|e| invalid(e.to_string()))?;
  let indices = value.as_object().ok_or_else(|| invalid("response is not an object".into()))?;
  let entry = indices
    .get(index)
    .or_else(|| if indices.len() == 1 { indices.values().next() } else { None })
    .ok_or_else(|| invalid(format!("{} indices in response, none named {index}", indices.len())))?;
  let settings = entry
    .pointer("/settings/index")
    .and_then(JsonValue::as_object)
    .ok_or_else(|| invalid("missing settings.index".into()))?;

  Ok(IndexSettings {
    refresh_interval: settings.get("refresh_interval").cloned(),
    number_of_replicas: settings.get("number_of_replicas").cloned(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::VecDeque;
  use std::sync::Mutex;

  use crate::errors::TransportError;
  use crate::sink::{HttpRequest, RetryPolicy};

  #[derive(Default)]
  struct Scripted {
    responses: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
  }

  impl Scripted {
    fn new(responses: Vec<Result<RawResponse, TransportError>>) -> Self {
      Self { responses: Mutex::new(responses.into()), requests: Mutex::default() }
    }
  }

  impl Transport for Scripted {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
      self.requests.lock().unwrap().push(request);
      self.responses.lock().unwrap().pop_front().expect("unexpected request")
    }
  }

  fn client(responses: Vec<Result<RawResponse, TransportError>>) -> BulkSinkClient<Scripted> {
    BulkSinkClient::new(Scripted::new(responses), "http://es:9200/_bulk", RetryPolicy::no_retry())
  }

  fn requests(client: &BulkSinkClient<Scripted>) -> Vec<(HttpMethod, String, Option<String>)> {
    client
      .transport()
      .requests
      .lock()
      .unwrap()
      .iter()
      .map(|r| (r.method, r.url.clone(), r.body.as_ref().map(|b| b.content.clone())))
      .collect()
  }

  #[tokio::test]
  async fn recreate_deletes_then_creates_with_mapping() {
    let client =
      client(vec![Ok(RawResponse::new(200, "{}")), Ok(RawResponse::new(200, "{}"))]);
    let lifecycle = IndexLifecycle::new(&client, "people", "http://es:9200/people");

    lifecycle.recreate(Some(r#"{"mappings":{}}"#)).await.unwrap();

    assert_eq!(
      requests(&client),
      vec![
        (HttpMethod::Delete, "http://es:9200/people".to_string(), None),
        (HttpMethod::Put, "http://es:9200/people".to_string(), Some(r#"{"mappings":{}}"#.into())),
      ]
    );
  }

  #[tokio::test]
  async fn recreate_accepts_missing_index() {
    let client = client(vec![
      Ok(RawResponse::new(404, r#"{"error":"index_not_found_exception"}"#)),
      Ok(RawResponse::new(200, "{}")),
    ]);
    let lifecycle = IndexLifecycle::new(&client, "people", "http://es:9200/people");
    lifecycle.recreate(None).await.unwrap();
    assert_eq!(requests(&client)[1].2, None);
  }

  #[tokio::test]
  async fn recreate_fails_on_delete_error_status() {
    let client = client(vec![Ok(RawResponse::new(403, "forbidden"))]);
    let lifecycle = IndexLifecycle::new(&client, "people", "http://es:9200/people");
    let err = lifecycle.recreate(None).await.unwrap_err();
    assert!(matches!(
      err,
      LifecycleError::UnexpectedStatus { ref method, status: 403, .. } if method == "DELETE"
    ));
    assert_eq!(requests(&client).len(), 1);
  }

  #[tokio::test]
  async fn recreate_fails_when_create_is_rejected() {
    let client = client(vec![
      Ok(RawResponse::new(200, "{}")),
      Ok(RawResponse::new(400, "mapper_parsing_exception")),
    ]);
    let lifecycle = IndexLifecycle::new(&client, "people", "http://es:9200/people");
    let err = lifecycle.recreate(Some("{}")).await.unwrap_err();
    assert!(err.to_string().contains("mapper_parsing_exception"));
  }

  #[tokio::test]
  async fn recreate_propagates_transport_failure() {
    let client = client(vec![Err(TransportError::Network {
      method: "DELETE".into(),
      url: "http://es:9200/people".into(),
      reason: "connection refused".into(),
    })]);
    let lifecycle = IndexLifecycle::new(&client, "people", "http://es:9200/people");
    assert!(matches!(lifecycle.recreate(None).await, Err(LifecycleError::Transport(_))));
  }

  #[tokio::test]
  async fn tune_then_restore_round_trips_settings() {
    let settings = r#"{"people":{"settings":{"index":{"refresh_interval":"30s","number_of_shards":"1"}}}}"#;
    let client = client(vec![
      Ok(RawResponse::new(200, settings)),
      Ok(RawResponse::new(200, r#"{"acknowledged":true}"#)),
      Ok(RawResponse::new(200, r#"{"acknowledged":true}"#)),
    ]);
    let lifecycle = IndexLifecycle::new(&client, "people", "http://es:9200/people");

    let previous = lifecycle.tune_for_bulk().await.unwrap();
    assert_eq!(previous.refresh_interval, Some(json!("30s")));
    assert_eq!(previous.number_of_replicas, None);
    lifecycle.restore_settings(&previous).await.unwrap();

    let sent = requests(&client);
    assert_eq!(sent[0].0, HttpMethod::Get);
    assert_eq!(sent[0].1, "http://es:9200/people/_settings");
    let tuned: JsonValue = serde_json::from_str(sent[1].2.as_deref().unwrap()).unwrap();
    assert_eq!(tuned, json!({"index": {"refresh_interval": "-1", "number_of_replicas": 0}}));
    let restored: JsonValue = serde_json::from_str(sent[2].2.as_deref().unwrap()).unwrap();
    assert_eq!(restored, json!({"index": {"refresh_interval": "30s", "number_of_replicas": null}}));
  }

  #[test]
  fn settings_of_aliased_index_are_found() {
    let body = r#"{"people-v2":{"settings":{"index":{"number_of_replicas":"2"}}}}"#;
    let settings = parse_index_settings("people", body).unwrap();
    assert_eq!(settings.number_of_replicas, Some(json!("2")));
  }

  #[test]
  fn unreadable_settings_are_rejected() {
    assert!(matches!(
      parse_index_settings("people", "[]"),
      Err(LifecycleError::InvalidSettings { .. })
    ));
    assert!(matches!(
      parse_index_settings("people", r#"{"people":{}}"#),
      Err(LifecycleError::InvalidSettings { .. })
    ));
  }
}
