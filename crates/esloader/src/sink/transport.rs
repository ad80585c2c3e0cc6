//! HTTP transport seam
//!
//! The loader only needs `send(method, url, body) -> response`. [`Transport`]
//! captures that; [`ReqwestTransport`] is the production implementation and
//! tests plug in scripted ones.

use std::future::Future;
use std::time::Duration;

use tracing::trace;

use crate::errors::TransportError;

/// Content type of bulk request bodies
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Content type of every other request body
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP methods used against the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
  /// GET
  Get,
  /// PUT
  Put,
  /// POST
  Post,
  /// DELETE
  Delete,
}

impl HttpMethod {
  /// Method name as sent on the wire
  pub fn as_str(&self) -> &'static str {
    match self {
      HttpMethod::Get => "GET",
      HttpMethod::Put => "PUT",
      HttpMethod::Post => "POST",
      HttpMethod::Delete => "DELETE",
    }
  }
}

impl std::fmt::Display for HttpMethod {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Request body with its content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody {
  /// Serialised body
  pub content: String,
  /// Value of the `Content-Type` header
  pub content_type: &'static str,
}

impl RequestBody {
  /// JSON body
  pub fn json(content: impl Into<String>) -> Self {
    Self { content: content.into(), content_type: JSON_CONTENT_TYPE }
  }

  /// Newline-delimited JSON body
  pub fn ndjson(content: impl Into<String>) -> Self {
    Self { content: content.into(), content_type: NDJSON_CONTENT_TYPE }
  }
}

/// A request to the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
  /// HTTP method
  pub method: HttpMethod,
  /// Absolute URL
  pub url: String,
  /// Optional body
  pub body: Option<RequestBody>,
}

impl HttpRequest {
  /// Request without a body
  pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
    Self { method, url: url.into(), body: None }
  }

  /// Attaches a body
  #[must_use]
  pub fn with_body(mut self, body: RequestBody) -> Self {
    self.body = Some(body);
    self
  }
}

/// Status and body of a sink response, whatever the status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
  /// HTTP status code
  pub status: u16,
  /// Response body as text
  pub body: String,
}

impl RawResponse {
  /// Builds a response
  pub fn new(status: u16, body: impl Into<String>) -> Self {
    Self { status, body: body.into() }
  }

  /// 2xx status
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Capability to send one HTTP request to the sink.
///
/// An `Err` means the request did not complete (connection, timeout, I/O);
/// any HTTP status, including 4xx/5xx, is an `Ok(RawResponse)`.
pub trait Transport: Send + Sync {
  /// Sends `request` and returns the raw response.
  fn send(
    &self,
    request: HttpRequest,
  ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

/// Basic auth credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
  /// User name
  pub username: String,
  /// Password
  pub password: Option<String>,
}

impl std::fmt::Debug for Credentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Credentials")
      .field("username", &self.username)
      .field("password", &self.password.as_ref().map(|_| "***"))
      .finish()
  }
}

/// [`Transport`] backed by a `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
  client: reqwest::Client,
  credentials: Option<Credentials>,
}

impl ReqwestTransport {
  /// Builds a client with the given request timeout and optional basic auth.
  ///
  /// # Errors
  /// `TransportError::ClientBuild` when the TLS backend cannot be initialised.
  pub fn new(timeout: Duration, credentials: Option<Credentials>) -> Result<Self, TransportError> {
    let client = reqwest::Client::builder()
      .connect_timeout(Duration::from_secs(10))
      .timeout(timeout)
      .build()
      .map_err(|e| TransportError::ClientBuild { reason: e.to_string() })?;
    Ok(Self { client, credentials })
  }

  fn method(method: HttpMethod) -> reqwest::Method {
    match method {
      HttpMethod::Get => reqwest::Method::GET,
      HttpMethod::Put => reqwest::Method::PUT,
      HttpMethod::Post => reqwest::Method::POST,
      HttpMethod::Delete => reqwest::Method::DELETE,
    }
  }
}

impl Transport for ReqwestTransport {
  async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
    let HttpRequest { method, url, body } = request;
    let network_error = |e: reqwest::Error| TransportError::Network {
      method: method.to_string(),
      url: url.clone(),
      reason: e.to_string(),
    };

    let mut builder = self.client.request(Self::method(method), &url);
    if let Some(credentials) = &self.credentials {
      builder = builder.basic_auth(&credentials.username, credentials.password.as_ref());
    }
    if let Some(body) = body {
      trace!(%method, %url, bytes = body.content.len(), "sending request");
      builder = builder.header(reqwest::header::CONTENT_TYPE, body.content_type).body(body.content);
    }

    let response = builder.send().await.map_err(network_error)?;
    let status = response.status().as_u16();
    let body = response.text().await.map_err(network_error)?;
    Ok(RawResponse { status, body })
  }
}
