//! Bulk Sink Client
//!
//! Sends one batch of action/document lines as a single `_bulk` request.
//!
//! # Outcome classification
//!
//! | outcome | handling |
//! |---------|----------|
//! | transport failure (network error, body that is not a bulk response) | retried with backoff, fatal once the budget is spent |
//! | any item with status >= 400 | fatal immediately, never retried |
//! | every item < 400 | success |
//!
//! A single rejected document aborts the whole run even though the other
//! documents of the batch were written. This is intentional: the bulk API
//! reports data problems (duplicate id, mapping conflict) per item inside a
//! 200 response, and continuing would leave the index silently incomplete.

use tracing::{debug, error};

use crate::batcher::encode_ndjson;
use crate::errors::{SinkError, TransportError};
use crate::models::{BulkRequestLine, BulkResponse, BulkResponseItem};
use crate::sink::report::BatchReport;
use crate::sink::retry::{RetryPolicy, retry_with_backoff};
use crate::sink::transport::{HttpMethod, HttpRequest, RawResponse, RequestBody, Transport};

/// Result of [`BulkSinkClient::send_batch`]
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOutcome {
  /// Every document of the batch was accepted
  Written(BatchReport),
  /// Dry run: nothing was sent
  Skipped {
    /// Documents that would have been sent
    documents: usize,
  },
}

impl BulkOutcome {
  /// Documents covered by the outcome
  pub fn documents(&self) -> usize {
    match self {
      BulkOutcome::Written(report) => report.documents,
      BulkOutcome::Skipped { documents } => *documents,
    }
  }
}

/// Client for the bulk endpoint of one cluster.
#[derive(Debug)]
pub struct BulkSinkClient<T> {
  transport: T,
  bulk_url: String,
  policy: RetryPolicy,
  dry_run: bool,
}

impl<T: Transport> BulkSinkClient<T> {
  /// Creates a client posting to `bulk_url`.
  pub fn new(transport: T, bulk_url: impl Into<String>, policy: RetryPolicy) -> Self {
    Self { transport, bulk_url: bulk_url.into(), policy, dry_run: false }
  }

  /// Enables or disables dry-run mode.
  #[must_use]
  pub fn with_dry_run(mut self, dry_run: bool) -> Self {
    self.dry_run = dry_run;
    self
  }

  /// Whether bulk sends are skipped
  pub fn is_dry_run(&self) -> bool {
    self.dry_run
  }

  /// Retry policy in use
  pub fn policy(&self) -> &RetryPolicy {
    &self.policy
  }

  /// Underlying transport
  pub fn transport(&self) -> &T {
    &self.transport
  }

  /// Sends a batch of alternating action/document lines as one bulk request.
  ///
  /// # Errors
  /// - `SinkError::RetriesExhausted`: transport failures outlasted the retry budget
  /// - `SinkError::ItemRejected`: an item reported status >= 400
  /// - `SinkError::MalformedItem`: an item has no numeric status
  /// - `SinkError::ItemOrderMismatch`: an item echoes the id of another document
  /// - `SinkError::ItemCountMismatch`: items returned != documents sent
  pub async fn send_batch(&self, lines: &[BulkRequestLine]) -> Result<BulkOutcome, SinkError> {
    let documents = lines.len() / 2;
    if self.dry_run {
      debug!(documents, "dry run: bulk request skipped");
      return Ok(BulkOutcome::Skipped { documents });
    }

    let body = encode_ndjson(lines)?;
    let bytes = body.len();

    let (attempts, response) = retry_with_backoff(
      &self.policy,
      |_: &TransportError| true,
      |attempt| {
        let request = HttpRequest::new(HttpMethod::Post, self.bulk_url.as_str())
          .with_body(RequestBody::ndjson(body.as_str()));
        async move {
          let raw = self.transport.send(request).await?;
          parse_bulk_response(&raw).map(|response| (attempt + 1, response))
        }
      },
    )
    .await
    .map_err(|failure| SinkError::RetriesExhausted {
      attempts: failure.attempts,
      last: failure.error,
    })?;

    let created = check_items(&response.items, lines)?;
    debug!(documents, bytes, attempts, took_ms = ?response.took, "bulk request accepted");

    Ok(BulkOutcome::Written(BatchReport { documents, created, attempts, took_ms: response.took }))
  }

  /// Sends a single request once, without retry.
  ///
  /// Any HTTP status is returned as a response; only transport failures are errors.
  pub async fn send_single(
    &self,
    method: HttpMethod,
    url: &str,
    body: Option<RequestBody>,
  ) -> Result<RawResponse, TransportError> {
    let mut request = HttpRequest::new(method, url);
    request.body = body;
    self.transport.send(request).await
  }
}

/// Parses a bulk response body.
///
/// A body that is not a JSON object with an `items` array (an error page, a
/// proxy message, a truncated body) is a transport-level failure.
pub fn parse_bulk_response(raw: &RawResponse) -> Result<BulkResponse, TransportError> {
  serde_json::from_str(&raw.body)
    .map_err(|e| TransportError::MalformedResponse { status: raw.status, reason: e.to_string() })
}

/// Checks every response item against the action lines sent; returns the
/// number of accepted items.
///
/// Items answer the document pairs in request order. An item echoing an `_id`
/// is compared with the action at the same position.
///
/// # Errors
/// The first item that is out of order, has status >= 400 or has no status,
/// then a count mismatch.
pub fn check_items(
  items: &[serde_json::Value],
  lines: &[BulkRequestLine],
) -> Result<usize, SinkError> {
  let expected: Vec<&str> = lines
    .iter()
    .filter_map(|line| match line {
      BulkRequestLine::Action(action) => Some(action.target().id.as_str()),
      BulkRequestLine::Document(_) => None,
    })
    .collect();

  for (item_index, value) in items.iter().enumerate() {
    let Some(item) = BulkResponseItem::from_value(value) else {
      return Err(SinkError::MalformedItem { item_index, payload: value.to_string() });
    };
    if let (Some(found), Some(&sent_id)) = (item.id.as_deref(), expected.get(item_index))
      && found != sent_id
    {
      error!(item_index, expected = sent_id, found, "bulk item out of order");
      return Err(SinkError::ItemOrderMismatch {
        item_index,
        expected: sent_id.to_string(),
        found: found.to_string(),
      });
    }
    if item.is_failure() {
      error!(item_index, status = item.status, action = %item.action, payload = %item.payload, "bulk item rejected");
      return Err(SinkError::ItemRejected {
        item_index,
        status: item.status,
        payload: item.payload.to_string(),
      });
    }
  }

  if items.len() != expected.len() {
    return Err(SinkError::ItemCountMismatch { sent: expected.len(), received: items.len() });
  }

  Ok(items.len())
}
