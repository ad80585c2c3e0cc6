//! エラー定義
//!
//! Every failure the loader can hit is fatal or retried a bounded number of times;
//! the variants carry enough context (file, record, batch, item) to resume by re-running.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Configuration (`LoaderConfig`) errors
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum ConfigError {
  /// sink.base_url is empty
  #[error("sink.base_url must not be empty")]
  EmptyBaseUrl,

  /// sink.base_url does not look like an HTTP URL
  #[error("sink.base_url must start with http:// or https://: actual={url}")]
  InvalidBaseUrl {
    /// The rejected URL
    url: String,
  },

  /// sink.index is empty or not a valid index name
  #[error("sink.index is not a valid index name: {name:?} ({reason})")]
  InvalidIndexName {
    /// The rejected name
    name: String,
    /// Why the name was rejected
    reason: &'static str,
  },

  /// import.batch_size < 1
  #[error("import.batch_size must be at least 1: actual={actual}")]
  InvalidBatchSize {
    /// Value found in the configuration
    actual: usize,
  },

  /// import.id_field is empty
  #[error("import.id_field must not be empty")]
  EmptyIdField,

  /// import.progress_interval < 1
  #[error("import.progress_interval must be at least 1: actual={actual}")]
  InvalidProgressInterval {
    /// Value found in the configuration
    actual: usize,
  },

  /// retry.backoff_base < 1
  #[error("retry.backoff_base must be at least 1: actual={actual}")]
  InvalidBackoffBase {
    /// Value found in the configuration
    actual: u64,
  },

  /// retry.max_retries is above the allowed maximum
  #[error("retry.max_retries must be at most {max}: actual={actual}")]
  TooManyRetries {
    /// Allowed maximum
    max: u32,
    /// Value found in the configuration
    actual: u32,
  },

  /// A password was given without a username
  #[error("sink.password is set but sink.username is missing")]
  PasswordWithoutUsername,
}

/// Record reader errors (file level and line level)
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum ReaderError {
  /// The input file could not be opened or read
  #[error("failed to read input file: path={path:?}, error={source}")]
  Io {
    /// Input file
    path: PathBuf,
    /// Underlying I/O error
    #[source]
    source: Arc<io::Error>,
  },

  /// The file (array mode) or a line (newline-delimited mode) is not valid JSON
  #[error("malformed JSON: path={path:?}, line={line:?}, error={source}")]
  Parse {
    /// Input file
    path: PathBuf,
    /// 1-based line number in newline-delimited mode, `None` for array mode
    line: Option<usize>,
    /// Underlying JSON error
    #[source]
    source: Arc<serde_json::Error>,
  },

  /// A newline-delimited line exceeds the line buffer limit
  #[error("line exceeds {limit} bytes: path={path:?}, line={line}")]
  LineTooLong {
    /// Input file
    path: PathBuf,
    /// 1-based line number
    line: usize,
    /// Limit in bytes
    limit: usize,
  },

  /// A record is valid JSON but not a JSON object
  #[error("record is not a JSON object: path={path:?}, record={position}, found={found}")]
  NotAnObject {
    /// Input file
    path: PathBuf,
    /// 0-based record position within the file
    position: usize,
    /// JSON type that was found instead
    found: &'static str,
  },
}

/// Identifier field errors raised while building bulk lines
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
  /// The id field is absent from a record
  #[error("record {position} has no id field {field:?}")]
  MissingIdField {
    /// Name of the id field
    field: String,
    /// 0-based record position within the file
    position: usize,
  },

  /// The id field is present but not a string
  #[error("record {position} id field {field:?} must be a string, found {found}")]
  IdNotString {
    /// Name of the id field
    field: String,
    /// 0-based record position within the file
    position: usize,
    /// JSON type that was found instead
    found: &'static str,
  },
}

/// Transport level failures; the only retryable kind
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportError {
  /// The HTTP client could not be constructed
  #[error("failed to build HTTP client: {reason}")]
  ClientBuild {
    /// Reason reported by the client library
    reason: String,
  },

  /// Connection, timeout or I/O failure while talking to the sink
  #[error("{method} {url} failed: {reason}")]
  Network {
    /// HTTP method
    method: String,
    /// Target URL
    url: String,
    /// Reason reported by the client library
    reason: String,
  },

  /// The sink answered with a body that is not a bulk response
  #[error("unparseable bulk response (status {status}): {reason}")]
  MalformedResponse {
    /// HTTP status of the response
    status: u16,
    /// Why the body was rejected
    reason: String,
  },
}

/// Bulk sink errors; all of these abort the run
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum SinkError {
  /// Transport failures persisted through every retry
  #[error("bulk request failed after {attempts} attempts: {last}")]
  RetriesExhausted {
    /// Total attempts made (first try plus retries)
    attempts: u32,
    /// The last transport error observed
    #[source]
    last: TransportError,
  },

  /// A document was rejected inside an otherwise successful bulk response
  #[error("bulk item {item_index} rejected with status {status}: {payload}")]
  ItemRejected {
    /// 0-based index of the item within the batch
    item_index: usize,
    /// Status reported for the item
    status: u16,
    /// Full item payload as returned by the sink
    payload: String,
  },

  /// A response item carries no numeric status
  #[error("bulk item {item_index} has no status: {payload}")]
  MalformedItem {
    /// 0-based index of the item within the batch
    item_index: usize,
    /// Full item payload as returned by the sink
    payload: String,
  },

  /// A response item echoes a different id than the document sent at its position
  #[error("bulk item {item_index} is out of order: expected id {expected}, found {found}")]
  ItemOrderMismatch {
    /// 0-based index of the item within the batch
    item_index: usize,
    /// Id of the document sent at this position
    expected: String,
    /// Id reported by the item
    found: String,
  },

  /// The response does not report one item per document sent
  #[error("bulk response item count mismatch: sent={sent}, received={received}")]
  ItemCountMismatch {
    /// Document pairs sent
    sent: usize,
    /// Items received
    received: usize,
  },

  /// A bulk line could not be serialised
  #[error("failed to encode bulk line: {0}")]
  Encode(Arc<serde_json::Error>),
}

/// Index lifecycle (delete / create / settings) errors
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum LifecycleError {
  /// The request did not reach the sink
  #[error("index lifecycle request failed: {0}")]
  Transport(#[from] TransportError),

  /// The sink answered with a status the step does not accept
  #[error("{method} {url} returned status {status}: {body}")]
  UnexpectedStatus {
    /// HTTP method
    method: String,
    /// Target URL
    url: String,
    /// Status returned
    status: u16,
    /// Response body
    body: String,
  },

  /// The settings response could not be interpreted
  #[error("unreadable index settings for {index}: {reason}")]
  InvalidSettings {
    /// Index name
    index: String,
    /// Why the response was rejected
    reason: String,
  },
}

/// Sample id list and modulo sampler errors
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum SamplerError {
  /// The id list could not be read
  #[error("failed to read id list: path={path:?}, error={source}")]
  Io {
    /// Id list file
    path: PathBuf,
    /// Underlying I/O error
    #[source]
    source: Arc<io::Error>,
  },

  /// A line of the id list is not a signed integer
  #[error("invalid id at {path:?} line {line}: {value:?}")]
  InvalidId {
    /// Id list file
    path: PathBuf,
    /// 1-based line number
    line: usize,
    /// Offending text
    value: String,
  },
}

/// 統合エラー
/// Every public API of this crate returns this error
/// `LoaderResult<T>` = `Result<T, LoaderError>`
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum LoaderError {
  /// Configuration error
  #[error(transparent)]
  Config(#[from] ConfigError),

  /// Input reading error
  #[error(transparent)]
  Reader(#[from] ReaderError),

  /// Missing or mistyped id field
  #[error("{path:?}: {source}")]
  Schema {
    /// Input file the record came from
    path: PathBuf,
    /// The schema violation
    #[source]
    source: SchemaError,
  },

  /// Bulk sink error, with the batch it happened in
  #[error("{path:?} batch {batch}: {source}")]
  Sink {
    /// Input file the batch came from
    path: PathBuf,
    /// 0-based batch number within the file
    batch: usize,
    /// The sink failure
    #[source]
    source: SinkError,
  },

  /// Index lifecycle error
  #[error(transparent)]
  Lifecycle(#[from] LifecycleError),

  /// Sampler error
  #[error(transparent)]
  Sampler(#[from] SamplerError),

  /// Transport error outside the bulk path
  #[error(transparent)]
  Transport(#[from] TransportError),
}

/// esloader クレートの標準 Result 型エイリアス
pub type LoaderResult<T> = Result<T, LoaderError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn item_rejected_names_index_and_status() {
    let err = SinkError::ItemRejected {
      item_index: 2,
      status: 409,
      payload: r#"{"create":{"status":409}}"#.to_string(),
    };
    let msg = err.to_string();
    assert!(msg.contains("item 2"));
    assert!(msg.contains("409"));
  }

  #[test]
  fn sink_error_is_wrapped_with_file_and_batch() {
    let err = LoaderError::Sink {
      path: PathBuf::from("people.json"),
      batch: 7,
      source: SinkError::ItemCountMismatch { sent: 3, received: 2 },
    };
    let msg = err.to_string();
    assert!(msg.contains("people.json"));
    assert!(msg.contains("batch 7"));
    assert!(msg.contains("sent=3"));
  }

  #[test]
  fn config_error_converts_into_loader_error() {
    let err: LoaderError = ConfigError::EmptyIdField.into();
    assert!(matches!(err, LoaderError::Config(ConfigError::EmptyIdField)));
  }
}
