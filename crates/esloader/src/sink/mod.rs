//! sink module
//!
//! HTTP transport seam, retry policy and the bulk endpoint client.

pub mod bulk_client;
pub mod report;
pub mod retry;
pub mod transport;

pub use bulk_client::{BulkOutcome, BulkSinkClient, check_items, parse_bulk_response};
pub use report::{BatchReport, ImportReport};
pub use retry::{RetryFailure, RetryPolicy, retry_with_backoff};
pub use transport::{
  Credentials, HttpMethod, HttpRequest, JSON_CONTENT_TYPE, NDJSON_CONTENT_TYPE, RawResponse,
  ReqwestTransport, RequestBody, Transport,
};
