//! esloader バルクローダーライブラリー
//!
//! Loads JSON document collections (JSON array or newline-delimited files)
//! into an Elasticsearch-compatible index through its `_bulk` API, and picks
//! sampling moduli for integer id lists.

/// 設定モジュール - LoaderConfig and its sections
pub mod config;

/// エラーモジュール - LoaderError, LoaderResult and per-area errors
pub mod errors;

/// Bulk line and response models
pub mod models;

/// Input file reading (JSON array, newline-delimited)
pub mod reader;

/// Fixed-size batching and bulk line construction
pub mod batcher;

/// HTTP transport, retry and bulk client
pub mod sink;

/// Progress fractions and ETA
pub mod progress;

/// Index recreation and bulk settings
pub mod lifecycle;

/// Modulus search for id sampling
pub mod sampler;

/// サービスモジュール - the Loader facade
pub mod service;

/// 再エクスポート
pub use config::{InputFormat, LoaderConfig};
pub use errors::{LoaderError, LoaderResult};
pub use sampler::{ModuloFit, find_modulo, read_sample_ids};
pub use service::{ImportJob, Loader};
pub use sink::{ImportReport, ReqwestTransport, Transport};
