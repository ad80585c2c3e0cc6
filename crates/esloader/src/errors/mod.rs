//! errors module
pub mod error_definition;

/// Re-export major error types
pub use error_definition::{
  ConfigError, LifecycleError, LoaderError, LoaderResult, ReaderError, SamplerError, SchemaError,
  SinkError, TransportError,
};
