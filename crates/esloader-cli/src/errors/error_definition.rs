//! CLIエラー定義

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use thiserror::Error;

use esloader::errors::LoaderError;

use crate::config::{EXIT_INPUT, EXIT_INTERNAL, EXIT_SINK, EXIT_USAGE};

/// エラーの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorKind {
  /// Bad flags, config file or configuration values
  Usage,
  /// Unreadable or malformed input files
  Input,
  /// The search cluster failed or rejected data
  Sink,
  /// Anything else
  Internal,
}

impl CliErrorKind {
  /// Short machine-readable code
  #[must_use]
  pub fn code(&self) -> &'static str {
    match self {
      Self::Usage => "usage_error",
      Self::Input => "input_error",
      Self::Sink => "sink_error",
      Self::Internal => "internal_error",
    }
  }

  /// Process exit status
  #[must_use]
  pub fn exit_code(&self) -> u8 {
    match self {
      Self::Usage => EXIT_USAGE,
      Self::Input => EXIT_INPUT,
      Self::Sink => EXIT_SINK,
      Self::Internal => EXIT_INTERNAL,
    }
  }
}

/// CLIエラー
#[derive(Debug, Error)]
pub enum CliError {
  /// Invalid command line usage
  #[error("invalid usage: {0}")]
  Usage(String),

  /// The config file could not be read or parsed
  #[error("config file {path:?}: {reason}")]
  ConfigFile {
    /// Config file path
    path: PathBuf,
    /// Read or parse failure
    reason: String,
  },

  /// The mapping file could not be read
  #[error("failed to read mapping file {path:?}: {source}")]
  MappingRead {
    /// Mapping file path
    path: PathBuf,
    /// Underlying I/O error
    #[source]
    source: Arc<std::io::Error>,
  },

  /// The mapping file is not valid JSON
  #[error("mapping file {path:?} is not valid JSON: {reason}")]
  InvalidMapping {
    /// Mapping file path
    path: PathBuf,
    /// Parser message
    reason: String,
  },

  /// Loader failure
  #[error(transparent)]
  Loader(#[from] LoaderError),
}

impl CliError {
  /// エラーの種類を取得
  #[must_use]
  pub fn kind(&self) -> CliErrorKind {
    match self {
      Self::Usage(_) | Self::ConfigFile { .. } | Self::InvalidMapping { .. } => CliErrorKind::Usage,
      Self::MappingRead { .. } => CliErrorKind::Input,
      Self::Loader(err) => loader_error_kind(err),
    }
  }

  /// Process exit status for this error
  #[must_use]
  pub fn exit_code(&self) -> ExitCode {
    ExitCode::from(self.kind().exit_code())
  }

  /// 使用方法エラーを作成
  #[must_use]
  pub fn usage(message: impl Into<String>) -> Self {
    Self::Usage(message.into())
  }
}

/// LoaderError の種類をCLIの種類にマッピングする。
fn loader_error_kind(err: &LoaderError) -> CliErrorKind {
  match err {
    LoaderError::Config(_) => CliErrorKind::Usage,
    LoaderError::Reader(_) | LoaderError::Schema { .. } | LoaderError::Sampler(_) => {
      CliErrorKind::Input
    }
    LoaderError::Sink { .. } | LoaderError::Lifecycle(_) | LoaderError::Transport(_) => {
      CliErrorKind::Sink
    }
    // #[non_exhaustive] な enum のため、将来追加されるバリアントに対応
    _ => CliErrorKind::Internal,
  }
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
  use super::*;
  use esloader::errors::{ConfigError, SchemaError, SinkError, TransportError};

  #[test]
  fn usage_errors_exit_with_2() {
    let err = CliError::usage("no input files");
    assert_eq!(err.kind(), CliErrorKind::Usage);
    assert_eq!(err.kind().exit_code(), 2);
    assert_eq!(err.kind().code(), "usage_error");
  }

  #[test]
  fn config_validation_is_a_usage_error() {
    let err: CliError = LoaderError::Config(ConfigError::EmptyBaseUrl).into();
    assert_eq!(err.kind(), CliErrorKind::Usage);
  }

  #[test]
  fn schema_error_is_an_input_error() {
    let err: CliError = LoaderError::Schema {
      path: PathBuf::from("people.json"),
      source: SchemaError::MissingIdField { field: "id".to_string(), position: 4 },
    }
    .into();
    assert_eq!(err.kind(), CliErrorKind::Input);
    assert_eq!(err.kind().exit_code(), 3);
    assert!(err.to_string().contains("record 4"));
  }

  #[test]
  fn rejected_item_is_a_sink_error() {
    let err: CliError = LoaderError::Sink {
      path: PathBuf::from("people.json"),
      batch: 2,
      source: SinkError::ItemRejected { item_index: 7, status: 409, payload: "{}".to_string() },
    }
    .into();
    assert_eq!(err.kind(), CliErrorKind::Sink);
    assert_eq!(err.kind().exit_code(), 4);
    let message = err.to_string();
    assert!(message.contains("batch 2"));
    assert!(message.contains("item 7"));
    assert!(message.contains("409"));
  }

  #[test]
  fn transport_error_is_a_sink_error() {
    let err: CliError =
      LoaderError::Transport(TransportError::ClientBuild { reason: "tls".to_string() }).into();
    assert_eq!(err.kind(), CliErrorKind::Sink);
  }

  #[test]
  fn unreadable_mapping_is_an_input_error() {
    let err = CliError::MappingRead {
      path: PathBuf::from("mapping.json"),
      source: Arc::new(std::io::Error::from(std::io::ErrorKind::NotFound)),
    };
    assert_eq!(err.kind(), CliErrorKind::Input);
  }
}
