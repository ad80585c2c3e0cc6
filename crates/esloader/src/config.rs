// crates/esloader/src/config.rs

use std::time::Duration;

use serde::Deserialize;

use crate::errors::ConfigError;

/// Default number of records per bulk request
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Default number of retries after the first failed bulk attempt
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default exponential backoff base in seconds (delay = base^attempt)
pub const DEFAULT_BACKOFF_BASE: u64 = 4;

/// Default number of records between progress lines
pub const DEFAULT_PROGRESS_INTERVAL: usize = 1_000;

/// Upper bound for `retry.max_retries`; 4^10 seconds is already over 12 days
pub const MAX_ALLOWED_RETRIES: u32 = 10;

/// Layout of an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputFormat {
  /// The whole file is a single JSON array of objects (held in memory)
  #[default]
  JsonArray,
  /// One JSON object per line (streamed)
  NewlineDelimited,
}

impl InputFormat {
  /// Returns the format selected by a `newline_delimited` toggle.
  pub fn from_newline_delimited(newline_delimited: bool) -> Self {
    if newline_delimited { InputFormat::NewlineDelimited } else { InputFormat::JsonArray }
  }
}

impl std::fmt::Display for InputFormat {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      InputFormat::JsonArray => write!(f, "json-array"),
      InputFormat::NewlineDelimited => write!(f, "newline-delimited"),
    }
  }
}

/// Top-level configuration for esloader.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoaderConfig {
  /// [sink] section
  #[serde(default)]
  pub sink: SinkConfig,
  /// [import] section
  #[serde(default)]
  pub import: ImportConfig,
  /// [retry] section
  #[serde(default)]
  pub retry: RetryConfig,
  /// [logging] section
  #[serde(default)]
  pub logging: LoggingConfig,
}

/// [sink] section configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
  /// Base URL of the search cluster (e.g., "http://localhost:9200")
  #[serde(default)]
  pub base_url: String,
  /// Target index name
  #[serde(default)]
  pub index: String,
  /// Basic auth user name
  #[serde(default)]
  pub username: Option<String>,
  /// Basic auth password
  #[serde(default)]
  pub password: Option<String>,
  /// Per-request timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  /// Skip every bulk request (trial run)
  #[serde(default)]
  pub dry_run: bool,
}

fn default_timeout_secs() -> u64 {
  120
}

impl Default for SinkConfig {
  fn default() -> Self {
    Self {
      base_url: String::new(),
      index: String::new(),
      username: None,
      password: None,
      timeout_secs: default_timeout_secs(),
      dry_run: false,
    }
  }
}

/// [import] section configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
  /// Records per bulk request
  #[serde(default = "default_batch_size")]
  pub batch_size: usize,
  /// Field holding the document id (must be a string)
  #[serde(default = "default_id_field")]
  pub id_field: String,
  /// Input file layout
  #[serde(default)]
  pub format: InputFormat,
  /// Keep the existing index instead of deleting and recreating it
  #[serde(default)]
  pub preserve_index: bool,
  /// Disable refresh and replicas during the import, restore afterwards
  #[serde(default)]
  pub tune_for_bulk: bool,
  /// Records between progress lines
  #[serde(default = "default_progress_interval")]
  pub progress_interval: usize,
}

fn default_batch_size() -> usize {
  DEFAULT_BATCH_SIZE
}

fn default_id_field() -> String {
  "id".to_string()
}

fn default_progress_interval() -> usize {
  DEFAULT_PROGRESS_INTERVAL
}

impl Default for ImportConfig {
  fn default() -> Self {
    Self {
      batch_size: default_batch_size(),
      id_field: default_id_field(),
      format: InputFormat::default(),
      preserve_index: false,
      tune_for_bulk: false,
      progress_interval: default_progress_interval(),
    }
  }
}

/// [retry] section configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetryConfig {
  /// Retries after the first failed attempt
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  /// Backoff base in seconds; retry `k` waits `backoff_base^k` seconds
  #[serde(default = "default_backoff_base")]
  pub backoff_base: u64,
}

fn default_max_retries() -> u32 {
  DEFAULT_MAX_RETRIES
}

fn default_backoff_base() -> u64 {
  DEFAULT_BACKOFF_BASE
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self { max_retries: default_max_retries(), backoff_base: default_backoff_base() }
  }
}

/// [logging] section configuration.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LoggingConfig {
  /// Log level: "trace" | "debug" | "info" | "warn" | "error"
  #[serde(default)]
  pub level: LogLevel,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
  /// trace
  Trace,

  /// debug
  Debug,

  /// info
  #[default]
  Info,

  /// warn
  Warn,

  /// error
  Error,
}

impl LogLevel {
  /// Directive string understood by `tracing_subscriber::EnvFilter`
  pub fn as_directive(&self) -> &'static str {
    match self {
      LogLevel::Trace => "trace",
      LogLevel::Debug => "debug",
      LogLevel::Info => "info",
      LogLevel::Warn => "warn",
      LogLevel::Error => "error",
    }
  }
}

// ===== Accessor Methods =====

impl LoaderConfig {
  /// Base URL without trailing slashes.
  pub fn base_url(&self) -> &str {
    self.sink.base_url.trim_end_matches('/')
  }

  /// Target index name.
  pub fn index_name(&self) -> &str {
    &self.sink.index
  }

  /// URL of the target index.
  ///
  /// # Examples
  /// ```ignore
  /// // base_url = "http://localhost:9200/", index = "people"
  /// assert_eq!(config.index_url(), "http://localhost:9200/people");
  /// ```
  pub fn index_url(&self) -> String {
    format!("{}/{}", self.base_url(), self.sink.index)
  }

  /// URL of the bulk endpoint.
  pub fn bulk_url(&self) -> String {
    format!("{}/_bulk", self.base_url())
  }

  /// Records per bulk request.
  pub fn batch_size(&self) -> usize {
    self.import.batch_size
  }

  /// Name of the id field.
  pub fn id_field(&self) -> &str {
    &self.import.id_field
  }

  /// Input file layout.
  pub fn input_format(&self) -> InputFormat {
    self.import.format
  }

  /// Whether the index is kept as is.
  pub fn preserve_index(&self) -> bool {
    self.import.preserve_index
  }

  /// Whether bulk requests are skipped.
  pub fn dry_run(&self) -> bool {
    self.sink.dry_run
  }

  /// Request timeout.
  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.sink.timeout_secs)
  }

  /// Returns the log level.
  pub fn log_level(&self) -> LogLevel {
    self.logging.level
  }

  /// Validates the configuration.
  ///
  /// # Validation Items
  /// - `sink.base_url` is set and starts with `http://` or `https://`
  /// - `sink.index` is a usable index name
  /// - `import.batch_size` >= 1
  /// - `import.id_field` is not empty
  /// - `import.progress_interval` >= 1
  /// - `retry.backoff_base` >= 1
  /// - `retry.max_retries` <= `MAX_ALLOWED_RETRIES`
  /// - `sink.password` requires `sink.username`
  ///
  /// # Errors
  /// Returns the first failing check as a `ConfigError`.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let base_url = self.sink.base_url.trim();
    if base_url.is_empty() {
      return Err(ConfigError::EmptyBaseUrl);
    }
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
      return Err(ConfigError::InvalidBaseUrl { url: self.sink.base_url.clone() });
    }

    validate_index_name(&self.sink.index)?;

    if self.import.batch_size < 1 {
      return Err(ConfigError::InvalidBatchSize { actual: self.import.batch_size });
    }

    if self.import.id_field.is_empty() {
      return Err(ConfigError::EmptyIdField);
    }

    if self.import.progress_interval < 1 {
      return Err(ConfigError::InvalidProgressInterval { actual: self.import.progress_interval });
    }

    if self.retry.backoff_base < 1 {
      return Err(ConfigError::InvalidBackoffBase { actual: self.retry.backoff_base });
    }

    if self.retry.max_retries > MAX_ALLOWED_RETRIES {
      return Err(ConfigError::TooManyRetries {
        max: MAX_ALLOWED_RETRIES,
        actual: self.retry.max_retries,
      });
    }

    if self.sink.password.is_some() && self.sink.username.is_none() {
      return Err(ConfigError::PasswordWithoutUsername);
    }

    Ok(())
  }
}

/// Index names become a URL path segment and must be lowercase.
fn validate_index_name(name: &str) -> Result<(), ConfigError> {
  let reason = if name.is_empty() {
    Some("empty")
  } else if name.contains(['/', '\\', ' ', '*', '?', '"', '<', '>', '|', ',', '#']) {
    Some("contains a forbidden character")
  } else if name.starts_with(['_', '-', '+']) {
    Some("starts with _, - or +")
  } else if name.chars().any(|c| c.is_uppercase()) {
    Some("must be lowercase")
  } else {
    None
  };

  match reason {
    Some(reason) => Err(ConfigError::InvalidIndexName { name: name.to_string(), reason }),
    None => Ok(()),
  }
}

// ─────────────────────────────────────────────────────────────────────────────
// Test Module
// ─────────────────────────────────────────────────────────────────────────────
