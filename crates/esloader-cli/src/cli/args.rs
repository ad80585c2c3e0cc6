//! Command line arguments (clap derive)
//!
//! Every flag can also be given through an `ESLOADER_*` environment variable.
//! Flags and environment variables override values from `--config`.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use esloader::config::LogLevel;
use esloader::{ImportJob, InputFormat, LoaderConfig};

use crate::config::{DEFAULT_DOCUMENTS_TYPE, DEFAULT_SECONDARY_TYPE};

/// Bulk loader for JSON document collections into an Elasticsearch-compatible index
#[derive(Debug, Parser)]
#[command(name = "esloader", version, about)]
pub struct Cli {
  /// Log at debug level
  #[arg(short, long, global = true, env = "ESLOADER_VERBOSE")]
  pub verbose: bool,

  /// Subcommand to run
  #[command(subcommand)]
  pub command: Command,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
  /// Import JSON files into the target index
  Import(ImportArgs),
  /// Find a sampling modulus for an id list
  Sample(SampleArgs),
}

/// `esloader import`
#[derive(Debug, Clone, Args)]
pub struct ImportArgs {
  /// Base URL of the cluster, e.g. http://localhost:9200
  #[arg(long, env = "ESLOADER_ES_BASE_URL")]
  pub es_base_url: Option<String>,

  /// Target index name
  #[arg(long, env = "ESLOADER_INDEX")]
  pub index: Option<String>,

  /// Primary category files
  #[arg(long, num_args = 1.., value_delimiter = ',', env = "ESLOADER_DOCUMENTS")]
  pub documents: Vec<PathBuf>,

  /// Type label of the primary files
  #[arg(long, default_value = DEFAULT_DOCUMENTS_TYPE, env = "ESLOADER_DOCUMENTS_TYPE")]
  pub documents_type: String,

  /// Secondary category files
  #[arg(long, num_args = 1.., value_delimiter = ',', env = "ESLOADER_SECONDARY")]
  pub secondary: Vec<PathBuf>,

  /// Type label of the secondary files
  #[arg(long, default_value = DEFAULT_SECONDARY_TYPE, env = "ESLOADER_SECONDARY_TYPE")]
  pub secondary_type: String,

  /// Read one JSON object per line instead of a JSON array per file
  #[arg(long, env = "ESLOADER_NDJSON")]
  pub ndjson: bool,

  /// Keep the existing index instead of deleting and recreating it
  #[arg(long, env = "ESLOADER_PRESERVE_INDEX")]
  pub preserve_index: bool,

  /// Index creation body (settings and mappings) as a JSON file
  #[arg(long, env = "ESLOADER_MAPPING")]
  pub mapping: Option<PathBuf>,

  /// Field holding the document id
  #[arg(long, env = "ESLOADER_ID_FIELD")]
  pub id_field: Option<String>,

  /// Records per bulk request
  #[arg(long, env = "ESLOADER_BATCH_SIZE")]
  pub batch_size: Option<usize>,

  /// Read and validate everything but send no bulk request
  #[arg(long, env = "ESLOADER_DRY_RUN")]
  pub dry_run: bool,

  /// Disable refresh and replicas while loading
  #[arg(long, env = "ESLOADER_TUNE_FOR_BULK")]
  pub tune_for_bulk: bool,

  /// Basic auth user
  #[arg(long, env = "ESLOADER_USERNAME")]
  pub username: Option<String>,

  /// Basic auth password
  #[arg(long, env = "ESLOADER_PASSWORD", hide_env_values = true)]
  pub password: Option<String>,

  /// TOML config file
  #[arg(long, env = "ESLOADER_CONFIG")]
  pub config: Option<PathBuf>,
}

impl ImportArgs {
  /// Overlays the flags that were given onto `config`.
  ///
  /// Toggles only ever switch a setting on.
  pub fn apply_to(&self, config: &mut LoaderConfig) {
    if let Some(url) = &self.es_base_url {
      config.sink.base_url = url.clone();
    }
    if let Some(index) = &self.index {
      config.sink.index = index.clone();
    }
    if let Some(username) = &self.username {
      config.sink.username = Some(username.clone());
    }
    if let Some(password) = &self.password {
      config.sink.password = Some(password.clone());
    }
    if let Some(id_field) = &self.id_field {
      config.import.id_field = id_field.clone();
    }
    if let Some(batch_size) = self.batch_size {
      config.import.batch_size = batch_size;
    }
    if self.ndjson {
      config.import.format = InputFormat::NewlineDelimited;
    }
    config.import.preserve_index |= self.preserve_index;
    config.import.tune_for_bulk |= self.tune_for_bulk;
    config.sink.dry_run |= self.dry_run;
  }

  /// Import jobs in category order: primary files, then secondary files.
  pub fn jobs(&self) -> Vec<ImportJob> {
    [(&self.documents_type, &self.documents), (&self.secondary_type, &self.secondary)]
      .into_iter()
      .filter(|(_, files)| !files.is_empty())
      .map(|(doc_type, files)| ImportJob::new(doc_type.as_str(), files.clone()))
      .collect()
  }
}

/// `esloader sample`
#[derive(Debug, Clone, Args)]
pub struct SampleArgs {
  /// Id list: a header line, then one integer per line
  #[arg(long, env = "ESLOADER_IDS")]
  pub ids: PathBuf,

  /// Wanted number of sampled ids
  #[arg(long, env = "ESLOADER_TARGET")]
  pub target: NonZeroUsize,
}

/// Level to log at: `--verbose` raises the configured level to debug.
pub fn effective_log_level(configured: LogLevel, verbose: bool) -> LogLevel {
  match configured {
    LogLevel::Trace | LogLevel::Debug => configured,
    _ if verbose => LogLevel::Debug,
    _ => configured,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn verbose_raises_but_never_lowers() {
    assert_eq!(effective_log_level(LogLevel::Info, true), LogLevel::Debug);
    assert_eq!(effective_log_level(LogLevel::Error, true), LogLevel::Debug);
    assert_eq!(effective_log_level(LogLevel::Trace, true), LogLevel::Trace);
    assert_eq!(effective_log_level(LogLevel::Warn, false), LogLevel::Warn);
  }
}
