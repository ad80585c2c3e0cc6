//! `esloader import`

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use esloader::sink::ImportReport;
use esloader::{Loader, LoaderConfig};

use crate::cli::ImportArgs;
use crate::config::load_config_file;
use crate::errors::{CliError, Result};

/// Builds the loader configuration: config file (if any), then flags on top.
///
/// # Errors
/// - `CliError::ConfigFile`: the config file is unreadable or not valid TOML
pub fn build_config(args: &ImportArgs) -> Result<LoaderConfig> {
  let mut config = match &args.config {
    Some(path) => load_config_file(path)?,
    None => LoaderConfig::default(),
  };
  args.apply_to(&mut config);
  Ok(config)
}

/// Reads the mapping file and checks that it is JSON.
///
/// The content is sent verbatim as the index creation body.
pub fn read_mapping(path: &Path) -> Result<String> {
  let content = std::fs::read_to_string(path)
    .map_err(|e| CliError::MappingRead { path: path.to_path_buf(), source: Arc::new(e) })?;
  serde_json::from_str::<serde_json::Value>(&content)
    .map_err(|e| CliError::InvalidMapping { path: path.to_path_buf(), reason: e.to_string() })?;
  Ok(content)
}

/// Runs an import with an already built configuration.
///
/// Input files and the mapping are checked before any request is made.
pub async fn run_import(args: &ImportArgs, config: LoaderConfig) -> Result<ImportReport> {
  let jobs = args.jobs();
  if jobs.is_empty() {
    return Err(CliError::usage("no input files: pass --documents and/or --secondary"));
  }
  let mapping = args.mapping.as_deref().map(read_mapping).transpose()?;

  let loader = Loader::from_config(config)?;
  info!(
    index = %loader.config().index_name(),
    base_url = %loader.config().base_url(),
    "loader ready"
  );
  Ok(loader.run(&jobs, mapping.as_deref()).await?)
}
