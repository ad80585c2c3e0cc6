//! Config file loading (TOML)

use std::path::Path;

use esloader::LoaderConfig;

use crate::errors::{CliError, Result};

/// Reads a TOML config file with optional `[sink]`, `[import]`, `[retry]`
/// and `[logging]` sections.
///
/// # Errors
/// `CliError::ConfigFile` when the file cannot be read or parsed.
pub fn load_config_file(path: &Path) -> Result<LoaderConfig> {
  let content = std::fs::read_to_string(path)
    .map_err(|e| CliError::ConfigFile { path: path.to_path_buf(), reason: e.to_string() })?;
  parse_config(path, &content)
}

fn parse_config(path: &Path, content: &str) -> Result<LoaderConfig> {
  toml::from_str(content)
    .map_err(|e| CliError::ConfigFile { path: path.to_path_buf(), reason: e.to_string() })
}

#[cfg(test)]
mod tests {
  use super::*;
  use esloader::InputFormat;
  use esloader::config::LogLevel;

  #[test]
  fn parses_all_sections() {
    let content = r#"
[sink]
base_url = "http://localhost:9200"
index = "people"
username = "elastic"
timeout_secs = 30

[import]
batch_size = 250
id_field = "person_id"
format = "newline-delimited"
tune_for_bulk = true

[retry]
max_retries = 3

[logging]
level = "warn"
"#;
    let config = parse_config(Path::new("esloader.toml"), content).unwrap();
    assert_eq!(config.base_url(), "http://localhost:9200");
    assert_eq!(config.index_name(), "people");
    assert_eq!(config.sink.username.as_deref(), Some("elastic"));
    assert_eq!(config.sink.timeout_secs, 30);
    assert_eq!(config.batch_size(), 250);
    assert_eq!(config.id_field(), "person_id");
    assert_eq!(config.input_format(), InputFormat::NewlineDelimited);
    assert!(config.import.tune_for_bulk);
    assert_eq!(config.retry.max_retries, 3);
    assert_eq!(config.retry.backoff_base, 4);
    assert_eq!(config.log_level(), LogLevel::Warn);
  }

  #[test]
  fn empty_file_gives_defaults() {
    let config = parse_config(Path::new("empty.toml"), "").unwrap();
    assert_eq!(config.batch_size(), 500);
    assert_eq!(config.id_field(), "id");
  }

  #[test]
  fn syntax_error_names_the_file() {
    let err = parse_config(Path::new("broken.toml"), "[sink\nindex = 1").unwrap_err();
    assert!(matches!(err, CliError::ConfigFile { .. }));
    assert!(err.to_string().contains("broken.toml"));
  }

  #[test]
  fn missing_file_is_a_config_file_error() {
    let err = load_config_file(Path::new("/nonexistent/esloader.toml")).unwrap_err();
    assert!(matches!(err, CliError::ConfigFile { .. }));
  }
}
