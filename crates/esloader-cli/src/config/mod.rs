//! Config module

mod constants;
mod file;

pub use constants::{
  DEFAULT_DOCUMENTS_TYPE, DEFAULT_SECONDARY_TYPE, ENV_PREFIX, EXIT_INPUT, EXIT_INTERNAL,
  EXIT_SINK, EXIT_USAGE,
};
pub use file::load_config_file;
