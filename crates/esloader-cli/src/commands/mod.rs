//! commands module
//!
//! One module per subcommand.

pub mod import;
pub mod sample;

pub use import::{build_config, read_mapping, run_import};
pub use sample::run_sample;
