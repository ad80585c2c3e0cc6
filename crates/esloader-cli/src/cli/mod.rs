//! cli module

pub mod args;

pub use args::{Cli, Command, ImportArgs, SampleArgs, effective_log_level};
