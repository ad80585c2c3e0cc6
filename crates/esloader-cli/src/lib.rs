//! esloader-cli crate
//!
//! Command line front end for the `esloader` library.
//!
//! ## Usage Example
//! ```bash
//! esloader import --es-base-url http://localhost:9200 --index people \
//!   --documents people-1.json people-2.json --documents-type person \
//!   --secondary addresses.json --secondary-type address \
//!   --mapping people-mapping.json
//!
//! esloader sample --ids person_ids.csv --target 1000
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;

pub use cli::{Cli, Command};
pub use errors::{CliError, CliErrorKind};
