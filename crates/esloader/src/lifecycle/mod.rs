//! lifecycle module
//!
//! Index recreation and bulk-load settings.

pub mod index_lifecycle;

pub use index_lifecycle::{IndexLifecycle, IndexSettings, parse_index_settings};
