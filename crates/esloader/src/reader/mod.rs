//! reader module
//!
//! Reads JSON array and newline-delimited JSON input files into records.

pub mod record_reader;

pub use record_reader::{MAX_LINE_BYTES, RecordReader, RecordStream, read_records};
