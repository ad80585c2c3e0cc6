//! batcher module
//!
//! Fixed-size batching and bulk line construction.

pub mod bulk_batcher;

pub use bulk_batcher::{
  Batch, Batches, batch_count, build_line_pair, encode_ndjson, extract_id,
};
