//! Batcher
//!
//! Cuts a record stream into fixed-size batches and turns each record into the
//! `create` action line + document line pair of the bulk protocol.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::errors::{SchemaError, SinkError};
use crate::models::{BulkAction, BulkRequestLine, Record, json_type_name};

/// Positional slice of the records of one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
  /// 0-based batch number within the file
  pub number: usize,
  /// 0-based position (within the file) of the first record
  pub first_position: usize,
  /// Records in file order
  pub records: Vec<Record>,
}

impl Batch {
  /// Number of records in the batch
  pub fn len(&self) -> usize {
    self.records.len()
  }

  /// Returns true when the batch holds no records
  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  /// Builds the alternating action/document lines for every record.
  ///
  /// # Errors
  /// `SchemaError` for the first record whose id field is missing or not a string.
  pub fn to_bulk_lines(
    &self,
    index: &str,
    doc_type: &str,
    id_field: &str,
  ) -> Result<Vec<BulkRequestLine>, SchemaError> {
    let mut lines = Vec::with_capacity(self.records.len() * 2);
    for (offset, record) in self.records.iter().enumerate() {
      let (action, document) =
        build_line_pair(record, self.first_position + offset, index, doc_type, id_field)?;
      lines.push(action);
      lines.push(document);
    }
    Ok(lines)
  }
}

/// Reads the id field of a record.
///
/// # Errors
/// - `SchemaError::MissingIdField`: the field is absent
/// - `SchemaError::IdNotString`: the field holds anything but a JSON string
pub fn extract_id<'a>(
  record: &'a Record,
  id_field: &str,
  position: usize,
) -> Result<&'a str, SchemaError> {
  match record.get(id_field) {
    Some(JsonValue::String(id)) => Ok(id),
    Some(other) => Err(SchemaError::IdNotString {
      field: id_field.to_string(),
      position,
      found: json_type_name(other),
    }),
    None => Err(SchemaError::MissingIdField { field: id_field.to_string(), position }),
  }
}

/// Builds the `create` action line and the document line for one record.
///
/// # Arguments
/// - `record`: document to write
/// - `position`: 0-based position of the record in its file (for error messages)
/// - `index`: target index
/// - `doc_type`: document type / category label
/// - `id_field`: name of the field holding the document id
pub fn build_line_pair(
  record: &Record,
  position: usize,
  index: &str,
  doc_type: &str,
  id_field: &str,
) -> Result<(BulkRequestLine, BulkRequestLine), SchemaError> {
  let id = extract_id(record, id_field, position)?;
  let action = BulkRequestLine::Action(BulkAction::create(index, doc_type, id));
  let document = BulkRequestLine::Document(record.clone());
  Ok((action, document))
}

/// Serialises bulk lines as newline-delimited JSON.
///
/// Every line, the last one included, is terminated by `\n`.
pub fn encode_ndjson(lines: &[BulkRequestLine]) -> Result<String, SinkError> {
  let mut body = String::new();
  for line in lines {
    let encoded = serde_json::to_string(line).map_err(|e| SinkError::Encode(Arc::new(e)))?;
    body.push_str(&encoded);
    body.push('\n');
  }
  Ok(body)
}

/// Iterator adaptor yielding [`Batch`]es of at most `batch_size` records.
///
/// The first error from the underlying stream is yielded in place of a batch
/// and ends the iteration.
#[derive(Debug)]
pub struct Batches<I> {
  records: I,
  batch_size: usize,
  next_number: usize,
  next_position: usize,
  done: bool,
}

impl<I, E> Batches<I>
where
  I: Iterator<Item = Result<Record, E>>,
{
  /// Wraps `records`; a `batch_size` of 0 is treated as 1.
  pub fn new(records: I, batch_size: usize) -> Self {
    Self { records, batch_size: batch_size.max(1), next_number: 0, next_position: 0, done: false }
  }
}

impl<I, E> Iterator for Batches<I>
where
  I: Iterator<Item = Result<Record, E>>,
{
  type Item = Result<Batch, E>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.done {
      return None;
    }

    let mut records = Vec::with_capacity(self.batch_size);
    while records.len() < self.batch_size {
      match self.records.next() {
        Some(Ok(record)) => records.push(record),
        Some(Err(e)) => {
          self.done = true;
          return Some(Err(e));
        }
        None => {
          self.done = true;
          break;
        }
      }
    }

    if records.is_empty() {
      return None;
    }

    let batch = Batch { number: self.next_number, first_position: self.next_position, records };
    self.next_number += 1;
    self.next_position += batch.len();
    Some(Ok(batch))
  }
}

/// Number of batches `total_records` splits into.
pub fn batch_count(total_records: usize, batch_size: usize) -> usize {
  total_records.div_ceil(batch_size.max(1))
}
