//! Record Reader
//!
//! Turns an input file into an ordered stream of [`Record`]s.
//!
//! - `InputFormat::JsonArray`: the file is one JSON array, parsed as a unit in memory.
//! - `InputFormat::NewlineDelimited`: one JSON object per non-empty line, streamed.
//!
//! Any malformed record is an error; nothing is skipped.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::config::InputFormat;
use crate::errors::ReaderError;
use crate::models::{Record, json_type_name};

/// Longest newline-delimited line accepted (16 MiB)
pub const MAX_LINE_BYTES: usize = 16 * 1024 * 1024;

/// Opens input files in a given format.
#[derive(Debug, Clone, Copy)]
pub struct RecordReader {
  format: InputFormat,
  max_line_bytes: usize,
}

impl RecordReader {
  /// Reader for the given format with the default line limit.
  pub fn new(format: InputFormat) -> Self {
    Self { format, max_line_bytes: MAX_LINE_BYTES }
  }

  /// Overrides the newline-delimited line limit.
  #[must_use]
  pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
    self.max_line_bytes = max_line_bytes;
    self
  }

  /// Input format of this reader
  pub fn format(&self) -> InputFormat {
    self.format
  }

  /// Opens `path` and returns its records as a stream.
  ///
  /// Array mode reads and validates the whole file here. Newline-delimited mode
  /// makes a counting pass (no JSON parsing) so that `total_records` is known,
  /// then reopens the file for streaming.
  ///
  /// # Errors
  /// - `ReaderError::Io`: the file cannot be opened or read
  /// - `ReaderError::Parse` / `ReaderError::NotAnObject`: array mode content is invalid
  /// - `ReaderError::LineTooLong`: a line exceeds the limit (found by the counting pass)
  pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<RecordStream, ReaderError> {
    let path = path.as_ref().to_path_buf();
    match self.format {
      InputFormat::JsonArray => {
        let records = read_json_array(&path)?;
        Ok(RecordStream {
          total: records.len(),
          inner: StreamInner::Array(records.into_iter()),
          path,
        })
      }
      InputFormat::NewlineDelimited => {
        let total = count_lines(&path, self.max_line_bytes)?;
        let lines = LineRecords {
          reader: open_buffered(&path)?,
          buf: Vec::new(),
          line: 0,
          position: 0,
          max_line_bytes: self.max_line_bytes,
          done: false,
        };
        Ok(RecordStream { total, inner: StreamInner::Lines(lines), path })
      }
    }
  }
}

/// Reads every record of `path` into memory.
///
/// # Errors
/// Same as [`RecordReader::open`], plus any line-level error in newline-delimited mode.
pub fn read_records<P: AsRef<Path>>(
  path: P,
  format: InputFormat,
) -> Result<Vec<Record>, ReaderError> {
  RecordReader::new(format).open(path)?.collect()
}

/// Ordered records of one input file.
#[derive(Debug)]
pub struct RecordStream {
  path: PathBuf,
  total: usize,
  inner: StreamInner,
}

#[derive(Debug)]
enum StreamInner {
  Array(std::vec::IntoIter<Record>),
  Lines(LineRecords),
}

impl RecordStream {
  /// Number of records in the file.
  pub fn total_records(&self) -> usize {
    self.total
  }

  /// Path of the file being read.
  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Iterator for RecordStream {
  type Item = Result<Record, ReaderError>;

  fn next(&mut self) -> Option<Self::Item> {
    match &mut self.inner {
      StreamInner::Array(records) => records.next().map(Ok),
      StreamInner::Lines(lines) => lines.next_record(&self.path),
    }
  }
}

/// Streaming state for newline-delimited files
#[derive(Debug)]
struct LineRecords {
  reader: BufReader<File>,
  buf: Vec<u8>,
  /// 1-based number of the last line read
  line: usize,
  /// 0-based position of the next record
  position: usize,
  max_line_bytes: usize,
  /// Set after EOF or the first error
  done: bool,
}

impl LineRecords {
  fn next_record(&mut self, path: &Path) -> Option<Result<Record, ReaderError>> {
    if self.done {
      return None;
    }
    let result = self.read_next(path);
    if !matches!(result, Some(Ok(_))) {
      self.done = true;
    }
    result
  }

  fn read_next(&mut self, path: &Path) -> Option<Result<Record, ReaderError>> {
    loop {
      match read_bounded_line(&mut self.reader, &mut self.buf, self.max_line_bytes) {
        Ok(LineRead::Eof) => return None,
        Ok(LineRead::TooLong) => {
          return Some(Err(ReaderError::LineTooLong {
            path: path.to_path_buf(),
            line: self.line + 1,
            limit: self.max_line_bytes,
          }));
        }
        Ok(LineRead::Line) => {}
        Err(e) => return Some(Err(io_error(path, e))),
      }
      self.line += 1;

      let content = self.buf.trim_ascii();
      if content.is_empty() {
        continue;
      }

      let value: JsonValue = match serde_json::from_slice(content) {
        Ok(value) => value,
        Err(e) => {
          return Some(Err(ReaderError::Parse {
            path: path.to_path_buf(),
            line: Some(self.line),
            source: Arc::new(e),
          }));
        }
      };

      let position = self.position;
      self.position += 1;
      return Some(into_record(path, position, value));
    }
  }
}

/// Result of reading one line
#[derive(Debug, PartialEq, Eq)]
enum LineRead {
  Line,
  TooLong,
  Eof,
}

/// Reads one line into `buf` without the trailing `\n` / `\r\n`.
///
/// At most `limit + 2` bytes are consumed, so an oversized line is detected
/// without buffering all of it. The limit applies to the content only; a
/// `\r\n` ending does not count against it.
fn read_bounded_line<R: BufRead>(
  reader: &mut R,
  buf: &mut Vec<u8>,
  limit: usize,
) -> io::Result<LineRead> {
  buf.clear();
  let read = reader.by_ref().take(limit as u64 + 2).read_until(b'\n', buf)?;
  if read == 0 {
    return Ok(LineRead::Eof);
  }

  if buf.last() == Some(&b'\n') {
    buf.pop();
    if buf.last() == Some(&b'\r') {
      buf.pop();
    }
  }
  if buf.len() > limit {
    return Ok(LineRead::TooLong);
  }

  Ok(LineRead::Line)
}

/// Counts non-empty lines of a newline-delimited file.
fn count_lines(path: &Path, limit: usize) -> Result<usize, ReaderError> {
  let mut reader = open_buffered(path)?;
  let mut buf = Vec::new();
  let mut line = 0;
  let mut count = 0;

  loop {
    match read_bounded_line(&mut reader, &mut buf, limit).map_err(|e| io_error(path, e))? {
      LineRead::Eof => return Ok(count),
      LineRead::TooLong => {
        return Err(ReaderError::LineTooLong { path: path.to_path_buf(), line: line + 1, limit });
      }
      LineRead::Line => {
        line += 1;
        if !buf.trim_ascii().is_empty() {
          count += 1;
        }
      }
    }
  }
}

/// Parses a whole file holding one JSON array of objects.
fn read_json_array(path: &Path) -> Result<Vec<Record>, ReaderError> {
  let mut bytes = Vec::new();
  File::open(path)
    .and_then(|mut file| file.read_to_end(&mut bytes))
    .map_err(|e| io_error(path, e))?;

  let values: Vec<JsonValue> = serde_json::from_slice(&bytes).map_err(|e| ReaderError::Parse {
    path: path.to_path_buf(),
    line: None,
    source: Arc::new(e),
  })?;

  values.into_iter().enumerate().map(|(position, value)| into_record(path, position, value)).collect()
}

fn into_record(path: &Path, position: usize, value: JsonValue) -> Result<Record, ReaderError> {
  match value {
    JsonValue::Object(record) => Ok(record),
    other => Err(ReaderError::NotAnObject {
      path: path.to_path_buf(),
      position,
      found: json_type_name(&other),
    }),
  }
}

fn open_buffered(path: &Path) -> Result<BufReader<File>, ReaderError> {
  File::open(path).map(BufReader::new).map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, source: io::Error) -> ReaderError {
  ReaderError::Io { path: path.to_path_buf(), source: Arc::new(source) }
}
