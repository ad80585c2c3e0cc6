//! crates/esloader/tests/reader_test.rs
//!
//! Reading JSON array and newline-delimited files from disk.

mod common;

use serde_json::json;
use tempfile::TempDir;

use common::{write_array, write_text};
use esloader::InputFormat;
use esloader::errors::ReaderError;
use esloader::reader::{RecordReader, read_records};

#[test]
fn array_and_ndjson_yield_the_same_records() {
  let records = vec![
    json!({"id": "a", "name": "Ann", "tags": ["x", "y"]}),
    json!({"id": "b", "nested": {"k": 1.5}}),
    json!({"id": "c", "empty": null}),
  ];
  let dir = TempDir::new().unwrap();
  let array = write_array(dir.path(), "r.json", &records);
  let ndjson: String = records.iter().map(|r| format!("{r}\n")).collect();
  let lines = write_text(dir.path(), "r.ndjson", &ndjson);

  let from_array = read_records(&array, InputFormat::JsonArray).unwrap();
  let from_lines = read_records(&lines, InputFormat::NewlineDelimited).unwrap();
  assert_eq!(from_array, from_lines);
  assert_eq!(from_array.len(), 3);
  assert_eq!(from_array[1]["nested"]["k"], json!(1.5));
}

#[test]
fn ndjson_total_ignores_blank_lines() {
  let dir = TempDir::new().unwrap();
  let path = write_text(dir.path(), "r.ndjson", "{\"id\":\"a\"}\n   \n\r\n{\"id\":\"b\"}\r\n{\"id\":\"c\"}");
  let stream = RecordReader::new(InputFormat::NewlineDelimited).open(&path).unwrap();
  assert_eq!(stream.total_records(), 3);
  assert_eq!(stream.path(), path.as_path());
  let ids: Vec<String> =
    stream.map(|r| r.unwrap()["id"].as_str().unwrap().to_string()).collect();
  assert_eq!(ids, vec!["a", "b", "c"]);
}

#[test]
fn array_parse_error_has_no_line() {
  let dir = TempDir::new().unwrap();
  let path = write_text(dir.path(), "bad.json", "[{\"id\":\"a\"},");
  let err = RecordReader::new(InputFormat::JsonArray).open(&path).unwrap_err();
  assert!(matches!(err, ReaderError::Parse { line: None, .. }));
}

#[test]
fn array_of_non_objects_is_rejected() {
  let dir = TempDir::new().unwrap();
  let path = write_text(dir.path(), "nums.json", "[{\"id\":\"a\"}, 5]");
  let err = read_records(&path, InputFormat::JsonArray).unwrap_err();
  assert!(matches!(err, ReaderError::NotAnObject { position: 1, found: "number", .. }));
}

#[test]
fn ndjson_line_must_be_an_object() {
  let dir = TempDir::new().unwrap();
  let path = write_text(dir.path(), "r.ndjson", "{\"id\":\"a\"}\n[1,2]\n");
  let err = read_records(&path, InputFormat::NewlineDelimited).unwrap_err();
  assert!(matches!(err, ReaderError::NotAnObject { position: 1, found: "array", .. }));
}

#[test]
fn oversized_line_is_reported_not_truncated() {
  let dir = TempDir::new().unwrap();
  let long = format!("{{\"id\":\"{}\"}}", "x".repeat(64));
  let path = write_text(dir.path(), "r.ndjson", &format!("{{\"id\":\"a\"}}\n{long}\n"));

  let err = RecordReader::new(InputFormat::NewlineDelimited)
    .with_max_line_bytes(32)
    .open(&path)
    .unwrap_err();
  match err {
    ReaderError::LineTooLong { line, limit, .. } => {
      assert_eq!(line, 2);
      assert_eq!(limit, 32);
    }
    other => panic!("expected LineTooLong, got {other:?}"),
  }
}

#[test]
fn missing_file_is_io_error() {
  let dir = TempDir::new().unwrap();
  let err = RecordReader::new(InputFormat::NewlineDelimited)
    .open(dir.path().join("nope.ndjson"))
    .unwrap_err();
  assert!(matches!(err, ReaderError::Io { .. }));
  assert!(err.to_string().contains("nope.ndjson"));
}
