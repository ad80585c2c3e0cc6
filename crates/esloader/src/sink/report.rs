//! 書き込み結果のレポート型定義
//!
//! Per-batch and per-run counters for bulk writes.

use std::time::Duration;

use serde::Serialize;

use crate::sink::bulk_client::BulkOutcome;

/// Result of one accepted bulk request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
  /// Documents in the request
  pub documents: usize,
  /// Items acknowledged with a status below 400
  pub created: usize,
  /// Attempts needed, the first one included
  pub attempts: u32,
  /// Server-side processing time reported by the sink
  pub took_ms: Option<u64>,
}

impl BatchReport {
  /// Whether the request needed at least one retry
  pub fn was_retried(&self) -> bool {
    self.attempts > 1
  }
}

/// Totals of an import run.
///
/// Only ever built for a run that completed: any failure aborts the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
  /// Files processed
  pub files: usize,
  /// Bulk requests sent (or skipped in dry run)
  pub batches: usize,
  /// Documents written (or that would have been written in dry run)
  pub documents: usize,
  /// Requests that needed a retry
  pub retried_batches: usize,
  /// Whether the run was a dry run
  pub dry_run: bool,
  /// Wall-clock duration of the run
  #[serde(with = "duration_secs")]
  pub elapsed: Duration,
}

impl ImportReport {
  /// Records a finished file
  pub fn record_file(&mut self) {
    self.files += 1;
  }

  /// Records a batch outcome
  pub fn record_batch(&mut self, outcome: &BulkOutcome) {
    self.batches += 1;
    self.documents += outcome.documents();
    if let BulkOutcome::Written(report) = outcome
      && report.was_retried()
    {
      self.retried_batches += 1;
    }
  }

  /// Documents per second over the whole run
  pub fn throughput(&self) -> f64 {
    let secs = self.elapsed.as_secs_f64();
    if secs > 0.0 { self.documents as f64 / secs } else { 0.0 }
  }
}

mod duration_secs {
  use std::time::Duration;

  use serde::Serializer;

  pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
  }
}
