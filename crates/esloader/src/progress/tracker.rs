//! Progress Tracker
//!
//! Fractional completion across a multi-file run and an ETA extrapolated
//! linearly from elapsed time.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// Point-in-time view of run progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
  /// 0-based index of the current file
  pub file_index: usize,
  /// Files in the run
  pub total_files: usize,
  /// Records done in the current file
  pub done_in_file: usize,
  /// Records in the current file
  pub total_in_file: usize,
  /// Completion of the current file in `[0, 1]`
  pub file_fraction: f64,
  /// Completion of the run in `[0, 1]`
  pub overall_fraction: f64,
  /// Time since the run started
  pub elapsed: Duration,
  /// Estimated remaining time; `None` before any progress
  pub eta: Option<Duration>,
}

impl ProgressSnapshot {
  /// Computes fractions and ETA.
  ///
  /// `overall = (file_index + file_fraction) / total_files` and
  /// `eta = elapsed / overall - elapsed`. A file with no records counts as done.
  pub fn compute(
    file_index: usize,
    total_files: usize,
    done_in_file: usize,
    total_in_file: usize,
    elapsed: Duration,
  ) -> Self {
    let file_fraction = if total_in_file == 0 {
      1.0
    } else {
      (done_in_file.min(total_in_file) as f64) / total_in_file as f64
    };
    let overall_fraction = if total_files == 0 {
      0.0
    } else {
      ((file_index as f64 + file_fraction) / total_files as f64).min(1.0)
    };

    Self {
      file_index,
      total_files,
      done_in_file,
      total_in_file,
      file_fraction,
      overall_fraction,
      elapsed,
      eta: estimate_remaining(elapsed, overall_fraction),
    }
  }

  /// Overall completion as a percentage
  pub fn percent(&self) -> f64 {
    self.overall_fraction * 100.0
  }
}

/// `elapsed / fraction - elapsed`, or `None` when the fraction is not positive and finite.
fn estimate_remaining(elapsed: Duration, fraction: f64) -> Option<Duration> {
  if !fraction.is_finite() || fraction <= 0.0 {
    return None;
  }
  let total = elapsed.as_secs_f64() / fraction;
  Duration::try_from_secs_f64((total - elapsed.as_secs_f64()).max(0.0)).ok()
}

/// Rounds to whole seconds so `humantime` prints `1m 5s`, not nanoseconds.
pub fn human_duration(duration: Duration) -> humantime::FormattedDuration {
  humantime::format_duration(Duration::from_secs(duration.as_secs()))
}

impl fmt::Display for ProgressSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "file {}/{} ({}/{} records), {:.1}% overall, elapsed {}",
      self.file_index + 1,
      self.total_files,
      self.done_in_file,
      self.total_in_file,
      self.percent(),
      human_duration(self.elapsed),
    )?;
    if let Some(eta) = self.eta {
      write!(f, ", eta {}", human_duration(eta))?;
    }
    Ok(())
  }
}

/// Advancing counters for one import run.
#[derive(Debug)]
pub struct ProgressTracker {
  started: Instant,
  total_files: usize,
  interval: usize,
  file_index: usize,
  files_started: usize,
  done_in_file: usize,
  total_in_file: usize,
}

impl ProgressTracker {
  /// Starts the clock for a run over `total_files` files, reporting every
  /// `interval` records (0 is treated as 1).
  pub fn new(total_files: usize, interval: usize) -> Self {
    Self {
      started: Instant::now(),
      total_files,
      interval: interval.max(1),
      file_index: 0,
      files_started: 0,
      done_in_file: 0,
      total_in_file: 0,
    }
  }

  /// Moves on to the next file, which holds `total_in_file` records.
  pub fn start_file(&mut self, total_in_file: usize) {
    if self.files_started > 0 {
      self.file_index += 1;
    }
    self.files_started += 1;
    self.done_in_file = 0;
    self.total_in_file = total_in_file;
  }

  /// Adds `records` to the current file.
  ///
  /// Returns a snapshot when the count crosses a multiple of the interval.
  pub fn record_batch(&mut self, records: usize) -> Option<ProgressSnapshot> {
    let before = self.done_in_file / self.interval;
    self.done_in_file += records;
    let after = self.done_in_file / self.interval;
    (after > before).then(|| self.snapshot())
  }

  /// Current progress
  pub fn snapshot(&self) -> ProgressSnapshot {
    ProgressSnapshot::compute(
      self.file_index,
      self.total_files,
      self.done_in_file,
      self.total_in_file,
      self.elapsed(),
    )
  }

  /// Time since the tracker was created
  pub fn elapsed(&self) -> Duration {
    self.started.elapsed()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn overall_fraction_combines_file_index_and_file_fraction() {
    let s = ProgressSnapshot::compute(1, 4, 250, 1000, Duration::from_secs(100));
    assert_eq!(s.file_fraction, 0.25);
    assert_eq!(s.overall_fraction, 1.25 / 4.0);
  }

  #[test]
  fn eta_extrapolates_linearly() {
    // Half done after 60s: 60s to go.
    let s = ProgressSnapshot::compute(0, 2, 10, 10, Duration::from_secs(60));
    assert_eq!(s.overall_fraction, 0.5);
    assert_eq!(s.eta, Some(Duration::from_secs(60)));
  }

  #[test]
  fn no_eta_without_progress() {
    let s = ProgressSnapshot::compute(0, 3, 0, 100, Duration::from_secs(5));
    assert_eq!(s.eta, None);
    assert!(!s.to_string().contains("eta"));
  }

  #[test]
  fn empty_file_counts_as_done() {
    let s = ProgressSnapshot::compute(0, 1, 0, 0, Duration::from_secs(1));
    assert_eq!(s.file_fraction, 1.0);
    assert_eq!(s.eta, Some(Duration::ZERO));
  }

  #[test]
  fn display_renders_humantime() {
    let s = ProgressSnapshot::compute(0, 2, 10, 10, Duration::from_millis(65_400));
    let line = s.to_string();
    assert!(line.starts_with("file 1/2 (10/10 records), 50.0% overall"), "{line}");
    assert!(line.contains("elapsed 1m 5s"), "{line}");
    assert!(line.contains("eta 1m 5s"), "{line}");
  }

  #[test]
  fn record_batch_reports_on_interval_crossings() {
    let mut tracker = ProgressTracker::new(1, 1000);
    tracker.start_file(2600);
    let emitted: Vec<bool> =
      (0..6).map(|_| tracker.record_batch(500).is_some()).collect();
    // 500, 1000, 1500, 2000, 2500, 3000
    assert_eq!(emitted, vec![false, true, false, true, false, true]);
  }

  #[test]
  fn start_file_advances_index_and_resets_counts() {
    let mut tracker = ProgressTracker::new(3, 10);
    tracker.start_file(5);
    tracker.record_batch(5);
    tracker.start_file(20);
    let s = tracker.snapshot();
    assert_eq!(s.file_index, 1);
    assert_eq!(s.done_in_file, 0);
    assert_eq!(s.total_in_file, 20);
  }

  #[tokio::test(start_paused = true)]
  async fn tracker_elapsed_follows_the_runtime_clock() {
    let mut tracker = ProgressTracker::new(1, 1);
    tracker.start_file(4);
    tokio::time::sleep(Duration::from_secs(30)).await;
    let s = tracker.record_batch(1).unwrap();
    assert_eq!(s.elapsed, Duration::from_secs(30));
    assert_eq!(s.eta, Some(Duration::from_secs(90)));
  }
}
