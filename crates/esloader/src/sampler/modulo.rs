//! Modulo Sampler
//!
//! Picks a modulus `m` so that keeping only the ids divisible by `m` yields
//! roughly a target number of ids.
//!
//! The search is a bounded scan of `[mid - 10, mid + 10)` around the estimate
//! `mid = len / target`. The divisor count is not monotonic in `m`, so no
//! closed form is attempted.

use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::errors::SamplerError;

/// Half-width of the scanned window around the estimate
pub const SEARCH_RADIUS: i64 = 10;

/// Chosen modulus and how far its count is from the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuloFit {
  /// Modulus to sample with
  pub modulus: i64,
  /// `|target - count of ids divisible by modulus|`
  pub deviation: usize,
}

impl std::fmt::Display for ModuloFit {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "modulus={} deviation={}", self.modulus, self.deviation)
  }
}

/// Finds the modulus whose divisibility count is closest to `target`.
///
/// `sorted_ids` is expected sorted ascending; this is not checked.
///
/// - `len <= target`: `(1, 0)`.
/// - Otherwise `mid = len / target` is the incumbent. Candidates are scanned
///   in ascending order, non-positive ones skipped; a candidate replaces the
///   best only with a strictly smaller deviation, and the scan stops at the
///   first deviation of 0.
pub fn find_modulo(sorted_ids: &[i64], target: NonZeroUsize) -> ModuloFit {
  let target = target.get();
  if sorted_ids.len() <= target {
    return ModuloFit { modulus: 1, deviation: 0 };
  }

  let mid = i64::try_from(sorted_ids.len() / target).unwrap_or(i64::MAX);
  let mut best = ModuloFit { modulus: mid, deviation: deviation(sorted_ids, mid, target) };

  for modulus in mid.saturating_sub(SEARCH_RADIUS)..mid.saturating_add(SEARCH_RADIUS) {
    if modulus <= 0 {
      continue;
    }
    let candidate = deviation(sorted_ids, modulus, target);
    if candidate < best.deviation {
      best = ModuloFit { modulus, deviation: candidate };
      if candidate == 0 {
        break;
      }
    }
  }

  debug!(ids = sorted_ids.len(), target, mid, modulus = best.modulus, deviation = best.deviation, "modulus search finished");
  best
}

/// Number of ids divisible by `modulus`
pub fn divisible_count(ids: &[i64], modulus: i64) -> usize {
  ids.iter().filter(|&&id| id % modulus == 0).count()
}

fn deviation(ids: &[i64], modulus: i64, target: usize) -> usize {
  target.abs_diff(divisible_count(ids, modulus))
}

/// Loads an id list: a header line, then one signed integer per line.
///
/// Blank lines are ignored. The result is sorted ascending; duplicate ids are
/// kept, so each one counts toward the sample as loaded.
///
/// # Errors
/// - `SamplerError::Io`: the file cannot be read
/// - `SamplerError::InvalidId`: a line is not an integer (1-based line number)
pub fn read_sample_ids<P: AsRef<Path>>(path: P) -> Result<Vec<i64>, SamplerError> {
  let path = path.as_ref();
  let content = fs::read_to_string(path)
    .map_err(|e| SamplerError::Io { path: path.to_path_buf(), source: Arc::new(e) })?;

  let mut ids = Vec::new();
  for (index, line) in content.lines().enumerate().skip(1) {
    let value = line.trim();
    if value.is_empty() {
      continue;
    }
    let id = value.parse::<i64>().map_err(|_| SamplerError::InvalidId {
      path: path.to_path_buf(),
      line: index + 1,
      value: value.to_string(),
    })?;
    ids.push(id);
  }

  ids.sort_unstable();
  Ok(ids)
}
