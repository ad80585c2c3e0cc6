//! progress module
//!
//! Completion fractions and ETA for multi-file runs.

pub mod tracker;

pub use tracker::{ProgressSnapshot, ProgressTracker, human_duration};
