//! sampler module
//!
//! Modulus search for deterministic id sampling.

pub mod modulo;

pub use modulo::{ModuloFit, SEARCH_RADIUS, divisible_count, find_modulo, read_sample_ids};
