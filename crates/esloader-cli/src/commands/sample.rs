//! `esloader sample`

use tracing::info;

use esloader::{ModuloFit, find_modulo, read_sample_ids};

use crate::cli::SampleArgs;
use crate::errors::Result;

/// Loads the id list and searches the modulus.
pub fn run_sample(args: &SampleArgs) -> Result<ModuloFit> {
  let ids = read_sample_ids(&args.ids).map_err(esloader::LoaderError::from)?;
  info!(path = %args.ids.display(), ids = ids.len(), sample_target = args.target.get(), "id list loaded");
  Ok(find_modulo(&ids, args.target))
}
