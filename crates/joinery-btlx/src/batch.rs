//! Parallel derivation of many processings.

use crate::deferred::ProcessingInput;
use crate::{BtlxSettings, Processing, Result};
use joinery_kernel_blank::Beam;
use rayon::prelude::*;
use tracing::debug;

/// Derive every input on its blank in parallel.
///
/// Results come back in input order; one failure does not affect the others.
pub fn derive_all(inputs: &[(ProcessingInput, &Beam)], settings: &BtlxSettings) -> Vec<Result<Processing>> {
    debug!(count = inputs.len(), "deriving processings");
    let results: Vec<_> = inputs
        .par_iter()
        .map(|(input, beam)| input.derive(beam, settings))
        .collect();
    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        debug!(failed, "some derivations failed");
    }
    results
}
