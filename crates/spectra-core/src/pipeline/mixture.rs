use crate::domain::SpectrumRequest;
use crate::engine::{EngineError, EngineResult, ResamplePolicy, SpectralEngine};
use tracing::debug;

use super::species::build_species_spectra;

/// Overlays per-species spectra on the intersection of their wave axes. A
/// single spectrum is passed through without an engine call.
pub fn merge_species_spectra<E: SpectralEngine>(
    engine: &E,
    mut spectra: Vec<E::Spectrum>,
) -> EngineResult<E::Spectrum> {
    if spectra.len() > 1 {
        debug!(count = spectra.len(), "merging species spectra on intersecting axis");
        return engine.merge(spectra, ResamplePolicy::Intersect);
    }
    spectra
        .pop()
        .ok_or_else(|| EngineError::Failure("no species spectra to merge".to_string()))
}

/// Calculation path up to the mixture spectrum: one call per species, then
/// the merge.
pub fn calculate_mixture<E: SpectralEngine>(
    engine: &E,
    request: &SpectrumRequest,
) -> EngineResult<E::Spectrum> {
    let spectra = build_species_spectra(engine, request)?;
    merge_species_spectra(engine, spectra)
}
