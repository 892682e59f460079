//! Request orchestration between the wire models and the spectral engine.
//!
//! Calculation: [`calculate_mixture`] builds one engine call per species and
//! merges the results; [`reduce_spectrum`] shapes the response arrays.
//! Fitting: [`fit_experimental_spectrum`] maps the request, stages and loads
//! the upload and runs the engine fit.

pub mod fit;
pub mod fit_params;
pub mod mixture;
pub mod reducer;
pub mod species;

pub use fit::{FitReport, Upload, UploadFormat, fit_experimental_spectrum, text_intensity_unit};
pub use fit_params::{build_fit_call, coerce_fit_quantity, map_fit_parameters};
pub use mixture::{calculate_mixture, merge_species_spectra};
pub use reducer::{PAYLOAD_THRESHOLD_BYTES, ReducedSpectrum, decimation_stride, reduce_spectrum};
pub use species::{build_species_spectra, calculation_call};
