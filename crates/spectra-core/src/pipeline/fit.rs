use crate::domain::{FitRequest, SpectraError, SpectraResult, SpectralQuantity};
use crate::engine::{EngineResult, FitLog, SpectralEngine};
use crate::units::WaveAxisUnit;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use super::fit_params::{build_fit_call, coerce_fit_quantity};

pub const UPLOAD_PREFIX: &str = "spectra-upload-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    /// Engine-native serialized spectrum (`.spec`).
    NativeSpectrum,
    /// Delimited text (`.txt`, `.csv`).
    DelimitedText,
}

impl UploadFormat {
    pub fn from_file_name(file_name: &str) -> SpectraResult<Self> {
        if file_name.ends_with(".spec") {
            Ok(Self::NativeSpectrum)
        } else if file_name.ends_with(".txt") || file_name.ends_with(".csv") {
            Ok(Self::DelimitedText)
        } else {
            Err(SpectraError::invalid_file_extension())
        }
    }
}

/// Intensity unit assumed for delimited-text uploads.
pub fn text_intensity_unit(wave_unit: WaveAxisUnit) -> String {
    format!("mW/cm2/sr/{}", wave_unit)
}

#[derive(Debug, Clone, Copy)]
pub struct Upload<'a> {
    pub file_name: &'a str,
    pub bytes: &'a [u8],
}

#[derive(Debug, Clone)]
pub struct FitReport<S> {
    pub experimental: S,
    pub best: S,
    pub fit_var: SpectralQuantity,
    pub result: serde_json::Value,
    pub log: FitLog,
}

/// Writes the upload under a unique name in `staging_dir`, loads it through
/// the engine and removes the staged file before returning, whether or not
/// the load succeeded.
pub fn load_experimental_spectrum<E: SpectralEngine>(
    engine: &E,
    upload: Upload<'_>,
    format: UploadFormat,
    quantity: SpectralQuantity,
    wave_unit: WaveAxisUnit,
    staging_dir: &Path,
) -> SpectraResult<E::Spectrum> {
    let suffix = Path::new(upload.file_name)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| format!(".{}", extension))
        .unwrap_or_default();

    let mut staged = tempfile::Builder::new()
        .prefix(UPLOAD_PREFIX)
        .suffix(&suffix)
        .tempfile_in(staging_dir)
        .map_err(|error| staging_error(staging_dir, error))?;
    staged
        .write_all(upload.bytes)
        .and_then(|()| staged.flush())
        .map_err(|error| staging_error(staging_dir, error))?;
    debug!(
        path = %staged.path().display(),
        bytes = upload.bytes.len(),
        "staged experimental spectrum"
    );

    let loaded: EngineResult<E::Spectrum> = match format {
        UploadFormat::NativeSpectrum => engine.load_spec(staged.path()),
        UploadFormat::DelimitedText => engine.load_txt(
            staged.path(),
            quantity,
            wave_unit,
            &text_intensity_unit(wave_unit),
        ),
    };

    staged
        .close()
        .map_err(|error| staging_error(staging_dir, error))?;
    Ok(loaded?)
}

fn staging_error(staging_dir: &Path, error: std::io::Error) -> SpectraError {
    SpectraError::io_system(
        "IO.UPLOAD_STAGING",
        format!(
            "failed to stage upload in '{}': {}",
            staging_dir.display(),
            error
        ),
    )
}

/// Fitting path: extension check, parameter mapping, upload load, engine fit.
/// Nothing reaches the engine when the extension or the mapping is rejected.
pub fn fit_experimental_spectrum<E: SpectralEngine>(
    engine: &E,
    request: &FitRequest,
    upload: Upload<'_>,
    staging_dir: &Path,
) -> SpectraResult<FitReport<E::Spectrum>> {
    let format = UploadFormat::from_file_name(upload.file_name)?;
    let fit_var = coerce_fit_quantity(request.fit_properties.fit_var);
    let call = build_fit_call(request)?;
    let wave_unit = request.experimental_conditions.wavelength_units.axis_unit();

    let experimental =
        load_experimental_spectrum(engine, upload, format, fit_var, wave_unit, staging_dir)?;

    info!(
        molecule = %call.model.molecule,
        databank = %call.model.databank,
        fit_var = %fit_var,
        parameters = call.fit_params.len(),
        "fitting experimental spectrum"
    );
    let outcome = engine.fit(&experimental, &call)?;
    info!(
        residual = outcome.log.residual,
        time_fitting = outcome.log.time_fitting,
        "fit finished"
    );

    Ok(FitReport {
        experimental,
        best: outcome.best,
        fit_var,
        result: outcome.result,
        log: outcome.log,
    })
}
