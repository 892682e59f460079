//! The four service operations, independent of any HTTP framework.

mod response;

pub use response::{ApiResponse, FitResponse};

use crate::credentials::CredentialProvider;
use crate::domain::{FitRequest, SpectraError, SpectraResult, SpectrumRequest};
use crate::engine::{DEFAULT_INTENSITY_UNIT, EngineSpectrum, SpectralEngine};
use crate::pipeline::{
    ReducedSpectrum, Upload, UploadFormat, calculate_mixture, fit_experimental_spectrum,
    reduce_spectrum,
};
use crate::units::WaveAxisUnit;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::info;

pub const DOWNLOAD_MEDIA_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Where download files are staged until the response is built.
    pub download_dir: PathBuf,
    /// Where fit uploads are staged while the engine reads them.
    pub upload_dir: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let temp = std::env::temp_dir();
        Self {
            download_dir: temp.join("spectra-downloads"),
            upload_dir: temp,
        }
    }
}

/// A file prepared for download. The backing file is removed when the
/// artifact is consumed or dropped.
#[derive(Debug)]
pub struct DownloadArtifact {
    pub file_name: String,
    pub media_type: &'static str,
    path: TempPath,
}

impl DownloadArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_bytes(self) -> SpectraResult<Vec<u8>> {
        let bytes = fs::read(&self.path).map_err(|error| {
            SpectraError::io_system(
                "IO.DOWNLOAD_READ",
                format!("failed to read '{}': {}", self.path.display(), error),
            )
        })?;
        self.path.close().map_err(|error| {
            SpectraError::io_system(
                "IO.DOWNLOAD_CLEANUP",
                format!("failed to remove download file: {}", error),
            )
        })?;
        Ok(bytes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DownloadKind {
    Spectrum,
    Text,
}

impl DownloadKind {
    const fn extension(self) -> &'static str {
        match self {
            Self::Spectrum => "spec",
            Self::Text => "csv",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpectrumService<E, C> {
    engine: E,
    credentials: C,
    config: ServiceConfig,
}

impl<E, C> SpectrumService<E, C>
where
    E: SpectralEngine,
    C: CredentialProvider,
{
    pub fn new(engine: E, credentials: C, config: ServiceConfig) -> Self {
        Self {
            engine,
            credentials,
            config,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn credentials(&self) -> &C {
        &self.credentials
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn mixture(&self, request: &SpectrumRequest) -> SpectraResult<E::Spectrum> {
        request.validate()?;
        info!(
            database = %request.database,
            mode = %request.mode,
            species = request.species.len(),
            non_equilibrium = request.non_equilibrium_temperatures().is_some(),
            "calculating spectrum"
        );
        self.credentials.ensure_configured(request.database)?;
        Ok(calculate_mixture(&self.engine, request)?)
    }

    /// Mixture spectrum, slit-convolved in the request's own wave unit when
    /// enabled, reduced for the response.
    pub fn calculate(&self, request: &SpectrumRequest) -> SpectraResult<ReducedSpectrum> {
        let display_unit = request.wavelength_units.axis_unit();
        let mut spectrum = self.mixture(request)?;
        if let Some(width) = request.slit_width() {
            spectrum.apply_slit(width, display_unit)?;
        }
        Ok(reduce_spectrum(&spectrum, request.mode, display_unit)?)
    }

    pub fn download_spectrum(&self, request: &SpectrumRequest) -> SpectraResult<DownloadArtifact> {
        self.download(request, DownloadKind::Spectrum)
    }

    pub fn download_txt(&self, request: &SpectrumRequest) -> SpectraResult<DownloadArtifact> {
        self.download(request, DownloadKind::Text)
    }

    fn download(
        &self,
        request: &SpectrumRequest,
        kind: DownloadKind,
    ) -> SpectraResult<DownloadArtifact> {
        let mut spectrum = self.mixture(request)?;
        let file_name = format!("{}.{}", spectrum.name(), kind.extension());
        // downloads always take the slit width in nanometres
        if let Some(width) = request.slit_width() {
            spectrum.apply_slit(width, WaveAxisUnit::Wavelength)?;
        }

        let path = self.stage_download(kind)?;
        match kind {
            DownloadKind::Spectrum => self.engine.store(&spectrum, &path, true)?,
            DownloadKind::Text => spectrum.save_txt(
                &path,
                request.mode,
                request.wavelength_units.axis_unit(),
                DEFAULT_INTENSITY_UNIT,
            )?,
        }
        info!(file_name = %file_name, "prepared download");

        Ok(DownloadArtifact {
            file_name,
            media_type: DOWNLOAD_MEDIA_TYPE,
            path,
        })
    }

    fn stage_download(&self, kind: DownloadKind) -> SpectraResult<TempPath> {
        let directory = &self.config.download_dir;
        let staging_error = |error: std::io::Error| {
            SpectraError::io_system(
                "IO.DOWNLOAD_STAGING",
                format!(
                    "failed to prepare download in '{}': {}",
                    directory.display(),
                    error
                ),
            )
        };
        fs::create_dir_all(directory).map_err(staging_error)?;
        let staged = tempfile::Builder::new()
            .prefix("spectra-download-")
            .suffix(&format!(".{}", kind.extension()))
            .tempfile_in(directory)
            .map_err(staging_error)?;
        Ok(staged.into_temp_path())
    }

    /// Fits an uploaded experimental spectrum. Both spectra are reduced with
    /// the coerced fit quantity, so `units` reflects the coercion.
    pub fn fit(&self, request: &FitRequest, upload: Upload<'_>) -> SpectraResult<FitResponse> {
        request.validate()?;
        let conditions = &request.experimental_conditions;
        info!(
            database = %conditions.database,
            molecule = %conditions.specie.molecule,
            file_name = upload.file_name,
            "fitting spectrum"
        );
        UploadFormat::from_file_name(upload.file_name)?;
        self.credentials.ensure_configured(conditions.database)?;

        let report =
            fit_experimental_spectrum(&self.engine, request, upload, &self.config.upload_dir)?;
        let display_unit = conditions.wavelength_units.axis_unit();

        Ok(FitResponse {
            experimental_spectrum: reduce_spectrum(
                &report.experimental,
                report.fit_var,
                display_unit,
            )?,
            best_spectrum: reduce_spectrum(&report.best, report.fit_var, display_unit)?,
            units: report.experimental.unit_for(report.fit_var)?,
            fit_vals: report.log.fit_vals,
            residual: report.log.residual,
            time_fitting: report.log.time_fitting,
        })
    }
}
