//! Seam between the orchestration pipeline and the line-by-line spectral
//! engine. The pipeline only ever talks to [`SpectralEngine`] and
//! [`EngineSpectrum`]; [`ProcessEngine`] is the adapter that drives an
//! external engine process, and [`TabulatedSpectrum`] is the spectrum value
//! it hands back.

mod bridge;
mod calls;
mod tabulated;

pub use bridge::{
    DEFAULT_ENGINE_ARGS, DEFAULT_ENGINE_PROGRAM, ProcessEngine, ProcessEngineConfig, parse_reply,
};
pub use calls::{
    ARBITRARY_BROADENING_EXPONENT, CalculationCall, ConditionSet, DEFAULT_SOLVER_GTOL, FitCall,
    FitLog, FitModel, FitOutcome, IsotopeSelector, LineBroadening, LoadColumns, PipelineControls,
    REFERENCE_TEMPERATURE_K, ResamplePolicy, SolverOptions, WaveWindow,
};
pub use tabulated::{QuantityColumn, TabulatedSpectrum};

use crate::domain::SpectralQuantity;
use crate::numerics::SlitError;
use crate::units::WaveAxisUnit;
use std::path::Path;

/// Intensity unit convention used when reading quantities back for display.
pub const DEFAULT_INTENSITY_UNIT: &str = "default";

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No spectral line falls inside the requested window.
    #[error("{0}")]
    EmptyDatabase(String),
    #[error("{0}")]
    Failure(String),
    #[error("engine protocol error: {0}")]
    Protocol(String),
    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported intensity unit '{unit}' for {quantity}")]
    UnsupportedUnit {
        quantity: SpectralQuantity,
        unit: String,
    },
    #[error("spectrum has no quantity '{0}'")]
    UnknownQuantity(String),
    #[error(transparent)]
    Slit(#[from] SlitError),
}

/// Opaque spectrum produced by the engine. The pipeline never looks past
/// these accessors.
pub trait EngineSpectrum {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Native unit of the spectrum's wave axis.
    fn wave_unit(&self) -> WaveAxisUnit;

    /// Engine-generated name, used for download file names.
    fn name(&self) -> &str;

    fn unit_for(&self, quantity: SpectralQuantity) -> EngineResult<String>;

    /// Returns `(x, y)` for `quantity` with x expressed in `wave_unit`.
    /// Either sequence may contain not-a-number entries.
    fn get(
        &self,
        quantity: SpectralQuantity,
        wave_unit: WaveAxisUnit,
        intensity_unit: &str,
    ) -> EngineResult<(Vec<f64>, Vec<f64>)>;

    fn apply_slit(&mut self, width: f64, unit: WaveAxisUnit) -> EngineResult<()>;

    fn save_txt(
        &self,
        path: &Path,
        quantity: SpectralQuantity,
        wave_unit: WaveAxisUnit,
        intensity_unit: &str,
    ) -> EngineResult<()>;
}

/// Blocking line-by-line engine capability. Every call may fetch databank
/// files and run for minutes.
pub trait SpectralEngine {
    type Spectrum: EngineSpectrum;

    fn calculate(&self, call: &CalculationCall) -> EngineResult<Self::Spectrum>;

    fn merge(
        &self,
        spectra: Vec<Self::Spectrum>,
        policy: ResamplePolicy,
    ) -> EngineResult<Self::Spectrum>;

    /// Reads a spectrum file in the engine's own serialized format.
    fn load_spec(&self, path: &Path) -> EngineResult<Self::Spectrum>;

    /// Writes `spectrum` to `path` in the format `load_spec` reads.
    fn store(&self, spectrum: &Self::Spectrum, path: &Path, compress: bool) -> EngineResult<()>;

    fn load_txt(
        &self,
        path: &Path,
        quantity: SpectralQuantity,
        wave_unit: WaveAxisUnit,
        intensity_unit: &str,
    ) -> EngineResult<Self::Spectrum>;

    fn fit(
        &self,
        experimental: &Self::Spectrum,
        call: &FitCall,
    ) -> EngineResult<FitOutcome<Self::Spectrum>>;
}
