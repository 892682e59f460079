use super::{
    Databank, SpectraError, SpectraResult, SpectralQuantity, Species, require_positive,
    validate_window,
};
use crate::units::{LengthUnit, PressureUnit, WaveUnit};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_LOOPS: u32 = 200;
pub const MAX_LOOPS_LIMIT: u32 = 1000;
pub const DEFAULT_TOLERANCE: f64 = 1.0e-15;
pub const DEFAULT_EXPERIMENTAL_SLIT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FitMethod {
    #[default]
    #[serde(rename = "least_squares")]
    LeastSquares,
}

/// The five quantities an optimizer may vary. Ordering follows the wire
/// declaration and drives map iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FitParameterKind {
    #[serde(rename = "Tgas")]
    Tgas,
    #[serde(rename = "Tvib")]
    Tvib,
    #[serde(rename = "Trot")]
    Trot,
    #[serde(rename = "mole_fraction")]
    MoleFraction,
    #[serde(rename = "pressure")]
    Pressure,
}

impl FitParameterKind {
    pub const ALL: [Self; 5] = [
        Self::Tgas,
        Self::Tvib,
        Self::Trot,
        Self::MoleFraction,
        Self::Pressure,
    ];

    /// Name used in request bodies.
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Tgas => "tgas",
            Self::Tvib => "tvib",
            Self::Trot => "trot",
            Self::MoleFraction => "mole_fraction",
            Self::Pressure => "pressure",
        }
    }

    /// Name the fitting routine expects and reports back in `fit_vals`.
    pub const fn engine_name(self) -> &'static str {
        match self {
            Self::Tgas => "Tgas",
            Self::Tvib => "Tvib",
            Self::Trot => "Trot",
            Self::MoleFraction => "mole_fraction",
            Self::Pressure => "pressure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl ParameterRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    fn validate(&self, kind: FitParameterKind) -> SpectraResult<()> {
        let (Some(min), Some(max)) = (self.min, self.max) else {
            return Ok(());
        };
        if min >= max {
            return Err(SpectraError::input_validation(
                "INPUT.BOUNDS_ORDER",
                format!(
                    "bounding range for '{}' must be in the form {{min < max}}, got [{}, {}]",
                    kind.wire_name(),
                    min,
                    max
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingRanges {
    #[serde(default)]
    pub tgas: Option<ParameterRange>,
    #[serde(default)]
    pub tvib: Option<ParameterRange>,
    #[serde(default)]
    pub trot: Option<ParameterRange>,
    #[serde(default)]
    pub mole_fraction: Option<ParameterRange>,
    #[serde(default)]
    pub pressure: Option<ParameterRange>,
}

impl BoundingRanges {
    pub fn range(&self, kind: FitParameterKind) -> Option<ParameterRange> {
        match kind {
            FitParameterKind::Tgas => self.tgas,
            FitParameterKind::Tvib => self.tvib,
            FitParameterKind::Trot => self.trot,
            FitParameterKind::MoleFraction => self.mole_fraction,
            FitParameterKind::Pressure => self.pressure,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FitParameters {
    #[serde(default)]
    pub tgas: Option<f64>,
    #[serde(default)]
    pub tvib: Option<f64>,
    #[serde(default)]
    pub trot: Option<f64>,
    #[serde(default)]
    pub mole_fraction: Option<f64>,
    #[serde(default)]
    pub pressure: Option<f64>,
}

impl FitParameters {
    pub fn value(&self, kind: FitParameterKind) -> Option<f64> {
        match kind {
            FitParameterKind::Tgas => self.tgas,
            FitParameterKind::Tvib => self.tvib,
            FitParameterKind::Trot => self.trot,
            FitParameterKind::MoleFraction => self.mole_fraction,
            FitParameterKind::Pressure => self.pressure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitProperties {
    #[serde(default)]
    pub method: FitMethod,
    pub fit_var: SpectralQuantity,
    #[serde(default)]
    pub normalize: bool,
    #[serde(default = "default_max_loops")]
    pub max_loops: u32,
    #[serde(default = "default_tolerance")]
    pub tol: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentalConditions {
    pub min_wavenumber_range: f64,
    pub max_wavenumber_range: f64,
    pub specie: Species,
    pub pressure: f64,
    pub path_length: f64,
    #[serde(default = "default_experimental_slit")]
    pub simulate_slit: Option<f64>,
    #[serde(default)]
    pub use_simulate_slit: bool,
    #[serde(default)]
    pub mode: Option<SpectralQuantity>,
    pub database: Databank,
    pub wavelength_units: WaveUnit,
    pub pressure_units: PressureUnit,
    pub path_length_units: LengthUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitRequest {
    pub fit_properties: FitProperties,
    #[serde(default)]
    pub bounding_ranges: BoundingRanges,
    #[serde(default)]
    pub fit_parameters: FitParameters,
    pub experimental_conditions: ExperimentalConditions,
    #[serde(default)]
    pub use_simulate_slit: bool,
    #[serde(default)]
    pub simulate_slit: Option<f64>,
}

impl FitRequest {
    /// Slit width in nanometres applied to the fit model. Only the
    /// experimental block controls it; the top-level pair is accepted on the
    /// wire and ignored.
    pub fn slit_width(&self) -> Option<f64> {
        let conditions = &self.experimental_conditions;
        conditions
            .use_simulate_slit
            .then_some(conditions.simulate_slit)
            .flatten()
    }

    pub fn validate(&self) -> SpectraResult<()> {
        let properties = &self.fit_properties;
        if !(1..=MAX_LOOPS_LIMIT).contains(&properties.max_loops) {
            return Err(SpectraError::input_validation(
                "INPUT.FIT_MAX_LOOPS",
                format!(
                    "max_loops must be between 1 and {}, got {}",
                    MAX_LOOPS_LIMIT, properties.max_loops
                ),
            ));
        }
        require_positive("INPUT.FIT_TOLERANCE", "tol", properties.tol)?;

        for kind in FitParameterKind::ALL {
            if let Some(range) = self.bounding_ranges.range(kind) {
                range.validate(kind)?;
            }
            if let Some(value) = self.fit_parameters.value(kind) {
                validate_initial_value(kind, value)?;
            }
        }

        let conditions = &self.experimental_conditions;
        if conditions.min_wavenumber_range < 0.0 {
            return Err(SpectraError::input_validation(
                "INPUT.WINDOW_NEGATIVE",
                "min_wavenumber_range must be greater than or equal to 0",
            ));
        }
        validate_window(conditions.min_wavenumber_range, conditions.max_wavenumber_range)?;
        conditions.specie.validate()?;
        require_positive("INPUT.PRESSURE", "pressure", conditions.pressure)?;
        require_positive("INPUT.PATH_LENGTH", "path_length", conditions.path_length)?;
        if let Some(width) = self.slit_width() {
            require_positive("INPUT.SLIT_WIDTH", "simulate_slit", width)?;
        }
        Ok(())
    }
}

fn validate_initial_value(kind: FitParameterKind, value: f64) -> SpectraResult<()> {
    match kind {
        FitParameterKind::MoleFraction if !(0.0..=1.0).contains(&value) => {
            Err(SpectraError::input_validation(
                "INPUT.FIT_INITIAL_VALUE",
                format!("initial mole_fraction must be between 0 and 1, got {}", value),
            ))
        }
        FitParameterKind::MoleFraction => Ok(()),
        _ => require_positive("INPUT.FIT_INITIAL_VALUE", kind.wire_name(), value),
    }
}

fn default_max_loops() -> u32 {
    DEFAULT_MAX_LOOPS
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_experimental_slit() -> Option<f64> {
    Some(DEFAULT_EXPERIMENTAL_SLIT)
}
