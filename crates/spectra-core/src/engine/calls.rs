//! Strongly typed argument shapes handed to the spectral engine. These are the
//! only values that carry engine-specific argument names.

use crate::domain::{Databank, FitMethod, FitParameterKind, SpectralQuantity};
use crate::units::WaveAxisUnit;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const REFERENCE_TEMPERATURE_K: f64 = 296.0;
pub const ARBITRARY_BROADENING_EXPONENT: f64 = 0.7;
pub const DEFAULT_SOLVER_GTOL: f64 = 1.0e-12;

/// Which isotopologues of a molecule enter the calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsotopeSelector {
    /// Databanks without isotope resolution take the sentinel `0`.
    Unresolved,
    All,
    Reference,
}

impl Serialize for IsotopeSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unresolved => serializer.serialize_u8(0),
            Self::All => serializer.serialize_str("all"),
            Self::Reference => serializer.serialize_str("1"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LoadColumns {
    #[serde(rename = "equilibrium")]
    Equilibrium,
    #[serde(rename = "noneq")]
    NonEquilibrium,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConditionSet {
    Equilibrium {
        #[serde(rename = "Tgas")]
        tgas: f64,
        mole_fraction: f64,
        /// bar
        pressure: f64,
        /// cm
        path_length: f64,
    },
    NonEquilibrium {
        #[serde(rename = "Tvib")]
        tvib: f64,
        #[serde(rename = "Trot")]
        trot: f64,
        mole_fraction: f64,
        pressure: f64,
        path_length: f64,
    },
}

impl ConditionSet {
    pub const fn load_columns(&self) -> LoadColumns {
        match self {
            Self::Equilibrium { .. } => LoadColumns::Equilibrium,
            Self::NonEquilibrium { .. } => LoadColumns::NonEquilibrium,
        }
    }

    pub const fn mole_fraction(&self) -> f64 {
        match self {
            Self::Equilibrium { mole_fraction, .. } | Self::NonEquilibrium { mole_fraction, .. } => {
                *mole_fraction
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaveWindow {
    #[serde(rename = "wmin")]
    pub min: f64,
    #[serde(rename = "wmax")]
    pub max: f64,
    #[serde(rename = "wunit")]
    pub unit: WaveAxisUnit,
}

/// Lorentzian broadening used for line lists without their own coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineBroadening {
    EngineDefault,
    PowerLaw {
        reference_temperature: f64,
        exponent: f64,
    },
}

impl LineBroadening {
    pub const fn arbitrary() -> Self {
        Self::PowerLaw {
            reference_temperature: REFERENCE_TEMPERATURE_K,
            exponent: ARBITRARY_BROADENING_EXPONENT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationCall {
    pub molecule: String,
    pub isotope: IsotopeSelector,
    #[serde(rename = "databank")]
    pub databank: Databank,
    #[serde(flatten)]
    pub window: WaveWindow,
    pub conditions: ConditionSet,
    pub load_columns: LoadColumns,
    #[serde(rename = "lbfunc")]
    pub broadening: LineBroadening,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ResamplePolicy {
    #[default]
    #[serde(rename = "intersect")]
    Intersect,
}

/// Ground-truth experimental conditions the fitted model starts from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitModel {
    pub molecule: String,
    pub isotope: IsotopeSelector,
    pub wmin: f64,
    pub wmax: f64,
    pub wunit: WaveAxisUnit,
    pub mole_fraction: f64,
    pub pressure: f64,
    pub path_length: f64,
    pub databank: Databank,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineControls {
    pub method: FitMethod,
    pub fit_var: SpectralQuantity,
    pub normalize: bool,
    pub max_loop: u32,
    pub tol: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolverOptions {
    pub gtol: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            gtol: DEFAULT_SOLVER_GTOL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitCall {
    pub fit_params: BTreeMap<FitParameterKind, f64>,
    pub bounds: BTreeMap<FitParameterKind, [f64; 2]>,
    pub model: FitModel,
    pub pipeline: PipelineControls,
    pub fit_kws: SolverOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitLog {
    pub fit_vals: BTreeMap<String, f64>,
    pub residual: f64,
    pub time_fitting: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome<S> {
    pub best: S,
    pub result: serde_json::Value,
    pub log: FitLog,
}
