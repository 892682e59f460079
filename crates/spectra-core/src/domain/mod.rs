pub mod errors;
pub mod fit;

pub use errors::{
    EMPTY_RANGE_MESSAGE, INVALID_FILE_EXTENSION_MESSAGE, SpectraError, SpectraErrorCategory,
    SpectraResult,
};
pub use fit::{
    BoundingRanges, ExperimentalConditions, FitMethod, FitParameterKind, FitParameters,
    FitProperties, FitRequest, ParameterRange,
};

use crate::units::{LengthUnit, PressureUnit, WaveUnit};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectralQuantity {
    Absorbance,
    TransmittanceNoslit,
    RadianceNoslit,
    Transmittance,
    Radiance,
}

impl SpectralQuantity {
    pub const ALL: [Self; 5] = [
        Self::Absorbance,
        Self::TransmittanceNoslit,
        Self::RadianceNoslit,
        Self::Transmittance,
        Self::Radiance,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Absorbance => "absorbance",
            Self::TransmittanceNoslit => "transmittance_noslit",
            Self::RadianceNoslit => "radiance_noslit",
            Self::Transmittance => "transmittance",
            Self::Radiance => "radiance",
        }
    }

    /// The quantity produced from this one by slit convolution, if any.
    pub const fn slit_counterpart(self) -> Option<Self> {
        match self {
            Self::TransmittanceNoslit => Some(Self::Transmittance),
            Self::RadianceNoslit => Some(Self::Radiance),
            _ => None,
        }
    }
}

impl Display for SpectralQuantity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Databank {
    Hitran,
    Geisa,
    Hitemp,
    Exomol,
    Nist,
}

impl Databank {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hitran => "hitran",
            Self::Geisa => "geisa",
            Self::Hitemp => "hitemp",
            Self::Exomol => "exomol",
            Self::Nist => "nist",
        }
    }

    /// Gated sources whose downloads need provisioned credentials.
    pub const fn requires_credentials(self) -> bool {
        matches!(self, Self::Hitemp | Self::Nist)
    }

    /// NIST line lists carry neither isotope resolution nor broadening
    /// coefficients.
    pub const fn resolves_isotopes(self) -> bool {
        !matches!(self, Self::Nist)
    }

    pub const fn provides_broadening(self) -> bool {
        !matches!(self, Self::Nist)
    }
}

impl Display for Databank {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub molecule: String,
    pub mole_fraction: f64,
    pub is_all_isotopes: bool,
}

impl Species {
    pub fn validate(&self) -> SpectraResult<()> {
        if self.molecule.trim().is_empty() {
            return Err(SpectraError::input_validation(
                "INPUT.SPECIES_MOLECULE",
                "molecule must be defined",
            ));
        }
        if !(0.0..=1.0).contains(&self.mole_fraction) {
            return Err(SpectraError::input_validation(
                "INPUT.SPECIES_MOLE_FRACTION",
                format!(
                    "mole fraction of '{}' must be between 0 and 1, got {}",
                    self.molecule, self.mole_fraction
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumRequest {
    pub min_wavenumber_range: f64,
    pub max_wavenumber_range: f64,
    pub species: Vec<Species>,
    pub pressure: f64,
    pub tgas: f64,
    #[serde(default)]
    pub tvib: Option<f64>,
    #[serde(default)]
    pub trot: Option<f64>,
    pub path_length: f64,
    #[serde(default)]
    pub simulate_slit: Option<f64>,
    #[serde(default)]
    pub use_simulate_slit: bool,
    pub mode: SpectralQuantity,
    pub database: Databank,
    pub wavelength_units: WaveUnit,
    pub pressure_units: PressureUnit,
    pub path_length_units: LengthUnit,
}

impl SpectrumRequest {
    /// Both temperatures must be present for a non-equilibrium calculation.
    pub fn non_equilibrium_temperatures(&self) -> Option<(f64, f64)> {
        self.tvib.zip(self.trot)
    }

    pub fn slit_width(&self) -> Option<f64> {
        if self.use_simulate_slit {
            self.simulate_slit
        } else {
            None
        }
    }

    pub fn validate(&self) -> SpectraResult<()> {
        validate_window(self.min_wavenumber_range, self.max_wavenumber_range)?;
        if self.species.is_empty() {
            return Err(SpectraError::input_validation(
                "INPUT.SPECIES_EMPTY",
                "at least one species must be defined",
            ));
        }
        for species in &self.species {
            species.validate()?;
        }
        require_positive("INPUT.PRESSURE", "pressure", self.pressure)?;
        require_positive("INPUT.PATH_LENGTH", "path_length", self.path_length)?;
        require_positive("INPUT.TGAS", "tgas", self.tgas)?;
        if let Some(tvib) = self.tvib {
            require_positive("INPUT.TVIB", "tvib", tvib)?;
        }
        if let Some(trot) = self.trot {
            require_positive("INPUT.TROT", "trot", trot)?;
        }
        if self.use_simulate_slit {
            let width = self.simulate_slit.ok_or_else(|| {
                SpectraError::input_validation(
                    "INPUT.SLIT_WIDTH",
                    "simulate_slit must be defined when use_simulate_slit is enabled",
                )
            })?;
            require_positive("INPUT.SLIT_WIDTH", "simulate_slit", width)?;
        }
        Ok(())
    }
}

pub(crate) fn validate_window(min: f64, max: f64) -> SpectraResult<()> {
    if !min.is_finite() || !max.is_finite() || min >= max {
        return Err(SpectraError::input_validation(
            "INPUT.WINDOW_ORDER",
            format!(
                "min_wavenumber_range must be lower than max_wavenumber_range, got [{}, {}]",
                min, max
            ),
        ));
    }
    Ok(())
}

pub(crate) fn require_positive(code: &'static str, field: &str, value: f64) -> SpectraResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SpectraError::input_validation(
            code,
            format!("{} must be greater than 0, got {}", field, value),
        ))
    }
}
