//! Closed unit vocabulary accepted on the wire and the factors that bring a
//! caller value into the engine's canonical units: wavenumber in `cm-1` or
//! wavelength in `nm`, pressure in bar, path length in cm.
//!
//! Unknown tags never reach this module; they fail request deserialization.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// `1 / (1 cm-1)` expressed in nanometres.
pub const NM_PER_INVERSE_CM: f64 = 1.0e7;
pub const BAR_PER_ATM: f64 = 1.01325;
const TORR_PER_ATM: f64 = 760.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaveUnit {
    #[serde(rename = "1/u.cm")]
    InverseCentimeter,
    #[serde(rename = "u.nm")]
    Nanometer,
}

impl WaveUnit {
    pub const ALL: [Self; 2] = [Self::InverseCentimeter, Self::Nanometer];

    pub const fn tag(self) -> &'static str {
        match self {
            Self::InverseCentimeter => "1/u.cm",
            Self::Nanometer => "u.nm",
        }
    }

    /// Window bounds are already expressed in the axis unit selected by the
    /// tag, so the factor is the identity for both members.
    pub const fn factor(self) -> f64 {
        1.0
    }

    pub const fn axis_unit(self) -> WaveAxisUnit {
        match self {
            Self::InverseCentimeter => WaveAxisUnit::Wavenumber,
            Self::Nanometer => WaveAxisUnit::Wavelength,
        }
    }
}

/// Wave-axis unit labels understood by the spectral engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaveAxisUnit {
    #[serde(rename = "cm-1")]
    Wavenumber,
    #[serde(rename = "nm")]
    Wavelength,
}

impl WaveAxisUnit {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wavenumber => "cm-1",
            Self::Wavelength => "nm",
        }
    }
}

impl Display for WaveAxisUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PressureUnit {
    #[serde(rename = "u.bar")]
    Bar,
    #[serde(rename = "u.mbar")]
    Millibar,
    #[serde(rename = "cds.atm")]
    Atmosphere,
    #[serde(rename = "u.torr")]
    Torr,
    #[serde(rename = "u.mTorr")]
    Millitorr,
    #[serde(rename = "u.Pa")]
    Pascal,
}

impl PressureUnit {
    pub const ALL: [Self; 6] = [
        Self::Bar,
        Self::Millibar,
        Self::Atmosphere,
        Self::Torr,
        Self::Millitorr,
        Self::Pascal,
    ];

    pub const fn tag(self) -> &'static str {
        match self {
            Self::Bar => "u.bar",
            Self::Millibar => "u.mbar",
            Self::Atmosphere => "cds.atm",
            Self::Torr => "u.torr",
            Self::Millitorr => "u.mTorr",
            Self::Pascal => "u.Pa",
        }
    }

    /// Multiplier converting a value in this unit to bar.
    pub const fn factor(self) -> f64 {
        match self {
            Self::Bar => 1.0,
            Self::Millibar => 1.0e-3,
            Self::Atmosphere => BAR_PER_ATM,
            Self::Torr => BAR_PER_ATM / TORR_PER_ATM,
            Self::Millitorr => BAR_PER_ATM / TORR_PER_ATM * 1.0e-3,
            Self::Pascal => 1.0e-5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LengthUnit {
    #[serde(rename = "u.cm")]
    Centimeter,
    #[serde(rename = "u.m")]
    Meter,
    #[serde(rename = "u.km")]
    Kilometer,
    #[serde(rename = "u.mm")]
    Millimeter,
}

impl LengthUnit {
    pub const ALL: [Self; 4] = [
        Self::Centimeter,
        Self::Meter,
        Self::Kilometer,
        Self::Millimeter,
    ];

    pub const fn tag(self) -> &'static str {
        match self {
            Self::Centimeter => "u.cm",
            Self::Meter => "u.m",
            Self::Kilometer => "u.km",
            Self::Millimeter => "u.mm",
        }
    }

    /// Multiplier converting a value in this unit to centimetres.
    pub const fn factor(self) -> f64 {
        match self {
            Self::Centimeter => 1.0,
            Self::Meter => 1.0e2,
            Self::Kilometer => 1.0e5,
            Self::Millimeter => 1.0e-1,
        }
    }
}

/// Converts between wavenumber (`cm-1`) and wavelength (`nm`); the mapping is
/// its own inverse.
pub fn invert_wave_axis(value: f64) -> f64 {
    NM_PER_INVERSE_CM / value
}
