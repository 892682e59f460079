use super::{EngineError, EngineResult, EngineSpectrum, DEFAULT_INTENSITY_UNIT};
use crate::domain::SpectralQuantity;
use crate::numerics::{convolve_triangular, slit_width_on_axis};
use crate::units::{WaveAxisUnit, invert_wave_axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityColumn {
    pub unit: String,
    pub values: Vec<f64>,
}

/// Spectrum sampled on one wave axis with any number of quantity columns.
/// This is the value exchanged with the engine process, not the engine's
/// on-disk spectrum format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabulatedSpectrum {
    pub name: String,
    pub wave_unit: WaveAxisUnit,
    pub axis: Vec<f64>,
    #[serde(default)]
    pub quantities: BTreeMap<SpectralQuantity, QuantityColumn>,
}

impl TabulatedSpectrum {
    pub fn new(name: impl Into<String>, wave_unit: WaveAxisUnit, axis: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            wave_unit,
            axis,
            quantities: BTreeMap::new(),
        }
    }

    pub fn with_quantity(
        mut self,
        quantity: SpectralQuantity,
        unit: impl Into<String>,
        values: Vec<f64>,
    ) -> Self {
        self.quantities.insert(
            quantity,
            QuantityColumn {
                unit: unit.into(),
                values,
            },
        );
        self
    }

    /// Every column must be sampled on the full axis.
    pub fn validate(&self) -> EngineResult<()> {
        for (quantity, column) in &self.quantities {
            if column.values.len() != self.axis.len() {
                return Err(EngineError::Protocol(format!(
                    "spectrum '{}' column {} has {} values for {} axis points",
                    self.name,
                    quantity,
                    column.values.len(),
                    self.axis.len()
                )));
            }
        }
        Ok(())
    }

    /// Parses two-column delimited text. Commas, semicolons, tabs and spaces
    /// all separate columns; lines that do not start with two numbers are
    /// treated as headers or comments.
    pub fn read_txt(
        path: &Path,
        quantity: SpectralQuantity,
        wave_unit: WaveAxisUnit,
        unit: &str,
    ) -> EngineResult<Self> {
        let content = fs::read_to_string(path)?;
        let mut axis = Vec::new();
        let mut values = Vec::new();
        for line in content.lines() {
            let mut fields = line
                .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                .filter(|field| !field.is_empty());
            let (Some(x), Some(y)) = (fields.next(), fields.next()) else {
                continue;
            };
            let (Ok(x), Ok(y)) = (x.parse::<f64>(), y.parse::<f64>()) else {
                continue;
            };
            axis.push(x);
            values.push(y);
        }

        if axis.is_empty() {
            return Err(EngineError::Failure(format!(
                "no numeric samples found in '{}'",
                path.display()
            )));
        }

        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("experimental")
            .to_string();
        Ok(Self::new(name, wave_unit, axis).with_quantity(quantity, unit, values))
    }

    fn column(&self, quantity: SpectralQuantity) -> EngineResult<&QuantityColumn> {
        self.quantities
            .get(&quantity)
            .ok_or_else(|| EngineError::UnknownQuantity(quantity.as_str().to_string()))
    }

    fn axis_in(&self, wave_unit: WaveAxisUnit) -> Vec<f64> {
        if wave_unit == self.wave_unit {
            self.axis.clone()
        } else {
            self.axis.iter().copied().map(invert_wave_axis).collect()
        }
    }

    fn axis_center(&self) -> f64 {
        match (self.axis.first(), self.axis.last()) {
            (Some(first), Some(last)) => 0.5 * (first + last),
            _ => 0.0,
        }
    }
}

impl EngineSpectrum for TabulatedSpectrum {
    fn len(&self) -> usize {
        self.axis.len()
    }

    fn wave_unit(&self) -> WaveAxisUnit {
        self.wave_unit
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn unit_for(&self, quantity: SpectralQuantity) -> EngineResult<String> {
        Ok(self.column(quantity)?.unit.clone())
    }

    fn get(
        &self,
        quantity: SpectralQuantity,
        wave_unit: WaveAxisUnit,
        intensity_unit: &str,
    ) -> EngineResult<(Vec<f64>, Vec<f64>)> {
        let column = self.column(quantity)?;
        if intensity_unit != DEFAULT_INTENSITY_UNIT && intensity_unit != column.unit {
            return Err(EngineError::UnsupportedUnit {
                quantity,
                unit: intensity_unit.to_string(),
            });
        }
        Ok((self.axis_in(wave_unit), column.values.clone()))
    }

    fn apply_slit(&mut self, width: f64, unit: WaveAxisUnit) -> EngineResult<()> {
        let fwhm = slit_width_on_axis(width, unit, self.wave_unit, self.axis_center());
        let sources: Vec<(SpectralQuantity, SpectralQuantity)> = self
            .quantities
            .keys()
            .filter_map(|quantity| quantity.slit_counterpart().map(|target| (*quantity, target)))
            .collect();

        if sources.is_empty() {
            return Err(EngineError::Failure(format!(
                "spectrum '{}' has no slit-free quantity to convolve",
                self.name
            )));
        }

        for (source, target) in sources {
            let column = self.column(source)?;
            let convolved = convolve_triangular(&self.axis, &column.values, fwhm)?;
            let unit = column.unit.clone();
            self.quantities.insert(
                target,
                QuantityColumn {
                    unit,
                    values: convolved,
                },
            );
        }
        Ok(())
    }

    fn save_txt(
        &self,
        path: &Path,
        quantity: SpectralQuantity,
        wave_unit: WaveAxisUnit,
        intensity_unit: &str,
    ) -> EngineResult<()> {
        let (x, y) = self.get(quantity, wave_unit, intensity_unit)?;
        let unit = self.unit_for(quantity)?;

        let mut writer = BufWriter::new(fs::File::create(path)?);
        writeln!(writer, "wavespace ({}),{} ({})", wave_unit, quantity, unit)?;
        for (x, y) in x.iter().zip(&y) {
            writeln!(writer, "{},{}", x, y)?;
        }
        writer.flush()?;
        Ok(())
    }
}
