//! Turns an engine spectrum into the `{x, y, units}` arrays returned to
//! clients, bounded by a fixed payload budget.

use crate::domain::SpectralQuantity;
use crate::engine::{DEFAULT_INTENSITY_UNIT, EngineResult, EngineSpectrum};
use crate::units::{WaveAxisUnit, invert_wave_axis};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Serialized payload budget in bytes.
pub const PAYLOAD_THRESHOLD_BYTES: f64 = 5.0e7;
const BYTES_PER_FLOAT: usize = 8;
const ARRAYS_PER_SPECTRUM: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReducedSpectrum {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub units: String,
}

/// Keep-every-nth stride for a spectrum of `sample_count` points, or `None`
/// when the raw estimate fits the budget.
pub fn decimation_stride(sample_count: usize) -> Option<usize> {
    let raw_bytes = (sample_count * BYTES_PER_FLOAT * ARRAYS_PER_SPECTRUM) as f64;
    if raw_bytes > PAYLOAD_THRESHOLD_BYTES {
        Some(((raw_bytes / PAYLOAD_THRESHOLD_BYTES).floor() as usize).max(1))
    } else {
        None
    }
}

/// Reorders, filters and decimates `(x, y)`. `sample_count` is the
/// spectrum's own length before any filtering; the stride is derived from it
/// so invalid samples still count toward the estimate.
pub fn reduce_arrays(
    x: Vec<f64>,
    y: Vec<f64>,
    native_unit: WaveAxisUnit,
    display_unit: WaveAxisUnit,
    sample_count: usize,
) -> (Vec<f64>, Vec<f64>) {
    let convert = native_unit != display_unit;
    let mut pairs: Vec<(f64, f64)> = x
        .into_iter()
        .zip(y)
        .map(|(x, y)| (if convert { invert_wave_axis(x) } else { x }, y))
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .collect();
    pairs.sort_by(|left, right| left.0.total_cmp(&right.0));

    let stride = match decimation_stride(sample_count) {
        Some(stride) => {
            warn!(
                sample_count,
                stride, "spectrum exceeds payload budget, decimating"
            );
            stride
        }
        None => 1,
    };

    pairs.into_iter().step_by(stride).unzip()
}

pub fn reduce_spectrum<S: EngineSpectrum>(
    spectrum: &S,
    quantity: SpectralQuantity,
    display_unit: WaveAxisUnit,
) -> EngineResult<ReducedSpectrum> {
    let native_unit = spectrum.wave_unit();
    let (x, y) = spectrum.get(quantity, native_unit, DEFAULT_INTENSITY_UNIT)?;
    let (x, y) = reduce_arrays(x, y, native_unit, display_unit, spectrum.len());
    Ok(ReducedSpectrum {
        x,
        y,
        units: spectrum.unit_for(quantity)?,
    })
}
