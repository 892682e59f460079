use crate::units::WaveAxisUnit;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SlitError {
    #[error("slit convolution requires at least 2 axis points, got {actual}")]
    InsufficientPoints { actual: usize },
    #[error("slit input length mismatch: axis={axis}, values={values}")]
    LengthMismatch { axis: usize, values: usize },
    #[error("wave axis entry must be finite at index {index}, got {value}")]
    NonFiniteAxis { index: usize, value: f64 },
    #[error("wave axis must be strictly monotonic, index {index} has {current} after {previous}")]
    NonMonotonicAxis {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("slit width must be finite and > 0, got {value}")]
    InvalidWidth { value: f64 },
}

/// Expresses a slit width given in `slit_unit` on an axis in `axis_unit`.
/// Between wavenumber and wavelength the width is converted locally at
/// `axis_center` through `|d(1e7/x)| = 1e7 dx / x^2`.
pub fn slit_width_on_axis(
    width: f64,
    slit_unit: WaveAxisUnit,
    axis_unit: WaveAxisUnit,
    axis_center: f64,
) -> f64 {
    if slit_unit == axis_unit {
        width
    } else {
        width * axis_center * axis_center / crate::units::NM_PER_INVERSE_CM
    }
}

/// Convolves `values` sampled on `axis` with a triangular instrument function
/// of full width at half maximum `fwhm`. The kernel is renormalised at every
/// point so that edges and non-uniform grids keep the signal level, and
/// not-a-number samples are skipped.
pub fn convolve_triangular(axis: &[f64], values: &[f64], fwhm: f64) -> Result<Vec<f64>, SlitError> {
    validate_inputs(axis, values, fwhm)?;

    let descending = axis[1] < axis[0];
    let (axis, values): (Vec<f64>, Vec<f64>) = if descending {
        (
            axis.iter().rev().copied().collect(),
            values.iter().rev().copied().collect(),
        )
    } else {
        (axis.to_vec(), values.to_vec())
    };

    let mut convolved = Vec::with_capacity(axis.len());
    for &center in &axis {
        let start = axis.partition_point(|x| *x <= center - fwhm);
        let end = axis.partition_point(|x| *x < center + fwhm);

        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        for index in start..end {
            let value = values[index];
            if value.is_nan() {
                continue;
            }
            let weight = 1.0 - (axis[index] - center).abs() / fwhm;
            if weight > 0.0 {
                weighted_sum += weight * value;
                weight_total += weight;
            }
        }

        convolved.push(if weight_total > 0.0 {
            weighted_sum / weight_total
        } else {
            f64::NAN
        });
    }

    if descending {
        convolved.reverse();
    }
    Ok(convolved)
}

fn validate_inputs(axis: &[f64], values: &[f64], fwhm: f64) -> Result<(), SlitError> {
    if axis.len() < 2 {
        return Err(SlitError::InsufficientPoints { actual: axis.len() });
    }
    if axis.len() != values.len() {
        return Err(SlitError::LengthMismatch {
            axis: axis.len(),
            values: values.len(),
        });
    }
    if !fwhm.is_finite() || fwhm <= 0.0 {
        return Err(SlitError::InvalidWidth { value: fwhm });
    }

    for (index, value) in axis.iter().copied().enumerate() {
        if !value.is_finite() {
            return Err(SlitError::NonFiniteAxis { index, value });
        }
    }

    let ascending = axis[1] > axis[0];
    for index in 1..axis.len() {
        let previous = axis[index - 1];
        let current = axis[index];
        let ordered = if ascending {
            current > previous
        } else {
            current < previous
        };
        if !ordered {
            return Err(SlitError::NonMonotonicAxis {
                index,
                previous,
                current,
            });
        }
    }

    Ok(())
}
