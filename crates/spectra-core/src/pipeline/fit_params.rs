use crate::domain::{
    BoundingRanges, FitParameterKind, FitParameters, FitProperties, FitRequest, SpectraError,
    SpectraResult, SpectralQuantity,
};
use crate::engine::{FitCall, FitModel, PipelineControls, SolverOptions};
use std::collections::BTreeMap;

use super::species::isotope_selector;

/// The fitting routine only compares slit-applied quantities.
pub fn coerce_fit_quantity(quantity: SpectralQuantity) -> SpectralQuantity {
    quantity.slit_counterpart().unwrap_or(quantity)
}

/// Parameters the optimizer may vary, with their bounds. A parameter takes
/// part iff it has an initial value, and then it must be fully bounded.
/// A missing bound is reported in-band like any other fit failure.
pub fn map_fit_parameters(
    parameters: &FitParameters,
    ranges: &BoundingRanges,
) -> SpectraResult<(BTreeMap<FitParameterKind, f64>, BTreeMap<FitParameterKind, [f64; 2]>)> {
    let mut initial_values = BTreeMap::new();
    let mut bounds = BTreeMap::new();

    for kind in FitParameterKind::ALL {
        let Some(value) = parameters.value(kind) else {
            continue;
        };
        let range = ranges.range(kind).ok_or_else(|| {
            SpectraError::computation(
                "RUN.BOUNDS_MISSING",
                format!(
                    "fit parameter '{}' has no bounding range",
                    kind.wire_name()
                ),
            )
        })?;
        let (Some(min), Some(max)) = (range.min, range.max) else {
            return Err(SpectraError::computation(
                "RUN.BOUNDS_INCOMPLETE",
                format!(
                    "bounding range for '{}' needs both min and max",
                    kind.wire_name()
                ),
            ));
        };
        initial_values.insert(kind, value);
        bounds.insert(kind, [min, max]);
    }

    Ok((initial_values, bounds))
}

pub fn map_pipeline(properties: &FitProperties) -> PipelineControls {
    PipelineControls {
        method: properties.method,
        fit_var: coerce_fit_quantity(properties.fit_var),
        normalize: properties.normalize,
        max_loop: properties.max_loops,
        tol: properties.tol,
    }
}

/// Ground-truth model block. Window bounds stay in the caller's wave unit;
/// the slit is always expressed in nanometres.
pub fn build_fit_model(request: &FitRequest) -> FitModel {
    let conditions = &request.experimental_conditions;
    FitModel {
        molecule: conditions.specie.molecule.clone(),
        isotope: isotope_selector(conditions.database, &conditions.specie),
        wmin: conditions.min_wavenumber_range,
        wmax: conditions.max_wavenumber_range,
        wunit: conditions.wavelength_units.axis_unit(),
        mole_fraction: conditions.specie.mole_fraction,
        pressure: conditions.pressure * conditions.pressure_units.factor(),
        path_length: conditions.path_length * conditions.path_length_units.factor(),
        databank: conditions.database,
        slit: request.slit_width().map(|width| format!("{:?} nm", width)),
    }
}

pub fn build_fit_call(request: &FitRequest) -> SpectraResult<FitCall> {
    let (fit_params, bounds) =
        map_fit_parameters(&request.fit_parameters, &request.bounding_ranges)?;
    Ok(FitCall {
        fit_params,
        bounds,
        model: build_fit_model(request),
        pipeline: map_pipeline(&request.fit_properties),
        fit_kws: SolverOptions::default(),
    })
}
