use crate::domain::{Databank, Species, SpectrumRequest};
use crate::engine::{
    CalculationCall, ConditionSet, EngineResult, IsotopeSelector, LineBroadening, SpectralEngine,
    WaveWindow,
};
use tracing::debug;

pub fn isotope_selector(databank: Databank, species: &Species) -> IsotopeSelector {
    if !databank.resolves_isotopes() {
        IsotopeSelector::Unresolved
    } else if species.is_all_isotopes {
        IsotopeSelector::All
    } else {
        IsotopeSelector::Reference
    }
}

pub fn line_broadening(databank: Databank) -> LineBroadening {
    if databank.provides_broadening() {
        LineBroadening::EngineDefault
    } else {
        LineBroadening::arbitrary()
    }
}

/// Ambient conditions in engine units for one species of the request.
pub fn condition_set(request: &SpectrumRequest, species: &Species) -> ConditionSet {
    let pressure = request.pressure * request.pressure_units.factor();
    let path_length = request.path_length * request.path_length_units.factor();
    match request.non_equilibrium_temperatures() {
        Some((tvib, trot)) => ConditionSet::NonEquilibrium {
            tvib,
            trot,
            mole_fraction: species.mole_fraction,
            pressure,
            path_length,
        },
        None => ConditionSet::Equilibrium {
            tgas: request.tgas,
            mole_fraction: species.mole_fraction,
            pressure,
            path_length,
        },
    }
}

pub fn calculation_call(request: &SpectrumRequest, species: &Species) -> CalculationCall {
    let wave_unit = request.wavelength_units;
    let conditions = condition_set(request, species);
    CalculationCall {
        molecule: species.molecule.clone(),
        isotope: isotope_selector(request.database, species),
        databank: request.database,
        window: WaveWindow {
            min: request.min_wavenumber_range * wave_unit.factor(),
            max: request.max_wavenumber_range * wave_unit.factor(),
            unit: wave_unit.axis_unit(),
        },
        load_columns: conditions.load_columns(),
        conditions,
        broadening: line_broadening(request.database),
    }
}

/// Runs one engine calculation per species, strictly in request order. The
/// first failure aborts the remaining species.
pub fn build_species_spectra<E: SpectralEngine>(
    engine: &E,
    request: &SpectrumRequest,
) -> EngineResult<Vec<E::Spectrum>> {
    let mut spectra = Vec::with_capacity(request.species.len());
    for species in &request.species {
        let call = calculation_call(request, species);
        debug!(
            molecule = %call.molecule,
            databank = %call.databank,
            isotope = ?call.isotope,
            load_columns = ?call.load_columns,
            "calculating species spectrum"
        );
        spectra.push(engine.calculate(&call)?);
    }
    Ok(spectra)
}

#[cfg(test)]
mod tests {
    use super::{calculation_call, isotope_selector, line_broadening};
    use crate::domain::{Databank, Species};
    use crate::engine::{ConditionSet, IsotopeSelector, LineBroadening, LoadColumns};
    use crate::test_support::co_request;
    use crate::units::{LengthUnit, PressureUnit, WaveAxisUnit, WaveUnit};

    fn species(is_all_isotopes: bool) -> Species {
        Species {
            molecule: "CO2".to_string(),
            mole_fraction: 0.1,
            is_all_isotopes,
        }
    }

    #[test]
    fn isotope_selection_follows_databank_and_flag() {
        assert_eq!(
            isotope_selector(Databank::Nist, &species(true)),
            IsotopeSelector::Unresolved
        );
        assert_eq!(
            isotope_selector(Databank::Nist, &species(false)),
            IsotopeSelector::Unresolved
        );
        assert_eq!(isotope_selector(Databank::Hitran, &species(true)), IsotopeSelector::All);
        assert_eq!(
            isotope_selector(Databank::Geisa, &species(false)),
            IsotopeSelector::Reference
        );
    }

    #[test]
    fn only_nist_receives_custom_broadening() {
        assert_eq!(line_broadening(Databank::Nist), LineBroadening::arbitrary());
        for databank in [Databank::Hitran, Databank::Geisa, Databank::Hitemp, Databank::Exomol] {
            assert_eq!(line_broadening(databank), LineBroadening::EngineDefault);
        }
    }

    #[test]
    fn equilibrium_call_converts_units() {
        let mut request = co_request();
        request.pressure = 760.0;
        request.pressure_units = PressureUnit::Torr;
        request.path_length = 2.0;
        request.path_length_units = LengthUnit::Meter;

        let call = calculation_call(&request, &request.species[0]);
        assert_eq!(call.molecule, "CO");
        assert_eq!(call.load_columns, LoadColumns::Equilibrium);
        assert_eq!(call.window.min, 1900.0);
        assert_eq!(call.window.max, 2300.0);
        assert_eq!(call.window.unit, WaveAxisUnit::Wavenumber);
        let ConditionSet::Equilibrium {
            tgas,
            mole_fraction,
            pressure,
            path_length,
        } = call.conditions
        else {
            panic!("expected equilibrium conditions");
        };
        assert_eq!(tgas, 300.0);
        assert_eq!(mole_fraction, 0.2);
        assert!((pressure - 1.01325).abs() < 1.0e-12);
        assert_eq!(path_length, 200.0);
    }

    #[test]
    fn both_temperatures_switch_to_non_equilibrium() {
        let mut request = co_request();
        request.tvib = Some(1500.0);
        request.trot = Some(320.0);
        request.wavelength_units = WaveUnit::Nanometer;

        let call = calculation_call(&request, &request.species[0]);
        assert_eq!(call.load_columns, LoadColumns::NonEquilibrium);
        assert_eq!(call.window.unit, WaveAxisUnit::Wavelength);
        assert!(matches!(
            call.conditions,
            ConditionSet::NonEquilibrium { tvib, trot, .. } if tvib == 1500.0 && trot == 320.0
        ));
    }
}
