#![allow(dead_code)]

use serde_json::json;
use spectra_core::credentials::CredentialProvider;
use spectra_core::domain::{
    Databank, FitRequest, SpectraResult, SpectralQuantity, SpectrumRequest,
};
use spectra_core::engine::{
    CalculationCall, EngineError, EngineResult, FitCall, FitLog, FitOutcome, ResamplePolicy,
    SpectralEngine, TabulatedSpectrum,
};
use spectra_core::service::{ServiceConfig, SpectrumService};
use spectra_core::units::WaveAxisUnit;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const EMPTY_WINDOW_START: f64 = 1.0e6;
pub const RADIANCE_UNIT: &str = "mW/cm2/sr/nm";

/// In-process engine that synthesizes simple line spectra and records every
/// call it receives.
#[derive(Debug, Default)]
pub struct FakeEngine {
    pub fail_fit: bool,
    pub calculations: RefCell<Vec<CalculationCall>>,
    pub merges: RefCell<Vec<(usize, ResamplePolicy)>>,
    /// Each loaded path and whether it existed when the engine read it.
    pub loads: RefCell<Vec<(PathBuf, bool)>>,
    pub fits: RefCell<Vec<FitCall>>,
    /// Each stored path and its compression flag.
    pub stores: RefCell<Vec<(PathBuf, bool)>>,
}

impl FakeEngine {
    pub fn failing_fit() -> Self {
        Self {
            fail_fit: true,
            ..Self::default()
        }
    }

    fn synthesize(call: &CalculationCall) -> TabulatedSpectrum {
        let points = 201;
        let step = (call.window.max - call.window.min) / (points - 1) as f64;
        let center = 0.5 * (call.window.min + call.window.max);
        let width = 20.0 * step;

        let axis: Vec<f64> = (0..points)
            .map(|index| call.window.min + step * index as f64)
            .collect();
        let absorbance: Vec<f64> = axis
            .iter()
            .map(|x| {
                let offset = (x - center) / width;
                call.conditions.mole_fraction() / (1.0 + offset * offset)
            })
            .collect();
        let transmittance: Vec<f64> = absorbance.iter().map(|a| (-a).exp()).collect();
        let radiance: Vec<f64> = transmittance.iter().map(|t| 1.0 - t).collect();

        TabulatedSpectrum::new(
            format!("{}_{}", call.molecule, call.databank),
            call.window.unit,
            axis,
        )
        .with_quantity(SpectralQuantity::Absorbance, "absorbance", absorbance)
        .with_quantity(SpectralQuantity::TransmittanceNoslit, "", transmittance)
        .with_quantity(SpectralQuantity::RadianceNoslit, RADIANCE_UNIT, radiance)
    }
}

impl SpectralEngine for FakeEngine {
    type Spectrum = TabulatedSpectrum;

    fn calculate(&self, call: &CalculationCall) -> EngineResult<TabulatedSpectrum> {
        self.calculations.borrow_mut().push(call.clone());
        if call.window.min >= EMPTY_WINDOW_START {
            return Err(EngineError::EmptyDatabase(format!(
                "no lines for {} in the requested range",
                call.molecule
            )));
        }
        if call.molecule == "XYZ" {
            return Err(EngineError::Failure(
                "Molecule 'XYZ' is not supported by hitran".to_string(),
            ));
        }
        Ok(Self::synthesize(call))
    }

    fn merge(
        &self,
        spectra: Vec<TabulatedSpectrum>,
        policy: ResamplePolicy,
    ) -> EngineResult<TabulatedSpectrum> {
        self.merges.borrow_mut().push((spectra.len(), policy));
        let first = spectra
            .first()
            .ok_or_else(|| EngineError::Failure("nothing to merge".to_string()))?;

        let mut axis = Vec::new();
        let mut columns: BTreeMap<SpectralQuantity, Vec<f64>> = BTreeMap::new();
        for (index, x) in first.axis.iter().enumerate() {
            let positions: Option<Vec<usize>> = spectra
                .iter()
                .map(|spectrum| spectrum.axis.iter().position(|other| (other - x).abs() < 1.0e-9))
                .collect();
            let Some(positions) = positions else {
                continue;
            };
            axis.push(*x);
            for (quantity, column) in &first.quantities {
                let value = match quantity {
                    SpectralQuantity::Absorbance => spectra
                        .iter()
                        .zip(&positions)
                        .map(|(spectrum, position)| spectrum.quantities[quantity].values[*position])
                        .sum::<f64>(),
                    _ => column.values[index],
                };
                columns.entry(*quantity).or_default().push(value);
            }
        }

        let name = spectra
            .iter()
            .map(|spectrum| spectrum.name.as_str())
            .collect::<Vec<_>>()
            .join("+");
        let mut merged = TabulatedSpectrum::new(name, first.wave_unit, axis);
        for (quantity, values) in columns {
            merged = merged.with_quantity(quantity, first.quantities[&quantity].unit.clone(), values);
        }
        Ok(merged)
    }

    fn load_spec(&self, path: &Path) -> EngineResult<TabulatedSpectrum> {
        self.loads.borrow_mut().push((path.to_path_buf(), path.exists()));
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|error| {
            EngineError::Failure(format!("could not read spectrum file: {}", error))
        })
    }

    fn store(&self, spectrum: &TabulatedSpectrum, path: &Path, compress: bool) -> EngineResult<()> {
        self.stores.borrow_mut().push((path.to_path_buf(), compress));
        let encoded = if compress {
            serde_json::to_vec(spectrum)
        } else {
            serde_json::to_vec_pretty(spectrum)
        };
        let bytes = encoded.map_err(|error| EngineError::Failure(error.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn load_txt(
        &self,
        path: &Path,
        quantity: SpectralQuantity,
        wave_unit: WaveAxisUnit,
        intensity_unit: &str,
    ) -> EngineResult<TabulatedSpectrum> {
        self.loads.borrow_mut().push((path.to_path_buf(), path.exists()));
        TabulatedSpectrum::read_txt(path, quantity, wave_unit, intensity_unit)
    }

    fn fit(
        &self,
        experimental: &TabulatedSpectrum,
        call: &FitCall,
    ) -> EngineResult<FitOutcome<TabulatedSpectrum>> {
        self.fits.borrow_mut().push(call.clone());
        if self.fail_fit {
            return Err(EngineError::Failure(
                "fit did not converge within max_loop".to_string(),
            ));
        }

        let mut best = experimental.clone();
        best.name = "best_fit".to_string();
        let fit_vals = call
            .fit_params
            .iter()
            .map(|(kind, value)| (kind.engine_name().to_string(), value * 1.01))
            .collect();
        Ok(FitOutcome {
            best,
            result: json!({ "success": true, "nfev": 12 }),
            log: FitLog {
                fit_vals,
                residual: 0.0125,
                time_fitting: 1.5,
            },
        })
    }
}

#[derive(Debug, Default)]
pub struct RecordingCredentials {
    pub calls: RefCell<Vec<Databank>>,
}

impl CredentialProvider for RecordingCredentials {
    fn ensure_configured(&self, databank: Databank) -> SpectraResult<()> {
        self.calls.borrow_mut().push(databank);
        Ok(())
    }
}

pub type FakeService = SpectrumService<FakeEngine, RecordingCredentials>;

pub fn service_in(root: &Path, engine: FakeEngine) -> FakeService {
    SpectrumService::new(
        engine,
        RecordingCredentials::default(),
        ServiceConfig {
            download_dir: root.join("downloads"),
            upload_dir: root.to_path_buf(),
        },
    )
}

pub fn co_request() -> SpectrumRequest {
    serde_json::from_value(json!({
        "species": [{ "molecule": "CO", "mole_fraction": 0.2, "is_all_isotopes": false }],
        "mode": "absorbance",
        "database": "hitran",
        "tgas": 300,
        "min_wavenumber_range": 1900,
        "max_wavenumber_range": 2300,
        "pressure": 1.01325,
        "path_length": 11,
        "use_simulate_slit": false,
        "simulate_slit": 5,
        "wavelength_units": "1/u.cm",
        "path_length_units": "u.km",
        "pressure_units": "cds.atm"
    }))
    .expect("CO request fixture should deserialize")
}

pub fn nh3_fit_request(fit_var: &str) -> FitRequest {
    serde_json::from_value(json!({
        "fit_properties": {
            "method": "least_squares",
            "fit_var": fit_var,
            "normalize": false,
            "max_loops": 200,
            "tol": 1e-15
        },
        "bounding_ranges": {
            "tgas": { "min": 200, "max": 400 },
            "pressure": { "min": 0.1, "max": 10.0 },
            "mole_fraction": { "min": 0.01, "max": 1.0 }
        },
        "fit_parameters": { "tgas": 296.0, "pressure": 1.0, "mole_fraction": 0.1 },
        "experimental_conditions": {
            "min_wavenumber_range": 2000,
            "max_wavenumber_range": 2010,
            "specie": { "molecule": "NH3", "mole_fraction": 0.1, "is_all_isotopes": false },
            "pressure": 1.0,
            "path_length": 1.0,
            "simulate_slit": 5.0,
            "use_simulate_slit": true,
            "mode": "radiance",
            "database": "hitran",
            "wavelength_units": "1/u.cm",
            "pressure_units": "u.bar",
            "path_length_units": "u.cm"
        },
        "use_simulate_slit": true,
        "simulate_slit": 5.0
    }))
    .expect("NH3 fit request fixture should deserialize")
}

/// Two-column text upload sampled over 2000-2010 cm-1.
pub fn experimental_csv() -> Vec<u8> {
    let mut content = String::from("wavenumber,radiance\n");
    for index in 0..=100 {
        let x = 2000.0 + 0.1 * index as f64;
        let y = 1.0 / (1.0 + (x - 2005.0) * (x - 2005.0));
        content.push_str(&format!("{},{}\n", x, y));
    }
    content.into_bytes()
}

/// Regular files left directly inside `dir`.
pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .collect()
        })
        .unwrap_or_default()
}
