mod common;

use common::{EMPTY_WINDOW_START, FakeEngine, co_request, files_in, service_in};
use serde_json::{Value, json};
use spectra_core::domain::{Databank, Species, SpectraErrorCategory, SpectralQuantity};
use spectra_core::engine::{
    EngineSpectrum, IsotopeSelector, LineBroadening, LoadColumns, ResamplePolicy, SpectralEngine,
    TabulatedSpectrum,
};
use spectra_core::pipeline::{calculation_call, reduce_spectrum};
use spectra_core::service::ApiResponse;
use spectra_core::units::WaveUnit;
use tempfile::TempDir;

#[test]
fn single_species_absorbance_returns_increasing_axis() {
    let temp = TempDir::new().expect("tempdir should be created");
    let service = service_in(temp.path(), FakeEngine::default());

    let spectrum = service
        .calculate(&co_request())
        .expect("CO absorbance should calculate");

    assert!(!spectrum.x.is_empty());
    assert_eq!(spectrum.x.len(), spectrum.y.len());
    assert!(spectrum.x.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(spectrum.units, "absorbance");
    assert!(service.engine().merges.borrow().is_empty());
}

#[test]
fn empty_window_is_reported_with_fixed_message() {
    let temp = TempDir::new().expect("tempdir should be created");
    let service = service_in(temp.path(), FakeEngine::default());
    let mut request = co_request();
    request.min_wavenumber_range = EMPTY_WINDOW_START;
    request.max_wavenumber_range = EMPTY_WINDOW_START + 0.1;

    let response = ApiResponse::from_result(service.calculate(&request));
    assert_eq!(
        serde_json::to_value(&response).expect("response should serialize"),
        json!({ "error": "No line in the specified wavenumber range" })
    );
}

#[test]
fn engine_failure_message_is_passed_through() {
    let temp = TempDir::new().expect("tempdir should be created");
    let service = service_in(temp.path(), FakeEngine::default());
    let mut request = co_request();
    request.species[0].molecule = "XYZ".to_string();

    let error = service.calculate(&request).expect_err("unknown molecule should fail");
    assert_eq!(error.category(), SpectraErrorCategory::Computation);
    assert_eq!(error.message(), "Molecule 'XYZ' is not supported by hitran");
}

#[test]
fn invalid_request_never_reaches_engine() {
    let temp = TempDir::new().expect("tempdir should be created");
    let service = service_in(temp.path(), FakeEngine::default());
    let mut request = co_request();
    request.max_wavenumber_range = 1800.0;

    let error = service.calculate(&request).expect_err("inverted window should fail");
    assert_eq!(error.category(), SpectraErrorCategory::InputValidation);
    assert!(!error.category().is_in_band());
    assert!(service.engine().calculations.borrow().is_empty());
    assert!(service.credentials().calls.borrow().is_empty());
}

#[test]
fn species_are_calculated_in_order_and_merged_on_intersection() {
    let temp = TempDir::new().expect("tempdir should be created");
    let service = service_in(temp.path(), FakeEngine::default());
    let mut request = co_request();
    request.species.push(Species {
        molecule: "CO2".to_string(),
        mole_fraction: 0.1,
        is_all_isotopes: true,
    });

    let spectrum = service.calculate(&request).expect("mixture should calculate");

    let calls = service.engine().calculations.borrow();
    let molecules: Vec<&str> = calls.iter().map(|call| call.molecule.as_str()).collect();
    assert_eq!(molecules, vec!["CO", "CO2"]);
    assert_eq!(calls[0].isotope, IsotopeSelector::Reference);
    assert_eq!(calls[1].isotope, IsotopeSelector::All);
    assert_eq!(
        *service.engine().merges.borrow(),
        vec![(2, ResamplePolicy::Intersect)]
    );

    // absorbance is additive along the optical path
    let peak = spectrum.y.iter().cloned().fold(f64::MIN, f64::max);
    assert!((peak - 0.3).abs() < 1.0e-9);
}

#[test]
fn non_equilibrium_temperatures_select_noneq_columns() {
    let temp = TempDir::new().expect("tempdir should be created");
    let service = service_in(temp.path(), FakeEngine::default());
    let mut request = co_request();
    request.tvib = Some(1500.0);
    request.trot = Some(300.0);

    service.calculate(&request).expect("non-equilibrium spectrum");
    let calls = service.engine().calculations.borrow();
    assert_eq!(calls[0].load_columns, LoadColumns::NonEquilibrium);
}

#[test]
fn nist_requests_use_unresolved_isotopes_custom_broadening_and_credentials() {
    let temp = TempDir::new().expect("tempdir should be created");
    let service = service_in(temp.path(), FakeEngine::default());
    let mut request = co_request();
    request.database = Databank::Nist;
    request.species[0].is_all_isotopes = true;

    service.calculate(&request).expect("nist spectrum");
    let calls = service.engine().calculations.borrow();
    assert_eq!(calls[0].isotope, IsotopeSelector::Unresolved);
    assert_eq!(calls[0].broadening, LineBroadening::arbitrary());
    assert_eq!(*service.credentials().calls.borrow(), vec![Databank::Nist]);
}

#[test]
fn nanometre_display_converts_and_keeps_points_aligned() {
    let engine = FakeEngine::default();
    let request = co_request();
    let spectrum = engine
        .calculate(&calculation_call(&request, &request.species[0]))
        .expect("synthetic spectrum");

    let quantity = SpectralQuantity::TransmittanceNoslit;
    let in_wavenumber =
        reduce_spectrum(&spectrum, quantity, WaveUnit::InverseCentimeter.axis_unit())
            .expect("cm-1 reduction");
    let in_wavelength = reduce_spectrum(&spectrum, quantity, WaveUnit::Nanometer.axis_unit())
        .expect("nm reduction");

    let count = in_wavenumber.x.len();
    assert_eq!(in_wavelength.x.len(), count);
    assert!(in_wavelength.x.windows(2).all(|pair| pair[0] < pair[1]));
    for index in 0..count {
        let mirrored = count - 1 - index;
        assert!((in_wavelength.x[index] - 1.0e7 / in_wavenumber.x[mirrored]).abs() < 1.0e-6);
        assert_eq!(in_wavelength.y[index], in_wavenumber.y[mirrored]);
    }
}

#[test]
fn slit_is_applied_before_reduction() {
    let temp = TempDir::new().expect("tempdir should be created");
    let service = service_in(temp.path(), FakeEngine::default());
    let mut request = co_request();
    request.mode = SpectralQuantity::Transmittance;
    request.use_simulate_slit = true;

    let spectrum = service.calculate(&request).expect("slit spectrum");
    assert_eq!(spectrum.x.len(), spectrum.y.len());
    assert!(spectrum.y.iter().all(|value| *value > 0.0 && *value <= 1.0));

    request.use_simulate_slit = false;
    let error = service
        .calculate(&request)
        .expect_err("convolved quantity needs a slit");
    assert_eq!(error.message(), "spectrum has no quantity 'transmittance'");
}

#[test]
fn spectrum_download_is_named_after_engine_and_cleaned_up() {
    let temp = TempDir::new().expect("tempdir should be created");
    let service = service_in(temp.path(), FakeEngine::default());
    let mut request = co_request();
    request.use_simulate_slit = true;

    let artifact = service
        .download_spectrum(&request)
        .expect("download should be prepared");
    assert_eq!(artifact.file_name, "CO_hitran.spec");
    assert_eq!(artifact.media_type, "application/octet-stream");
    assert!(artifact.path().exists());
    assert_eq!(
        *service.engine().stores.borrow(),
        vec![(artifact.path().to_path_buf(), true)]
    );

    let download_dir = temp.path().join("downloads");
    let bytes = artifact.into_bytes().expect("artifact should be readable");
    let stored: TabulatedSpectrum =
        serde_json::from_slice(&bytes).expect("stored spectrum should be JSON");
    assert_eq!(stored.name(), "CO_hitran");
    assert!(stored.quantities.contains_key(&SpectralQuantity::Radiance));
    assert!(files_in(&download_dir).is_empty());
}

#[test]
fn text_download_contains_requested_quantity() {
    let temp = TempDir::new().expect("tempdir should be created");
    let service = service_in(temp.path(), FakeEngine::default());
    let request = co_request();

    let artifact = service.download_txt(&request).expect("download should be prepared");
    assert_eq!(artifact.file_name, "CO_hitran.csv");

    let text = String::from_utf8(artifact.into_bytes().expect("artifact should be readable"))
        .expect("csv should be UTF-8");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("wavespace (cm-1),absorbance (absorbance)"));
    assert_eq!(lines.count(), 201);
}

#[test]
fn download_failures_stay_in_band() {
    let temp = TempDir::new().expect("tempdir should be created");
    let service = service_in(temp.path(), FakeEngine::default());
    let mut request = co_request();
    request.min_wavenumber_range = EMPTY_WINDOW_START;
    request.max_wavenumber_range = EMPTY_WINDOW_START + 1.0;

    let response = ApiResponse::from_result(
        service
            .download_spectrum(&request)
            .map(|artifact| artifact.file_name),
    );
    let value: Value = serde_json::to_value(&response).expect("response should serialize");
    assert_eq!(value["error"], json!("No line in the specified wavenumber range"));
    assert!(files_in(&temp.path().join("downloads")).is_empty());
}
