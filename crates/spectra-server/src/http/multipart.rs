use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use spectra_core::domain::{FitRequest, SpectraError, SpectraResult};

const DATA_FIELD: &str = "data";
const FILE_FIELD: &str = "file";

/// The two parts of a `/fit-spectrum` form: a JSON fit request in `data` and
/// the experimental spectrum in `file`.
#[derive(Debug)]
pub(super) struct FitForm {
    pub(super) request: FitRequest,
    pub(super) file_name: String,
    pub(super) bytes: Vec<u8>,
}

pub(super) async fn read_fit_form(mut multipart: Multipart) -> SpectraResult<FitForm> {
    let mut data = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(form_read_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            DATA_FIELD => data = Some(field.text().await.map_err(form_read_error)?),
            FILE_FIELD => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(form_read_error)?;
                file = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| missing_field(DATA_FIELD))?;
    let (file_name, bytes) = file.ok_or_else(|| missing_field(FILE_FIELD))?;
    Ok(FitForm {
        request: parse_fit_data(&data)?,
        file_name,
        bytes,
    })
}

pub(super) fn parse_fit_data(data: &str) -> SpectraResult<FitRequest> {
    serde_json::from_str(data).map_err(|error| {
        SpectraError::input_validation(
            "INPUT.FIT_DATA",
            format!("invalid fit request in form field 'data': {}", error),
        )
    })
}

fn missing_field(name: &str) -> SpectraError {
    SpectraError::input_validation(
        "INPUT.FORM_FIELD",
        format!("form field '{}' is required", name),
    )
}

fn form_read_error(error: MultipartError) -> SpectraError {
    SpectraError::input_validation(
        "INPUT.FORM_READ",
        format!("failed to read multipart form: {}", error),
    )
}
