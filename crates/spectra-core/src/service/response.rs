use crate::domain::SpectraResult;
use crate::pipeline::ReducedSpectrum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// In-band response envelope: `{"data": ...}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiResponse<T> {
    Data { data: T },
    Error { error: String },
}

impl<T> ApiResponse<T> {
    pub fn from_result(result: SpectraResult<T>) -> Self {
        match result {
            Ok(data) => Self::Data { data },
            Err(error) => {
                warn!(
                    category = %error.category(),
                    code = error.code(),
                    "{}",
                    error.message()
                );
                Self::Error {
                    error: error.message().to_string(),
                }
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResponse {
    pub experimental_spectrum: ReducedSpectrum,
    pub best_spectrum: ReducedSpectrum,
    pub units: String,
    pub fit_vals: BTreeMap<String, f64>,
    pub residual: f64,
    pub time_fitting: f64,
}

#[cfg(test)]
mod tests {
    use super::ApiResponse;
    use crate::domain::SpectraError;
    use crate::pipeline::ReducedSpectrum;
    use serde_json::json;

    #[test]
    fn success_is_wrapped_in_data() {
        let response = ApiResponse::from_result(Ok(ReducedSpectrum {
            x: vec![1900.0, 1900.5],
            y: vec![0.1, 0.2],
            units: "absorbance".to_string(),
        }));
        assert_eq!(
            serde_json::to_value(&response).expect("response should serialize"),
            json!({ "data": { "x": [1900.0, 1900.5], "y": [0.1, 0.2], "units": "absorbance" } })
        );
    }

    #[test]
    fn failure_carries_only_the_message() {
        let response: ApiResponse<ReducedSpectrum> =
            ApiResponse::from_result(Err(SpectraError::empty_range()));
        assert!(response.is_error());
        assert_eq!(
            serde_json::to_value(&response).expect("response should serialize"),
            json!({ "error": "No line in the specified wavenumber range" })
        );
    }
}
