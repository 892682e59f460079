use super::multipart::read_fit_form;
use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Value, json};
use spectra_core::credentials::CredentialProvider;
use spectra_core::domain::{SpectraError, SpectraResult, SpectrumRequest};
use spectra_core::engine::SpectralEngine;
use spectra_core::pipeline::Upload;
use spectra_core::service::{ApiResponse, DownloadArtifact, SpectrumService};
use std::sync::Arc;
use tracing::{error, warn};

type SharedService<E, C> = Arc<SpectrumService<E, C>>;

/// File body ready to be sent; the staged copy is already gone.
struct Attachment {
    file_name: String,
    media_type: &'static str,
    bytes: Vec<u8>,
}

impl Attachment {
    fn read(artifact: DownloadArtifact) -> SpectraResult<Self> {
        let file_name = artifact.file_name.clone();
        let media_type = artifact.media_type;
        let bytes = artifact.into_bytes()?;
        Ok(Self {
            file_name,
            media_type,
            bytes,
        })
    }
}

impl IntoResponse for Attachment {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, self.media_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!(
                        "attachment; filename=\"{}\"",
                        quoted_file_name(&self.file_name)
                    ),
                ),
            ],
            self.bytes,
        )
            .into_response()
    }
}

/// Engine-chosen names may hold characters that would break the quoted
/// header value; those become `_`.
fn quoted_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect()
}

pub(super) async fn root() -> Json<Value> {
    Json(json!({
        "message": "Molecular spectrum calculation and fitting service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub(super) async fn calculate_spectrum<E, C>(
    State(service): State<SharedService<E, C>>,
    Json(request): Json<SpectrumRequest>,
) -> Response
where
    E: SpectralEngine + Send + Sync + 'static,
    C: CredentialProvider + Send + Sync + 'static,
{
    envelope(run_blocking(move || service.calculate(&request)).await)
}

pub(super) async fn download_spectrum<E, C>(
    State(service): State<SharedService<E, C>>,
    Json(request): Json<SpectrumRequest>,
) -> Response
where
    E: SpectralEngine + Send + Sync + 'static,
    C: CredentialProvider + Send + Sync + 'static,
{
    let result = run_blocking(move || {
        service
            .download_spectrum(&request)
            .and_then(Attachment::read)
    })
    .await;
    attachment(result)
}

pub(super) async fn download_txt<E, C>(
    State(service): State<SharedService<E, C>>,
    Json(request): Json<SpectrumRequest>,
) -> Response
where
    E: SpectralEngine + Send + Sync + 'static,
    C: CredentialProvider + Send + Sync + 'static,
{
    let result =
        run_blocking(move || service.download_txt(&request).and_then(Attachment::read)).await;
    attachment(result)
}

pub(super) async fn fit_spectrum<E, C>(
    State(service): State<SharedService<E, C>>,
    multipart: Multipart,
) -> Response
where
    E: SpectralEngine + Send + Sync + 'static,
    C: CredentialProvider + Send + Sync + 'static,
{
    let form = match read_fit_form(multipart).await {
        Ok(form) => form,
        Err(error) => return rejected(error),
    };
    let result = run_blocking(move || {
        let upload = Upload {
            file_name: &form.file_name,
            bytes: &form.bytes,
        };
        service.fit(&form.request, upload)
    })
    .await;
    envelope(result)
}

async fn run_blocking<T, F>(task: F) -> SpectraResult<T>
where
    F: FnOnce() -> SpectraResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .unwrap_or_else(|join_error| {
            error!(%join_error, "request worker did not complete");
            Err(SpectraError::internal(
                "RUN.WORKER",
                format!("request worker did not complete: {}", join_error),
            ))
        })
}

fn envelope<T: Serialize>(result: SpectraResult<T>) -> Response {
    match result {
        Err(error) if !error.category().is_in_band() => rejected(error),
        result => Json(ApiResponse::from_result(result)).into_response(),
    }
}

fn attachment(result: SpectraResult<Attachment>) -> Response {
    match result {
        Ok(attachment) => attachment.into_response(),
        Err(error) => envelope::<()>(Err(error)),
    }
}

fn rejected(error: SpectraError) -> Response {
    warn!(code = error.code(), "{}", error.message());
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "detail": error.message() })),
    )
        .into_response()
}
