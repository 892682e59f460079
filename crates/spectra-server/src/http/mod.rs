//! HTTP surface of the service.
//!
//! Every operation runs on the blocking pool because engine calls are
//! synchronous and may take minutes. Errors from orchestration come back as
//! `200 {"error": ...}`; only malformed input is rejected with a status code.

mod handlers;
mod multipart;

use anyhow::Context;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use spectra_core::credentials::CredentialProvider;
use spectra_core::engine::SpectralEngine;
use spectra_core::service::SpectrumService;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Largest request body accepted, uploads included.
pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

pub fn router<E, C>(service: Arc<SpectrumService<E, C>>) -> Router
where
    E: SpectralEngine + Send + Sync + 'static,
    C: CredentialProvider + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(handlers::root))
        .route("/calculate-spectrum", post(handlers::calculate_spectrum::<E, C>))
        .route("/download-spectrum", post(handlers::download_spectrum::<E, C>))
        .route("/download-txt", post(handlers::download_txt::<E, C>))
        .route("/fit-spectrum", post(handlers::fit_spectrum::<E, C>))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(service)
}

pub async fn serve<E, C>(bind: SocketAddr, service: SpectrumService<E, C>) -> anyhow::Result<()>
where
    E: SpectralEngine + Send + Sync + 'static,
    C: CredentialProvider + Send + Sync + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    let address = listener
        .local_addr()
        .context("failed to read the bound address")?;
    info!(%address, "spectra server listening");

    axum::serve(listener, router(Arc::new(service)))
        .await
        .context("server stopped unexpectedly")
}
