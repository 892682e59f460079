mod config;
mod telemetry;

use anyhow::Context;
use clap::Parser;
use config::{DEFAULT_BIND, EngineOptions, ServerConfig};
use spectra_core::domain::{SpectraError, SpectrumRequest};
use spectra_core::service::ApiResponse;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use telemetry::TelemetryError;

pub fn run_from_env() -> i32 {
    match parse_and_dispatch(std::env::args().collect()) {
        Ok(code) => code,
        Err(error) => {
            let error = error.as_spectra_error();
            eprintln!("{}", error.diagnostic_line());
            error.exit_code()
        }
    }
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "spectra-server",
    version,
    about = "Molecular spectrum calculation and fitting service"
)]
struct Cli {
    /// Tracing filter directive; overrides RUST_LOG
    #[arg(long, global = true, value_name = "filter")]
    log_filter: Option<String>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Serve the HTTP API
    Serve(ServeArgs),
    /// Calculate one spectrum request and print the JSON response
    Calculate(CalculateArgs),
}

#[derive(clap::Args)]
struct ServeArgs {
    /// Socket address to listen on
    #[arg(long, default_value = DEFAULT_BIND)]
    bind: SocketAddr,
    #[command(flatten)]
    engine: EngineOptions,
}

#[derive(clap::Args)]
struct CalculateArgs {
    /// JSON file holding a spectrum request
    #[arg(value_name = "request")]
    request: PathBuf,
    #[command(flatten)]
    engine: EngineOptions,
}

fn dispatch_parsed(cli: Cli) -> Result<i32, CliError> {
    telemetry::init_tracing(cli.log_filter.as_deref()).map_err(|error| match error {
        TelemetryError::Filter(_) => CliError::Usage(error.to_string()),
        TelemetryError::Install(_) => CliError::Internal(error.into()),
    })?;

    match cli.command {
        CliCommand::Serve(args) => run_serve_command(args),
        CliCommand::Calculate(args) => run_calculate_command(args),
    }
}

fn run_serve_command(args: ServeArgs) -> Result<i32, CliError> {
    let config = ServerConfig::from_options(&args.engine)?;
    let service = config.build_service();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    runtime.block_on(crate::http::serve(args.bind, service))?;
    Ok(0)
}

/// Prints the in-band envelope on stdout. The exit code still reflects the
/// error category so scripts can branch on it.
fn run_calculate_command(args: CalculateArgs) -> Result<i32, CliError> {
    let content = fs::read_to_string(&args.request).map_err(|error| {
        CliError::Service(SpectraError::io_system(
            "IO.REQUEST_READ",
            format!("failed to read '{}': {}", args.request.display(), error),
        ))
    })?;
    let request: SpectrumRequest = serde_json::from_str(&content).map_err(|error| {
        CliError::Service(SpectraError::input_validation(
            "INPUT.REQUEST_JSON",
            format!(
                "invalid spectrum request '{}': {}",
                args.request.display(),
                error
            ),
        ))
    })?;

    let service = ServerConfig::from_options(&args.engine)?.build_service();
    let result = match service.calculate(&request) {
        Err(error) if !error.category().is_in_band() => return Err(CliError::Service(error)),
        result => result,
    };
    let exit_code = result.as_ref().err().map_or(0, SpectraError::exit_code);

    let body = serde_json::to_string(&ApiResponse::from_result(result))
        .context("failed to encode the response")?;
    println!("{}", body);
    Ok(exit_code)
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Service(SpectraError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<SpectraError> for CliError {
    fn from(error: SpectraError) -> Self {
        Self::Service(error)
    }
}

impl CliError {
    fn as_spectra_error(&self) -> SpectraError {
        match self {
            Self::Usage(message) => {
                SpectraError::input_validation("INPUT.CLI_USAGE", message.clone())
            }
            Self::Service(error) => error.clone(),
            Self::Internal(error) => SpectraError::internal("RUN.CLI", format!("{error:#}")),
        }
    }
}
