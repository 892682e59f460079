use super::CliError;
use spectra_core::credentials::FileCredentialProvider;
use spectra_core::engine::{
    DEFAULT_ENGINE_ARGS, DEFAULT_ENGINE_PROGRAM, ProcessEngine, ProcessEngineConfig,
};
use spectra_core::service::{ServiceConfig, SpectrumService};
use std::path::PathBuf;
use tracing::debug;

pub(super) const DEFAULT_BIND: &str = "127.0.0.1:5000";

pub(super) type BridgeService = SpectrumService<ProcessEngine, FileCredentialProvider>;

/// Engine and storage options shared by every subcommand.
#[derive(Debug, Clone, clap::Args)]
pub(super) struct EngineOptions {
    /// Program speaking the engine bridge protocol
    #[arg(long = "engine-command", value_name = "program", default_value = DEFAULT_ENGINE_PROGRAM)]
    pub(super) engine_command: PathBuf,
    /// Argument passed to the engine program (repeatable)
    #[arg(
        long = "engine-arg",
        value_name = "arg",
        allow_hyphen_values = true,
        default_values = DEFAULT_ENGINE_ARGS
    )]
    pub(super) engine_args: Vec<String>,
    /// Working directory for the engine process
    #[arg(long, value_name = "path")]
    pub(super) engine_dir: Option<PathBuf>,
    /// Directory where download files are staged
    #[arg(long, value_name = "path")]
    pub(super) download_dir: Option<PathBuf>,
    /// Directory where fit uploads are staged
    #[arg(long, value_name = "path")]
    pub(super) upload_dir: Option<PathBuf>,
    /// Engine configuration file that receives databank credentials
    #[arg(long, value_name = "path")]
    pub(super) credentials_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ServerConfig {
    pub(super) engine: ProcessEngineConfig,
    pub(super) service: ServiceConfig,
    pub(super) credentials_path: PathBuf,
}

impl ServerConfig {
    pub(super) fn from_options(options: &EngineOptions) -> Result<Self, CliError> {
        let credentials_path = options
            .credentials_path
            .clone()
            .or_else(FileCredentialProvider::default_config_path)
            .ok_or_else(|| {
                CliError::Usage(
                    "no home directory is known; pass --credentials-path".to_string(),
                )
            })?;

        let mut service = ServiceConfig::default();
        if let Some(download_dir) = &options.download_dir {
            service.download_dir = download_dir.clone();
        }
        if let Some(upload_dir) = &options.upload_dir {
            service.upload_dir = upload_dir.clone();
        }

        let config = Self {
            engine: ProcessEngineConfig {
                program: options.engine_command.clone(),
                args: options.engine_args.clone(),
                working_dir: options.engine_dir.clone(),
            },
            service,
            credentials_path,
        };
        debug!(?config, "resolved server configuration");
        Ok(config)
    }

    pub(super) fn build_service(&self) -> BridgeService {
        SpectrumService::new(
            ProcessEngine::new(self.engine.clone()),
            FileCredentialProvider::from_env(&self.credentials_path),
            self.service.clone(),
        )
    }
}
