//! Lazily provisioned credentials for gated line databases.

use crate::domain::{Databank, SpectraError, SpectraResult};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const EMAIL_ENV: &str = "HITRAN_EMAIL";
pub const PASSWORD_ENV: &str = "HITRAN_PASSWORD";
pub const CONFIG_FILE_NAME: &str = "radis.json";
const CREDENTIALS_SECTION: &str = "credentials";
const USERNAME_KEY: &str = "HITRAN_USERNAME";
const PASSWORD_KEY: &str = "HITRAN_PASSWORD";

pub trait CredentialProvider {
    /// Makes sure the engine can authenticate against `databank`. Repeated
    /// calls are harmless; databanks without gating are a no-op.
    fn ensure_configured(&self, databank: Databank) -> SpectraResult<()>;
}

#[derive(Clone, PartialEq, Eq)]
pub struct HitranCredentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for HitranCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HitranCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Writes credentials into the engine's JSON configuration file with
/// owner-only permissions.
#[derive(Debug, Clone)]
pub struct FileCredentialProvider {
    config_path: PathBuf,
    credentials: Option<HitranCredentials>,
}

impl FileCredentialProvider {
    pub fn new(config_path: impl Into<PathBuf>, credentials: Option<HitranCredentials>) -> Self {
        Self {
            config_path: config_path.into(),
            credentials,
        }
    }

    /// Reads `HITRAN_EMAIL` and `HITRAN_PASSWORD`, after loading a `.env`
    /// file from the working directory if one exists.
    pub fn from_env(config_path: impl Into<PathBuf>) -> Self {
        dotenvy::dotenv().ok();
        let non_empty = |name: &str| std::env::var(name).ok().filter(|value| !value.is_empty());
        let credentials = non_empty(EMAIL_ENV)
            .zip(non_empty(PASSWORD_ENV))
            .map(|(email, password)| HitranCredentials { email, password });
        Self::new(config_path, credentials)
    }

    /// `~/radis.json`, when a home directory is known.
    pub fn default_config_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(CONFIG_FILE_NAME))
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn read_config(&self) -> SpectraResult<Map<String, Value>> {
        if !self.config_path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.config_path)
            .map_err(|error| config_io_error(&self.config_path, error))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(config)) => Ok(config),
            Ok(_) => Err(SpectraError::io_system(
                "IO.CREDENTIALS_FORMAT",
                format!(
                    "engine configuration '{}' is not a JSON object",
                    self.config_path.display()
                ),
            )),
            Err(error) => Err(SpectraError::io_system(
                "IO.CREDENTIALS_FORMAT",
                format!(
                    "engine configuration '{}' is not valid JSON: {}",
                    self.config_path.display(),
                    error
                ),
            )),
        }
    }

    fn write_config(&self, config: &Map<String, Value>) -> SpectraResult<()> {
        let directory = match self.config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(directory).map_err(|error| config_io_error(&self.config_path, error))?;

        let mut staged = tempfile::NamedTempFile::new_in(directory)
            .map_err(|error| config_io_error(&self.config_path, error))?;
        serde_json::to_writer_pretty(&mut staged, config)
            .map_err(std::io::Error::from)
            .and_then(|()| staged.write_all(b"\n"))
            .and_then(|()| staged.flush())
            .map_err(|error| config_io_error(&self.config_path, error))?;
        restrict_to_owner(staged.path())
            .map_err(|error| config_io_error(&self.config_path, error))?;
        staged
            .persist(&self.config_path)
            .map_err(|error| config_io_error(&self.config_path, error.error))?;
        Ok(())
    }
}

impl CredentialProvider for FileCredentialProvider {
    fn ensure_configured(&self, databank: Databank) -> SpectraResult<()> {
        if !databank.requires_credentials() {
            return Ok(());
        }
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            SpectraError::computation(
                "RUN.CREDENTIALS_MISSING",
                format!("Missing {} or {} from environment", EMAIL_ENV, PASSWORD_ENV),
            )
        })?;

        let mut config = self.read_config()?;
        let section = config
            .entry(CREDENTIALS_SECTION)
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(section) = section else {
            return Err(SpectraError::io_system(
                "IO.CREDENTIALS_FORMAT",
                format!(
                    "'{}' in '{}' is not a JSON object",
                    CREDENTIALS_SECTION,
                    self.config_path.display()
                ),
            ));
        };

        let email = Value::String(credentials.email.clone());
        let password = Value::String(credentials.password.clone());
        if section.get(USERNAME_KEY) == Some(&email) && section.get(PASSWORD_KEY) == Some(&password)
        {
            debug!(databank = %databank, "database credentials already configured");
            return Ok(());
        }

        section.insert(USERNAME_KEY.to_string(), email);
        section.insert(PASSWORD_KEY.to_string(), password);
        self.write_config(&config)?;
        info!(
            databank = %databank,
            path = %self.config_path.display(),
            "stored database credentials"
        );
        Ok(())
    }
}

fn config_io_error(path: &Path, error: std::io::Error) -> SpectraError {
    SpectraError::io_system(
        "IO.CREDENTIALS",
        format!("failed to update '{}': {}", path.display(), error),
    )
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
