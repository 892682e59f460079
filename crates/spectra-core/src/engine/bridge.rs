//! Drives an external engine process over a one-shot JSON protocol: one
//! request document on stdin, one reply document as the last non-empty line
//! of stdout. Operations that produce no value reply with `"result": null`.
//!
//! Spectrum files (`load_spec`, `store`) are read and written by the engine
//! itself, so their format is whatever the engine serializes natively.

use super::{
    CalculationCall, EngineError, EngineResult, FitCall, FitLog, FitOutcome, ResamplePolicy,
    SpectralEngine, TabulatedSpectrum,
};
use crate::domain::SpectralQuantity;
use crate::units::WaveAxisUnit;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::{debug, warn};

pub const DEFAULT_ENGINE_PROGRAM: &str = "python3";
pub const DEFAULT_ENGINE_ARGS: [&str; 2] = ["-m", "radis_bridge"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEngineConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl Default for ProcessEngineConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_ENGINE_PROGRAM),
            args: DEFAULT_ENGINE_ARGS.iter().map(|arg| arg.to_string()).collect(),
            working_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessEngine {
    config: ProcessEngineConfig,
}

#[derive(Serialize)]
struct BridgeRequest<'a, P: Serialize> {
    operation: &'a str,
    payload: &'a P,
}

#[derive(Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum BridgeReply<T> {
    Ok { result: T },
    Error { kind: BridgeErrorKind, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum BridgeErrorKind {
    EmptyDatabase,
    Failure,
}

#[derive(Serialize)]
struct MergePayload<'a> {
    spectra: &'a [TabulatedSpectrum],
    resample: ResamplePolicy,
}

#[derive(Serialize)]
struct LoadSpecPayload<'a> {
    path: &'a Path,
}

#[derive(Serialize)]
struct StorePayload<'a> {
    spectrum: &'a TabulatedSpectrum,
    path: &'a Path,
    compress: bool,
}

#[derive(Serialize)]
struct FitPayload<'a> {
    experimental: &'a TabulatedSpectrum,
    #[serde(flatten)]
    call: &'a FitCall,
}

#[derive(Deserialize)]
struct FitReply {
    best: TabulatedSpectrum,
    #[serde(default)]
    result: serde_json::Value,
    log: FitLog,
}

impl ProcessEngine {
    pub fn new(config: ProcessEngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProcessEngineConfig {
        &self.config
    }

    fn invoke<P, T>(&self, operation: &str, payload: &P) -> EngineResult<T>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let request = serde_json::to_vec(&BridgeRequest { operation, payload }).map_err(|error| {
            EngineError::Protocol(format!("could not encode '{}' request: {}", operation, error))
        })?;

        debug!(
            operation,
            program = %self.config.program.display(),
            request_bytes = request.len(),
            "invoking spectral engine"
        );
        let started = Instant::now();

        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(working_dir) = &self.config.working_dir {
            command.current_dir(working_dir);
        }

        let mut child = command.spawn().map_err(|error| {
            EngineError::Protocol(format!(
                "failed to start engine '{}': {}",
                self.config.program.display(),
                error
            ))
        })?;

        // Feed stdin from a separate thread so a chatty engine cannot fill
        // the stdout pipe while we are still writing.
        let writer = child.stdin.take().map(|mut stdin| {
            std::thread::spawn(move || -> std::io::Result<()> {
                stdin.write_all(&request)?;
                stdin.flush()
            })
        });
        let output = child.wait_with_output()?;

        if let Some(writer) = writer {
            match writer.join() {
                Ok(Ok(())) => {}
                Ok(Err(error)) if error.kind() == ErrorKind::BrokenPipe => {
                    warn!(operation, "engine closed stdin before reading the full request");
                }
                Ok(Err(error)) => return Err(EngineError::Io(error)),
                Err(_) => {
                    return Err(EngineError::Protocol(
                        "engine request writer panicked".to_string(),
                    ));
                }
            }
        }

        debug!(
            operation,
            status = %output.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "spectral engine finished"
        );

        parse_reply(
            &output.stdout,
            output.status.success(),
            &output.status.to_string(),
            &String::from_utf8_lossy(&output.stderr),
        )
    }
}

impl Default for ProcessEngine {
    fn default() -> Self {
        Self::new(ProcessEngineConfig::default())
    }
}

/// Decodes one engine reply. Anything the engine printed before the final
/// line is treated as log noise.
pub fn parse_reply<T: DeserializeOwned>(
    stdout: &[u8],
    success: bool,
    status: &str,
    stderr: &str,
) -> EngineResult<T> {
    let stdout = String::from_utf8_lossy(stdout);
    let last_line = stdout.lines().rev().find(|line| !line.trim().is_empty());

    let decoded = match last_line {
        Some(line) => serde_json::from_str::<BridgeReply<T>>(line.trim()).map_err(|error| {
            format!("malformed engine reply: {}", error)
        }),
        None => Err("engine produced no reply".to_string()),
    };

    match decoded {
        Ok(BridgeReply::Ok { result }) => Ok(result),
        Ok(BridgeReply::Error {
            kind: BridgeErrorKind::EmptyDatabase,
            message,
        }) => Err(EngineError::EmptyDatabase(message)),
        Ok(BridgeReply::Error {
            kind: BridgeErrorKind::Failure,
            message,
        }) => Err(EngineError::Failure(message)),
        Err(reason) if !success => {
            let stderr = stderr.trim();
            Err(EngineError::Protocol(if stderr.is_empty() {
                format!("engine exited with {}: {}", status, reason)
            } else {
                format!("engine exited with {}: {}", status, stderr)
            }))
        }
        Err(reason) => Err(EngineError::Protocol(reason)),
    }
}

/// The engine may run in another working directory.
fn engine_path(path: &Path) -> EngineResult<PathBuf> {
    Ok(std::path::absolute(path)?)
}

fn checked(spectrum: TabulatedSpectrum) -> EngineResult<TabulatedSpectrum> {
    spectrum.validate()?;
    Ok(spectrum)
}

impl SpectralEngine for ProcessEngine {
    type Spectrum = TabulatedSpectrum;

    fn calculate(&self, call: &CalculationCall) -> EngineResult<TabulatedSpectrum> {
        self.invoke("calculate", call).and_then(checked)
    }

    fn merge(
        &self,
        spectra: Vec<TabulatedSpectrum>,
        policy: ResamplePolicy,
    ) -> EngineResult<TabulatedSpectrum> {
        self.invoke(
            "merge",
            &MergePayload {
                spectra: &spectra,
                resample: policy,
            },
        )
        .and_then(checked)
    }

    fn load_spec(&self, path: &Path) -> EngineResult<TabulatedSpectrum> {
        let path = engine_path(path)?;
        self.invoke("load_spec", &LoadSpecPayload { path: &path })
            .and_then(checked)
    }

    fn store(&self, spectrum: &TabulatedSpectrum, path: &Path, compress: bool) -> EngineResult<()> {
        let path = engine_path(path)?;
        self.invoke::<_, IgnoredAny>(
            "store",
            &StorePayload {
                spectrum,
                path: &path,
                compress,
            },
        )?;
        Ok(())
    }

    fn load_txt(
        &self,
        path: &Path,
        quantity: SpectralQuantity,
        wave_unit: WaveAxisUnit,
        intensity_unit: &str,
    ) -> EngineResult<TabulatedSpectrum> {
        TabulatedSpectrum::read_txt(path, quantity, wave_unit, intensity_unit)
    }

    fn fit(
        &self,
        experimental: &TabulatedSpectrum,
        call: &FitCall,
    ) -> EngineResult<FitOutcome<TabulatedSpectrum>> {
        let reply: FitReply = self.invoke("fit", &FitPayload { experimental, call })?;
        Ok(FitOutcome {
            best: checked(reply.best)?,
            result: reply.result,
            log: reply.log,
        })
    }
}
