//! Maps engine failures onto the error vocabulary surfaced to callers.

use crate::domain::SpectraError;
use crate::engine::EngineError;

pub const ENGINE_FAILURE_CODE: &str = "RUN.ENGINE";
pub const ENGINE_IO_CODE: &str = "IO.ENGINE";

/// An empty line database becomes the fixed empty-range message; every other
/// engine failure keeps its own description verbatim.
pub fn classify_engine_error(error: EngineError) -> SpectraError {
    match error {
        EngineError::EmptyDatabase(_) => SpectraError::empty_range(),
        EngineError::Io(source) => SpectraError::io_system(ENGINE_IO_CODE, source.to_string()),
        other => SpectraError::computation(ENGINE_FAILURE_CODE, other.to_string()),
    }
}

impl From<EngineError> for SpectraError {
    fn from(error: EngineError) -> Self {
        classify_engine_error(error)
    }
}
