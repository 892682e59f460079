use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SpectraResult<T> = Result<T, SpectraError>;

pub const EMPTY_RANGE_MESSAGE: &str = "No line in the specified wavenumber range";
pub const INVALID_FILE_EXTENSION_MESSAGE: &str = "File must have a .spec, .txt, or .csv extension";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpectraErrorCategory {
    InputValidation,
    EmptyRange,
    InvalidFileExtension,
    Computation,
    IoSystem,
    Internal,
}

impl SpectraErrorCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidation => "InputValidationError",
            Self::EmptyRange => "EmptyRangeError",
            Self::InvalidFileExtension => "InvalidFileExtensionError",
            Self::Computation => "GenericComputationError",
            Self::IoSystem => "IoSystemError",
            Self::Internal => "InternalError",
        }
    }

    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidation | Self::InvalidFileExtension => 2,
            Self::IoSystem => 3,
            Self::EmptyRange | Self::Computation => 4,
            Self::Internal => 5,
        }
    }

    /// Malformed input is rejected before orchestration; every other category
    /// is reported in-band on an otherwise successful response.
    pub const fn is_in_band(self) -> bool {
        !matches!(self, Self::InputValidation)
    }
}

impl Display for SpectraErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpectraError {
    category: SpectraErrorCategory,
    code: &'static str,
    message: String,
}

impl SpectraError {
    pub fn new(
        category: SpectraErrorCategory,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code,
            message: message.into(),
        }
    }

    pub fn input_validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(SpectraErrorCategory::InputValidation, code, message)
    }

    pub fn empty_range() -> Self {
        Self::new(
            SpectraErrorCategory::EmptyRange,
            "RUN.EMPTY_RANGE",
            EMPTY_RANGE_MESSAGE,
        )
    }

    pub fn invalid_file_extension() -> Self {
        Self::new(
            SpectraErrorCategory::InvalidFileExtension,
            "INPUT.UPLOAD_EXTENSION",
            INVALID_FILE_EXTENSION_MESSAGE,
        )
    }

    pub fn computation(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(SpectraErrorCategory::Computation, code, message)
    }

    pub fn io_system(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(SpectraErrorCategory::IoSystem, code, message)
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(SpectraErrorCategory::Internal, code, message)
    }

    pub const fn category(&self) -> SpectraErrorCategory {
        self.category
    }

    pub const fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.code, self.message)
    }
}

impl Display for SpectraError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}", self.category, self.code, self.message)
    }
}

impl Error for SpectraError {}
