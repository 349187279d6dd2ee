//! Error taxonomy shared by every conversion.

use std::borrow::Cow;

use thiserror::Error;

/// Stable error code.
pub type Code = Cow<'static, str>;

/// Coarse classification of a [`ConvertError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input structure is malformed or unrecognized.
    FileValidation,
    /// Input exceeds the configured size limit.
    FileSize,
    /// Input or target format has no implementation.
    UnsupportedFormat,
    /// Input parsed but the conversion produced nothing usable.
    Conversion,
}

/// Errors that can occur during a conversion.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Malformed or unrecognized input structure.
    #[error("{message}")]
    FileValidation {
        /// Machine-readable code, e.g. `DXF_MISSING_ENTITIES`.
        code: Code,
        /// Human-readable message.
        message: String,
    },

    /// Input larger than the configured limit.
    #[error("file size {size} bytes exceeds limit of {limit} bytes")]
    FileSize {
        /// Actual input size in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: u64,
    },

    /// Format pair with no local or remote implementation.
    #[error("unsupported format: {format} (supported: {})", supported.join(", "))]
    UnsupportedFormat {
        /// The rejected format or pair.
        format: String,
        /// Formats or pairs that are supported.
        supported: Vec<String>,
    },

    /// Semantic conversion failure.
    #[error("{message}")]
    Conversion {
        /// Machine-readable code, e.g. `SVG_NO_PATHS`.
        code: Code,
        /// Human-readable message.
        message: String,
    },
}

impl ConvertError {
    /// Create a file validation error.
    pub fn validation(code: impl Into<Code>, message: impl Into<String>) -> Self {
        Self::FileValidation {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a conversion error.
    pub fn conversion(code: impl Into<Code>, message: impl Into<String>) -> Self {
        Self::Conversion {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported format error.
    pub fn unsupported<S: ToString>(format: impl Into<String>, supported: &[S]) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
            supported: supported.iter().map(ToString::to_string).collect(),
        }
    }

    /// Create an invalid options error.
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::validation("INVALID_OPTIONS", message)
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &str {
        match self {
            Self::FileValidation { code, .. } | Self::Conversion { code, .. } => code,
            Self::FileSize { .. } => "FILE_SIZE_EXCEEDED",
            Self::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
        }
    }

    /// Error classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileValidation { .. } => ErrorKind::FileValidation,
            Self::FileSize { .. } => ErrorKind::FileSize,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::Conversion { .. } => ErrorKind::Conversion,
        }
    }

    /// HTTP-style status code for callers that expose conversions over a wire.
    pub fn status(&self) -> u16 {
        match self.kind() {
            ErrorKind::FileValidation | ErrorKind::UnsupportedFormat => 400,
            ErrorKind::FileSize => 413,
            ErrorKind::Conversion => 500,
        }
    }
}

impl From<std::io::Error> for ConvertError {
    fn from(err: std::io::Error) -> Self {
        Self::conversion("IO_ERROR", err.to_string())
    }
}

impl From<std::fmt::Error> for ConvertError {
    fn from(err: std::fmt::Error) -> Self {
        Self::conversion("CONVERSION_FAILED", err.to_string())
    }
}

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;
