//! Error types for STL parsing and serialization.

use std::path::PathBuf;

use mesh_model::ModelError;
use thiserror::Error;

/// Result type for STL operations.
pub type StlResult<T> = Result<T, StlError>;

/// Errors that can occur while detecting, parsing or saving STL data.
///
/// Every failure of the subsystem is one of these values; nothing panics
/// or unwinds across the public API. Messages carry enough context (line
/// numbers, expected-vs-actual sizes, counts) to diagnose a file without
/// its bytes.
#[derive(Debug, Error)]
pub enum StlError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// Input was empty.
    #[error("empty input: no bytes to parse")]
    EmptyInput,

    /// Path does not carry the `.stl` extension.
    #[error("invalid extension: .{extension} (expected .stl)")]
    InvalidExtension {
        /// The offending extension ("(none)" when absent).
        extension: String,
    },

    /// Malformed structure: bad facet/loop/vertex nesting or counts,
    /// over-long or undecodable lines.
    #[error("structural error{}: {message}", fmt_line(.line))]
    Structural {
        /// 1-based source line for ASCII input; `None` for binary.
        line: Option<usize>,
        /// What was malformed.
        message: String,
    },

    /// Binary declared triangle count disagrees with the byte length.
    #[error(
        "size mismatch: {declared} declared triangles need {expected_len} bytes, file has {actual_len}"
    )]
    SizeMismatch {
        /// Triangle count declared in the header.
        declared: u32,
        /// Byte length implied by the declared count.
        expected_len: u64,
        /// Actual byte length.
        actual_len: u64,
    },

    /// Triangle count exceeds the configured safety cap.
    #[error("too many triangles: {count} exceeds the cap of {max}")]
    TooManyTriangles {
        /// Declared or accumulated triangle count.
        count: u64,
        /// Configured cap.
        max: u64,
    },

    /// A parsed coordinate was NaN or infinite.
    #[error("non-finite value{}: {details}", fmt_line(.line))]
    InvalidNumeric {
        /// 1-based source line for ASCII input; `None` for binary.
        line: Option<usize>,
        /// Which value was non-finite.
        details: String,
    },

    /// Save requested for a model whose format is `Unknown`.
    #[error("unsupported format: model carries no concrete STL variant")]
    UnsupportedFormat,

    /// Format was ambiguous and both parsers rejected the input.
    #[error("unrecognized STL: binary parse failed ({binary}); ASCII parse failed ({ascii})")]
    BothFormatsFailed {
        /// Failure from the binary attempt.
        binary: Box<StlError>,
        /// Failure from the ASCII attempt.
        ascii: Box<StlError>,
    },

    /// Operation cancelled through the supplied token.
    #[error("operation cancelled")]
    Cancelled,

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Model validation failure (no triangles, invalid triangle).
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl StlError {
    /// Create a `Structural` error with an ASCII line number.
    #[must_use]
    pub fn structural_at(line: usize, message: impl Into<String>) -> Self {
        Self::Structural {
            line: Some(line),
            message: message.into(),
        }
    }

    /// Create a `Structural` error without line context.
    #[must_use]
    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural {
            line: None,
            message: message.into(),
        }
    }

    /// Check whether this error is a cancellation, which callers usually
    /// treat differently from data errors.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

fn fmt_line(line: &Option<usize>) -> String {
    line.map_or_else(String::new, |n| format!(" at line {n}"))
}
