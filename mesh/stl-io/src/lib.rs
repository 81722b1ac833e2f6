//! STL file I/O: detection, parsing, validation and serialization.
//!
//! This crate is the single entry point for turning STL bytes into a
//! validated [`MeshModel`] and back:
//!
//! - **Format detection** - layered heuristics classifying a buffer as
//!   ASCII, binary, or unknown ([`detect_format`])
//! - **Parsing** - streaming ASCII and fixed-record binary parsers under
//!   safety limits, with cooperative cancellation ([`parse_stl`],
//!   [`parse_stl_bytes`], [`ParseOptions`], [`CancelToken`])
//! - **Serialization** - writers for both variants, routed by the model's
//!   recorded format or an explicit choice ([`save_stl`], [`save_stl_as`])
//!
//! Every failure is a typed [`StlError`] result; parsing is all-or-nothing
//! and no partial model ever escapes. Parsing identical bytes twice yields
//! models with equal triangle sequences and derived metadata (timestamps
//! and ids aside). All functions are stateless, so concurrent calls need
//! no locking.
//!
//! # Example
//!
//! ```no_run
//! use stl_io::{parse_stl, save_stl};
//!
//! let model = parse_stl("part.stl").unwrap();
//! println!(
//!     "{} triangles, {} format",
//!     model.triangle_count(),
//!     model.metadata().format
//! );
//! save_stl(&model, "copy.stl").unwrap();
//! ```
//!
//! # Format dispatch
//!
//! A definite classification runs only the matching parser and surfaces
//! its failure directly. An `Unknown` classification tries binary first
//! (cheaper to reject), then ASCII; if both fail the combined
//! [`StlError::BothFormatsFailed`] reports both hypotheses. Saving never
//! re-detects: it routes by `model.metadata().format`, or by the explicit
//! format argument of [`save_stl_as`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod ascii;
mod binary;
mod cancel;
mod detect;
mod error;
mod options;

pub use ascii::{parse_ascii, write_ascii};
pub use binary::{parse_binary, write_binary};
pub use cancel::CancelToken;
pub use detect::{detect_format, is_valid_binary_stl};
pub use error::{StlError, StlResult};
pub use options::{ParseOptions, DEFAULT_MAX_LINE_LENGTH, DEFAULT_MAX_TRIANGLES};

// Re-export the model types produced and consumed by this crate.
pub use mesh_model::{
    Aabb, MeshMetadata, MeshModel, ModelError, ModelResult, StlFormat, Triangle,
};

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use tracing::{debug, info};

/// Parse an STL file with default options.
///
/// # Errors
///
/// See [`parse_stl_bytes_with`]; additionally [`StlError::FileNotFound`]
/// and [`StlError::Io`] for filesystem failures.
pub fn parse_stl<P: AsRef<Path>>(path: P) -> StlResult<MeshModel> {
    parse_stl_with(path, &ParseOptions::default())
}

/// Parse an STL file with explicit options.
///
/// # Errors
///
/// See [`parse_stl`].
pub fn parse_stl_with<P: AsRef<Path>>(path: P, options: &ParseOptions) -> StlResult<MeshModel> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| map_open_error(e, path))?;
    let file_name = path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    );
    parse_stl_bytes_with(&bytes, &file_name, options)
}

/// Parse an STL byte buffer with default options.
///
/// `file_name` is recorded in the model metadata for provenance.
///
/// # Errors
///
/// See [`parse_stl_bytes_with`].
pub fn parse_stl_bytes(bytes: &[u8], file_name: &str) -> StlResult<MeshModel> {
    parse_stl_bytes_with(bytes, file_name, &ParseOptions::default())
}

/// Parse an STL byte buffer: detect the format, dispatch, validate.
///
/// # Errors
///
/// - [`StlError::EmptyInput`] for an empty buffer.
/// - The matching parser's error for a definite classification.
/// - [`StlError::BothFormatsFailed`] when the format was ambiguous and
///   both parsers rejected the input.
/// - [`StlError::Cancelled`] passes through undecorated so callers can
///   tell cancellation from data errors.
pub fn parse_stl_bytes_with(
    bytes: &[u8],
    file_name: &str,
    options: &ParseOptions,
) -> StlResult<MeshModel> {
    if bytes.is_empty() {
        return Err(StlError::EmptyInput);
    }

    let format = detect::detect_format(bytes);
    debug!(%format, file_name, len = bytes.len(), "dispatching parse");

    let result = match format {
        StlFormat::Ascii => ascii::parse_ascii(bytes, file_name, options),
        StlFormat::Binary => binary::parse_binary(bytes, file_name, options),
        StlFormat::Unknown => parse_with_fallback(bytes, file_name, options),
    };

    if let Ok(model) = &result {
        info!(
            file_name,
            triangles = model.triangle_count(),
            format = %model.metadata().format,
            "parsed STL"
        );
    }
    result
}

/// Parse from a reader, draining it fully first.
///
/// # Errors
///
/// See [`parse_stl_bytes_with`]; additionally [`StlError::Io`] for read
/// failures.
pub fn parse_stl_reader<R: Read>(
    reader: &mut R,
    file_name: &str,
    options: &ParseOptions,
) -> StlResult<MeshModel> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse_stl_bytes_with(&bytes, file_name, options)
}

/// Dual-attempt fallback for ambiguous input: binary first, then ASCII.
fn parse_with_fallback(
    bytes: &[u8],
    file_name: &str,
    options: &ParseOptions,
) -> StlResult<MeshModel> {
    debug!(file_name, "format unknown, trying binary then ASCII");
    let binary_err = match binary::parse_binary(bytes, file_name, options) {
        Ok(model) => return Ok(model),
        Err(StlError::Cancelled) => return Err(StlError::Cancelled),
        Err(e) => e,
    };
    match ascii::parse_ascii(bytes, file_name, options) {
        Ok(model) => Ok(model),
        Err(StlError::Cancelled) => Err(StlError::Cancelled),
        Err(ascii_err) => Err(StlError::BothFormatsFailed {
            binary: Box::new(binary_err),
            ascii: Box::new(ascii_err),
        }),
    }
}

/// Detect the format of an STL file without parsing it.
///
/// Reads a 1 KiB prefix plus the file length; the classification matches
/// [`detect_format`] over the full buffer.
///
/// # Errors
///
/// [`StlError::FileNotFound`] or [`StlError::Io`] for filesystem failures.
pub fn detect_format_file<P: AsRef<Path>>(path: P) -> StlResult<StlFormat> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| map_open_error(e, path))?;
    let total_len = file.metadata()?.len();

    let mut prefix = vec![0u8; 1024];
    let mut filled = 0;
    while filled < prefix.len() {
        let n = file.read(&mut prefix[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    prefix.truncate(filled);

    Ok(detect::detect_with_total_len(&prefix, total_len))
}

/// Save a model to a file, routed by its recorded format.
///
/// Never re-detects: a model parsed as binary is written as binary.
///
/// # Errors
///
/// [`StlError::UnsupportedFormat`] if the model's format is `Unknown`;
/// otherwise see [`save_stl_as`].
pub fn save_stl<P: AsRef<Path>>(model: &MeshModel, path: P) -> StlResult<()> {
    save_stl_as(model, path, model.metadata().format)
}

/// Save a model to a file in an explicit format.
///
/// # Errors
///
/// [`StlError::UnsupportedFormat`] for [`StlFormat::Unknown`], or
/// [`StlError::Io`] for filesystem failures.
pub fn save_stl_as<P: AsRef<Path>>(
    model: &MeshModel,
    path: P,
    format: StlFormat,
) -> StlResult<()> {
    if format == StlFormat::Unknown {
        return Err(StlError::UnsupportedFormat);
    }
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_stl(model, &mut writer, format)?;
    writer.flush()?;
    info!(path = %path.display(), %format, "saved STL");
    Ok(())
}

/// Write a model to any sink in an explicit format.
///
/// # Errors
///
/// [`StlError::UnsupportedFormat`] for [`StlFormat::Unknown`], or the
/// writer's failures.
pub fn write_stl<W: Write>(model: &MeshModel, writer: &mut W, format: StlFormat) -> StlResult<()> {
    match format {
        StlFormat::Ascii => ascii::write_ascii(model, writer),
        StlFormat::Binary => binary::write_binary(model, writer),
        StlFormat::Unknown => Err(StlError::UnsupportedFormat),
    }
}

/// Serialize a model to an in-memory buffer in an explicit format.
///
/// # Errors
///
/// See [`write_stl`].
pub fn stl_to_bytes(model: &MeshModel, format: StlFormat) -> StlResult<Vec<u8>> {
    let mut bytes = Vec::new();
    write_stl(model, &mut bytes, format)?;
    Ok(bytes)
}

/// Caller-layer guard: check that a path carries the `.stl` extension
/// (case-insensitive).
///
/// The parse entry points do not enforce this; file-loading services that
/// filter by extension call it before handing paths over.
///
/// # Errors
///
/// [`StlError::InvalidExtension`] for any other extension, or none.
pub fn check_extension<P: AsRef<Path>>(path: P) -> StlResult<()> {
    let path = path.as_ref();
    let ext = path.extension().and_then(|e| e.to_str());
    match ext {
        Some(e) if e.eq_ignore_ascii_case("stl") => Ok(()),
        Some(e) => Err(StlError::InvalidExtension {
            extension: e.to_string(),
        }),
        None => Err(StlError::InvalidExtension {
            extension: "(none)".to_string(),
        }),
    }
}

/// Map a file-open error, distinguishing a missing file.
fn map_open_error(e: std::io::Error, path: &Path) -> StlError {
    if e.kind() == std::io::ErrorKind::NotFound {
        StlError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else {
        StlError::Io(e)
    }
}
