//! Binary STL parsing and serialization.
//!
//! Wire layout (little-endian):
//!
//! ```text
//! UINT8[80]    – free-form header (never starts with "solid" on write)
//! UINT32       – triangle count N
//! N records of 50 bytes:
//!     REAL32[3] – normal
//!     REAL32[3] – vertex 1
//!     REAL32[3] – vertex 2
//!     REAL32[3] – vertex 3
//!     UINT16    – attribute byte count (read and discarded)
//! ```
//!
//! The declared count must make `84 + 50·N` match the byte length; up to
//! two trailing bytes are tolerated. Coordinates are widened to `f64` in
//! memory and narrow back to the identical `f32` bits on save.

use std::io::Write;

use mesh_model::{MeshModel, StlFormat, Triangle, DEGENERACY_EPSILON};
use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::error::{StlError, StlResult};
use crate::options::ParseOptions;

/// Header size in bytes.
pub(crate) const HEADER_LEN: usize = 80;

/// Header plus triangle count.
pub(crate) const BINARY_PRELUDE_LEN: usize = 84;

/// One triangle record: 12 floats plus the attribute field.
pub(crate) const BINARY_RECORD_LEN: usize = 50;

/// Trailing bytes tolerated beyond the computed length.
const TRAILING_TOLERANCE: u64 = 2;

/// Field names for the 12 floats of a record, for diagnostics.
const FIELD_NAMES: [&str; 12] = [
    "normal.x", "normal.y", "normal.z", "v1.x", "v1.y", "v1.z", "v2.x", "v2.y", "v2.z", "v3.x",
    "v3.y", "v3.z",
];

/// Parse a binary STL buffer into a validated model.
///
/// # Errors
///
/// - [`StlError::Structural`] if the buffer is shorter than the 84-byte
///   prelude.
/// - [`StlError::TooManyTriangles`] if the declared count exceeds the cap.
/// - [`StlError::SizeMismatch`] if the declared count disagrees with the
///   byte length.
/// - [`StlError::InvalidNumeric`] for NaN or infinite coordinates.
/// - [`StlError::Cancelled`] if the token fires.
/// - [`StlError::Model`] if validation of the assembled model fails.
pub fn parse_binary(
    bytes: &[u8],
    file_name: &str,
    options: &ParseOptions,
) -> StlResult<MeshModel> {
    if bytes.len() < BINARY_PRELUDE_LEN {
        return Err(StlError::structural(format!(
            "binary STL needs at least {BINARY_PRELUDE_LEN} bytes, got {}",
            bytes.len()
        )));
    }

    let declared = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]);
    if declared > options.max_triangles {
        return Err(StlError::TooManyTriangles {
            count: u64::from(declared),
            max: u64::from(options.max_triangles),
        });
    }

    let actual_len = bytes.len() as u64;
    let expected_len =
        BINARY_PRELUDE_LEN as u64 + BINARY_RECORD_LEN as u64 * u64::from(declared);
    // Trailing bytes are tolerated; a short buffer would truncate the
    // last record and is always fatal.
    if actual_len < expected_len || actual_len - expected_len > TRAILING_TOLERANCE {
        return Err(StlError::SizeMismatch {
            declared,
            expected_len,
            actual_len,
        });
    }

    debug!(declared, len = actual_len, "parsing binary STL");

    let mut triangles = Vec::with_capacity(declared as usize);
    for index in 0..declared as usize {
        if options.cancel.is_cancelled() {
            return Err(StlError::Cancelled);
        }

        let record = &bytes[BINARY_PRELUDE_LEN + index * BINARY_RECORD_LEN..][..BINARY_RECORD_LEN];
        let mut fields = [0.0f64; 12];
        for (f, field) in fields.iter_mut().enumerate() {
            let offset = f * 4;
            let raw = f32::from_le_bytes([
                record[offset],
                record[offset + 1],
                record[offset + 2],
                record[offset + 3],
            ]);
            if !raw.is_finite() {
                return Err(StlError::InvalidNumeric {
                    line: None,
                    details: format!("record {index}: {} is {raw}", FIELD_NAMES[f]),
                });
            }
            *field = f64::from(raw);
        }
        // The 2-byte attribute count is read and discarded; non-zero
        // values are not an error.

        let mut tri = Triangle::new(
            Vector3::new(fields[0], fields[1], fields[2]),
            Point3::new(fields[3], fields[4], fields[5]),
            Point3::new(fields[6], fields[7], fields[8]),
            Point3::new(fields[9], fields[10], fields[11]),
        );
        if tri.normal.norm() < DEGENERACY_EPSILON {
            if let Some(n) = tri.computed_normal() {
                tri.normal = n;
            }
        }
        triangles.push(tri);
    }

    Ok(MeshModel::create(
        triangles,
        file_name,
        StlFormat::Binary,
        bytes.to_vec(),
    )?)
}

/// Serialize a model as binary STL.
///
/// Emits the stored normals and vertex values in model order; the output
/// is byte-for-byte reproducible for a given triangle sequence.
///
/// # Errors
///
/// Returns an error if the triangle count does not fit the wire format's
/// u32, or on I/O failure.
pub fn write_binary<W: Write>(model: &MeshModel, writer: &mut W) -> StlResult<()> {
    let count = u32::try_from(model.triangle_count()).map_err(|_| StlError::TooManyTriangles {
        count: model.triangle_count() as u64,
        max: u64::from(u32::MAX),
    })?;

    let mut header = [b' '; HEADER_LEN];
    let tag = b"Binary STL exported by stl-io";
    header[..tag.len()].copy_from_slice(tag);
    writer.write_all(&header)?;
    writer.write_all(&count.to_le_bytes())?;

    for tri in model.triangles() {
        write_vec3(writer, tri.normal.x, tri.normal.y, tri.normal.z)?;
        for v in &tri.vertices() {
            write_vec3(writer, v.x, v.y, v.z)?;
        }
        writer.write_all(&0u16.to_le_bytes())?;
    }

    debug!(count, "wrote binary STL");
    Ok(())
}

/// Write three values as little-endian f32.
#[allow(clippy::cast_possible_truncation)]
// Truncation: f64 to f32 is intentional, STL stores f32 on the wire
fn write_vec3<W: Write>(writer: &mut W, x: f64, y: f64, z: f64) -> StlResult<()> {
    writer.write_all(&(x as f32).to_le_bytes())?;
    writer.write_all(&(y as f32).to_le_bytes())?;
    writer.write_all(&(z as f32).to_le_bytes())?;
    Ok(())
}
