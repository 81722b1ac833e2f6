//! ASCII STL parsing and serialization.
//!
//! Grammar (informal, one statement per line, keywords case-insensitive):
//!
//! ```text
//! solid name
//!   facet normal ni nj nk
//!     outer loop
//!       vertex v1x v1y v1z
//!       vertex v2x v2y v2z
//!       vertex v3x v3y v3z
//!     endloop
//!   endfacet
//!   ...
//! endsolid name
//! ```
//!
//! Parsing is line-oriented and streaming: the input is walked line by
//! line without ever materializing it as one string. Unknown leading
//! tokens are ignored for dialect tolerance; structural violations
//! (vertex counts, nesting, over-long lines) abort the whole parse with
//! the offending 1-based line number. A stored normal with near-zero
//! magnitude is recomputed from the vertex winding rather than rejected.

use std::io::Write;
use std::path::Path;
use std::str::SplitWhitespace;

use mesh_model::{MeshModel, StlFormat, Triangle, DEGENERACY_EPSILON};
use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::error::{StlError, StlResult};
use crate::options::ParseOptions;

/// Forward-only line cursor over a byte buffer.
///
/// Yields `(line_number, text)` pairs, enforcing the line-length cap and
/// UTF-8 validity per line. Line numbers are 1-based.
struct LineCursor<'a> {
    rest: &'a [u8],
    line_no: usize,
    max_len: usize,
}

impl<'a> LineCursor<'a> {
    const fn new(bytes: &'a [u8], max_len: usize) -> Self {
        Self {
            rest: bytes,
            line_no: 0,
            max_len,
        }
    }

    fn next_line(&mut self) -> StlResult<Option<(usize, &'a str)>> {
        let rest = self.rest;
        if rest.is_empty() {
            return Ok(None);
        }
        self.line_no += 1;

        let window = rest.len().min(self.max_len + 1);
        let raw = match rest[..window].iter().position(|&b| b == b'\n') {
            Some(i) => {
                self.rest = &rest[i + 1..];
                &rest[..i]
            }
            None => {
                if rest.len() > self.max_len {
                    return Err(StlError::structural_at(
                        self.line_no,
                        format!("line exceeds {} bytes", self.max_len),
                    ));
                }
                self.rest = &[];
                rest
            }
        };
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let text = std::str::from_utf8(raw)
            .map_err(|_| StlError::structural_at(self.line_no, "line is not valid UTF-8"))?;
        Ok(Some((self.line_no, text)))
    }
}

/// A facet being assembled between `facet` and `endfacet`.
struct FacetState {
    start_line: usize,
    normal: Vector3<f64>,
    in_loop: bool,
    loop_closed: bool,
    vertices: Vec<Point3<f64>>,
}

/// Parse an ASCII STL buffer into a validated model.
///
/// # Errors
///
/// - [`StlError::Structural`] for nesting or vertex-count violations,
///   over-long lines, undecodable lines and malformed numbers, carrying
///   the offending line number.
/// - [`StlError::InvalidNumeric`] for NaN or infinite values.
/// - [`StlError::TooManyTriangles`] past the configured cap.
/// - [`StlError::Cancelled`] if the token fires.
/// - [`StlError::Model`] if validation of the assembled model fails.
pub fn parse_ascii(bytes: &[u8], file_name: &str, options: &ParseOptions) -> StlResult<MeshModel> {
    debug!(len = bytes.len(), "parsing ASCII STL");

    let mut cursor = LineCursor::new(bytes, options.max_line_length);
    let mut triangles: Vec<Triangle> = Vec::new();
    let mut facet: Option<FacetState> = None;

    loop {
        if options.cancel.is_cancelled() {
            return Err(StlError::Cancelled);
        }
        let Some((line_no, text)) = cursor.next_line()? else {
            break;
        };

        let mut tokens = text.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword.to_ascii_lowercase().as_str() {
            "solid" => {
                // Header; the optional name is ignored.
            }
            "facet" => {
                if facet.is_some() {
                    return Err(StlError::structural_at(line_no, "nested 'facet'"));
                }
                if !tokens
                    .next()
                    .is_some_and(|t| t.eq_ignore_ascii_case("normal"))
                {
                    return Err(StlError::structural_at(line_no, "expected 'facet normal'"));
                }
                let normal = parse_vec3(&mut tokens, line_no, "normal")?;
                facet = Some(FacetState {
                    start_line: line_no,
                    normal,
                    in_loop: false,
                    loop_closed: false,
                    vertices: Vec::with_capacity(3),
                });
            }
            "outer" => {
                // Only "outer loop" is a statement; anything else on an
                // "outer" line is an unknown token.
                if tokens.next().is_some_and(|t| t.eq_ignore_ascii_case("loop")) {
                    let Some(state) = facet.as_mut() else {
                        return Err(StlError::structural_at(
                            line_no,
                            "'outer loop' outside a facet",
                        ));
                    };
                    if state.in_loop || state.loop_closed {
                        return Err(StlError::structural_at(
                            line_no,
                            "duplicate 'outer loop' in facet",
                        ));
                    }
                    state.in_loop = true;
                }
            }
            "vertex" => {
                let Some(state) = facet.as_mut() else {
                    return Err(StlError::structural_at(line_no, "'vertex' outside a facet"));
                };
                if !state.in_loop {
                    return Err(StlError::structural_at(
                        line_no,
                        "'vertex' outside 'outer loop'",
                    ));
                }
                if state.vertices.len() == 3 {
                    return Err(StlError::structural_at(
                        line_no,
                        "facet with more than 3 vertices",
                    ));
                }
                let v = parse_vec3(&mut tokens, line_no, "vertex")?;
                state.vertices.push(Point3::new(v.x, v.y, v.z));
            }
            "endloop" => {
                let Some(state) = facet.as_mut() else {
                    return Err(StlError::structural_at(line_no, "'endloop' outside a facet"));
                };
                if !state.in_loop {
                    return Err(StlError::structural_at(
                        line_no,
                        "'endloop' without 'outer loop'",
                    ));
                }
                if state.vertices.len() != 3 {
                    return Err(StlError::structural_at(
                        line_no,
                        format!("facet with {} vertices, expected 3", state.vertices.len()),
                    ));
                }
                state.in_loop = false;
                state.loop_closed = true;
            }
            "endfacet" => {
                let Some(state) = facet.take() else {
                    return Err(StlError::structural_at(line_no, "'endfacet' without 'facet'"));
                };
                if state.in_loop {
                    return Err(StlError::structural_at(
                        line_no,
                        "unterminated 'outer loop'",
                    ));
                }
                if !state.loop_closed {
                    return Err(StlError::structural_at(
                        line_no,
                        format!("facet with {} vertices, expected 3", state.vertices.len()),
                    ));
                }
                if triangles.len() as u64 >= u64::from(options.max_triangles) {
                    return Err(StlError::TooManyTriangles {
                        count: triangles.len() as u64 + 1,
                        max: u64::from(options.max_triangles),
                    });
                }

                let mut tri = Triangle::new(
                    state.normal,
                    state.vertices[0],
                    state.vertices[1],
                    state.vertices[2],
                );
                if tri.normal.norm() < DEGENERACY_EPSILON {
                    if let Some(n) = tri.computed_normal() {
                        tri.normal = n;
                    }
                }
                triangles.push(tri);
            }
            "endsolid" => break,
            _ => {
                // Unknown tokens are ignored for dialect tolerance.
            }
        }
    }

    if let Some(state) = facet {
        return Err(StlError::structural_at(
            state.start_line,
            "unterminated facet at end of input",
        ));
    }

    debug!(count = triangles.len(), "parsed ASCII STL");
    Ok(MeshModel::create(
        triangles,
        file_name,
        StlFormat::Ascii,
        bytes.to_vec(),
    )?)
}

/// Parse three whitespace-separated floats, rejecting non-finite values.
fn parse_vec3(
    tokens: &mut SplitWhitespace<'_>,
    line_no: usize,
    what: &str,
) -> StlResult<Vector3<f64>> {
    let mut out = [0.0f64; 3];
    for (slot, axis) in out.iter_mut().zip(["x", "y", "z"]) {
        let Some(token) = tokens.next() else {
            return Err(StlError::structural_at(
                line_no,
                format!("missing {what} {axis} component"),
            ));
        };
        let value: f64 = token.parse().map_err(|_| {
            StlError::structural_at(line_no, format!("malformed {what} {axis} component: '{token}'"))
        })?;
        if !value.is_finite() {
            return Err(StlError::InvalidNumeric {
                line: Some(line_no),
                details: format!("{what} {axis} component is {value}"),
            });
        }
        *slot = value;
    }
    Ok(Vector3::new(out[0], out[1], out[2]))
}

/// Serialize a model as ASCII STL.
///
/// Emits one facet block per triangle in model order with the stored
/// normals, in scientific notation.
///
/// # Errors
///
/// Returns an error on I/O failure.
pub fn write_ascii<W: Write>(model: &MeshModel, writer: &mut W) -> StlResult<()> {
    let name = solid_name(&model.metadata().file_name);
    writeln!(writer, "solid {name}")?;

    for tri in model.triangles() {
        let n = tri.normal;
        writeln!(writer, "  facet normal {:.6e} {:.6e} {:.6e}", n.x, n.y, n.z)?;
        writeln!(writer, "    outer loop")?;
        for v in &tri.vertices() {
            writeln!(writer, "      vertex {:.6e} {:.6e} {:.6e}", v.x, v.y, v.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }

    writeln!(writer, "endsolid {name}")?;
    debug!(count = model.triangle_count(), "wrote ASCII STL");
    Ok(())
}

/// Solid name for the header line: the sanitized file stem, or "mesh".
fn solid_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    if cleaned.is_empty() {
        "mesh".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mesh_model::ModelError;

    const SINGLE_TRIANGLE: &str = "solid t\n\
        facet normal 0 0 1\n\
        outer loop\n\
        vertex 0 0 0\n\
        vertex 1 0 0\n\
        vertex 0.5 1 0\n\
        endloop\n\
        endfacet\n\
        endsolid t\n";

    fn parse(text: &str) -> StlResult<MeshModel> {
        parse_ascii(text.as_bytes(), "test.stl", &ParseOptions::default())
    }

    #[test]
    fn parses_single_triangle() {
        let model = parse(SINGLE_TRIANGLE).unwrap();
        assert_eq!(model.triangle_count(), 1);
        assert_eq!(model.metadata().format, StlFormat::Ascii);

        let bb = model.metadata().bounding_box;
        assert!((bb.min.x).abs() < 1e-12 && (bb.min.y).abs() < 1e-12);
        assert!((bb.max.x - 1.0).abs() < 1e-12);
        assert!((bb.max.y - 1.0).abs() < 1e-12);
        assert!(bb.max.z.abs() < 1e-12);
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let shouty = SINGLE_TRIANGLE.to_uppercase();
        let model = parse(&shouty).unwrap();
        assert_eq!(model.triangle_count(), 1);
    }

    #[test]
    fn crlf_and_blank_lines_are_tolerated() {
        let text = SINGLE_TRIANGLE.replace('\n', "\r\n\r\n");
        let model = parse(&text).unwrap();
        assert_eq!(model.triangle_count(), 1);
    }

    #[test]
    fn unknown_tokens_are_ignored() {
        let text = SINGLE_TRIANGLE.replace(
            "facet normal 0 0 1\n",
            "color 1.0 0.0 0.0\nfacet normal 0 0 1\n",
        );
        let model = parse(&text).unwrap();
        assert_eq!(model.triangle_count(), 1);
    }

    #[test]
    fn missing_endsolid_is_tolerated() {
        let text = SINGLE_TRIANGLE.replace("endsolid t\n", "");
        let model = parse(&text).unwrap();
        assert_eq!(model.triangle_count(), 1);
    }

    #[test]
    fn fourth_vertex_is_structural_at_its_line() {
        let text = SINGLE_TRIANGLE.replace(
            "endloop\n",
            "vertex 9 9 9\nendloop\n",
        );
        match parse(&text) {
            Err(StlError::Structural { line, message }) => {
                assert_eq!(line, Some(7));
                assert!(message.contains("more than 3"), "message: {message}");
            }
            other => panic!("expected Structural, got {other:?}"),
        }
    }

    #[test]
    fn two_vertices_is_structural_at_endloop() {
        let text = SINGLE_TRIANGLE.replace("vertex 0.5 1 0\n", "");
        match parse(&text) {
            Err(StlError::Structural { line, message }) => {
                assert_eq!(line, Some(6));
                assert!(message.contains("2 vertices"), "message: {message}");
            }
            other => panic!("expected Structural, got {other:?}"),
        }
    }

    #[test]
    fn vertex_outside_loop_is_structural() {
        let text = "solid t\nvertex 0 0 0\nendsolid t\n";
        assert!(matches!(
            parse(text),
            Err(StlError::Structural { line: Some(2), .. })
        ));
    }

    #[test]
    fn unterminated_facet_is_structural() {
        let text = "solid t\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\n";
        assert!(matches!(
            parse(text),
            Err(StlError::Structural { line: Some(2), .. })
        ));
    }

    #[test]
    fn malformed_number_is_structural() {
        let text = SINGLE_TRIANGLE.replace("vertex 1 0 0\n", "vertex 1 zero 0\n");
        match parse(&text) {
            Err(StlError::Structural { line, message }) => {
                assert_eq!(line, Some(5));
                assert!(message.contains("zero"), "message: {message}");
            }
            other => panic!("expected Structural, got {other:?}"),
        }
    }

    #[test]
    fn nan_vertex_is_invalid_numeric() {
        let text = SINGLE_TRIANGLE.replace("vertex 1 0 0\n", "vertex 1 NaN 0\n");
        match parse(&text) {
            Err(StlError::InvalidNumeric { line, details }) => {
                assert_eq!(line, Some(5));
                assert!(details.contains("vertex y"), "details: {details}");
            }
            other => panic!("expected InvalidNumeric, got {other:?}"),
        }
    }

    #[test]
    fn infinite_normal_is_invalid_numeric() {
        let text = SINGLE_TRIANGLE.replace("facet normal 0 0 1\n", "facet normal 0 0 inf\n");
        assert!(matches!(
            parse(&text),
            Err(StlError::InvalidNumeric { line: Some(2), .. })
        ));
    }

    #[test]
    fn zero_normal_is_recomputed_from_winding() {
        let text = SINGLE_TRIANGLE.replace("facet normal 0 0 1\n", "facet normal 0 0 0\n");
        let model = parse(&text).unwrap();
        let n = model.triangles()[0].normal;
        assert!((n.z - 1.0).abs() < 1e-10);
    }

    #[test]
    fn over_long_line_is_structural() {
        let long_comment = format!("; {}\n", "x".repeat(2000));
        let text = format!("solid t\n{long_comment}endsolid t\n");
        let options = ParseOptions::default();
        match parse_ascii(text.as_bytes(), "long.stl", &options) {
            Err(StlError::Structural { line, message }) => {
                assert_eq!(line, Some(2));
                assert!(message.contains("1024"), "message: {message}");
            }
            other => panic!("expected Structural, got {other:?}"),
        }
    }

    #[test]
    fn triangle_cap_aborts() {
        let two = SINGLE_TRIANGLE.replace(
            "endsolid t\n",
            "facet normal 0 0 1\nouter loop\nvertex 0 0 1\nvertex 1 0 1\nvertex 0.5 1 1\nendloop\nendfacet\nendsolid t\n",
        );
        let options = ParseOptions::default().with_max_triangles(1);
        assert!(matches!(
            parse_ascii(two.as_bytes(), "two.stl", &options),
            Err(StlError::TooManyTriangles { count: 2, max: 1 })
        ));
    }

    #[test]
    fn empty_solid_is_no_triangles() {
        let text = "solid empty\nendsolid empty\n";
        assert!(matches!(
            parse(text),
            Err(StlError::Model(ModelError::NoTriangles))
        ));
    }

    #[test]
    fn cancelled_token_aborts() {
        let options = ParseOptions::default();
        options.cancel.cancel();
        assert!(matches!(
            parse_ascii(SINGLE_TRIANGLE.as_bytes(), "c.stl", &options),
            Err(StlError::Cancelled)
        ));
    }

    #[test]
    fn writer_emits_matching_header_and_trailer() {
        let model = parse(SINGLE_TRIANGLE).unwrap();
        let mut out = Vec::new();
        write_ascii(&model, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("solid test\n"), "got: {text}");
        assert!(text.trim_end().ends_with("endsolid test"), "got: {text}");
        assert_eq!(text.matches("facet normal").count(), 1);
        assert_eq!(text.matches("vertex").count(), 3);
    }

    #[test]
    fn roundtrip_preserves_values_within_formatting_precision() {
        let model = parse(SINGLE_TRIANGLE).unwrap();
        let mut out = Vec::new();
        write_ascii(&model, &mut out).unwrap();
        let reparsed = parse_ascii(&out, "test.stl", &ParseOptions::default()).unwrap();

        assert_eq!(model.triangle_count(), reparsed.triangle_count());
        for (a, b) in model.triangles().iter().zip(reparsed.triangles()) {
            for (va, vb) in a.vertices().iter().zip(b.vertices()) {
                assert!((va - vb).norm() < 1e-5);
            }
            assert!((a.normal - b.normal).norm() < 1e-5);
        }
    }
}
