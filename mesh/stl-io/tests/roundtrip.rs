//! End-to-end scenarios: file round trips, format detection consistency,
//! and the documented boundary behaviors.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Write;

use approx::assert_relative_eq;
use stl_io::{
    detect_format, detect_format_file, parse_stl, parse_stl_bytes, save_stl, save_stl_as,
    stl_to_bytes, StlError, StlFormat,
};
use tempfile::tempdir;

// =============================================================================
// Fixtures
// =============================================================================

/// A 12-triangle unit cube in ASCII STL, axis-aligned at [0,0,0]..[1,1,1].
fn unit_cube_ascii() -> String {
    let mut text = String::from("solid cube\n");
    // Each face as two triangles; winding CCW viewed from outside.
    let quads: [([f64; 3], [[f64; 3]; 4]); 6] = [
        // -Z
        (
            [0.0, 0.0, -1.0],
            [
                [0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [1.0, 1.0, 0.0],
                [1.0, 0.0, 0.0],
            ],
        ),
        // +Z
        (
            [0.0, 0.0, 1.0],
            [
                [0.0, 0.0, 1.0],
                [1.0, 0.0, 1.0],
                [1.0, 1.0, 1.0],
                [0.0, 1.0, 1.0],
            ],
        ),
        // -Y
        (
            [0.0, -1.0, 0.0],
            [
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 0.0, 1.0],
                [0.0, 0.0, 1.0],
            ],
        ),
        // +Y
        (
            [0.0, 1.0, 0.0],
            [
                [0.0, 1.0, 0.0],
                [0.0, 1.0, 1.0],
                [1.0, 1.0, 1.0],
                [1.0, 1.0, 0.0],
            ],
        ),
        // -X
        (
            [-1.0, 0.0, 0.0],
            [
                [0.0, 0.0, 0.0],
                [0.0, 0.0, 1.0],
                [0.0, 1.0, 1.0],
                [0.0, 1.0, 0.0],
            ],
        ),
        // +X
        (
            [1.0, 0.0, 0.0],
            [
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [1.0, 1.0, 1.0],
                [1.0, 0.0, 1.0],
            ],
        ),
    ];

    for (n, [a, b, c, d]) in &quads {
        for tri in &[[a, b, c], [a, c, d]] {
            text.push_str(&format!("facet normal {} {} {}\n", n[0], n[1], n[2]));
            text.push_str("outer loop\n");
            for v in tri {
                text.push_str(&format!("vertex {} {} {}\n", v[0], v[1], v[2]));
            }
            text.push_str("endloop\nendfacet\n");
        }
    }
    text.push_str("endsolid cube\n");
    text
}

// =============================================================================
// Scenario tests
// =============================================================================

#[test]
fn unit_cube_has_exact_bounds_and_volume() {
    let model = parse_stl_bytes(unit_cube_ascii().as_bytes(), "cube.stl").unwrap();
    assert_eq!(model.triangle_count(), 12);

    let meta = model.metadata();
    let bb = meta.bounding_box;
    assert_relative_eq!(bb.min.x, 0.0);
    assert_relative_eq!(bb.min.y, 0.0);
    assert_relative_eq!(bb.min.z, 0.0);
    assert_relative_eq!(bb.max.x, 1.0);
    assert_relative_eq!(bb.max.y, 1.0);
    assert_relative_eq!(bb.max.z, 1.0);

    assert_relative_eq!(meta.surface_area, 6.0, epsilon = 1e-10);
    assert_relative_eq!(meta.volume.unwrap(), 1.0, epsilon = 1e-10);
    assert_eq!(meta.degenerate_count, 0);
    assert_relative_eq!(meta.min_edge_length, 1.0, epsilon = 1e-10);
    assert_relative_eq!(meta.max_edge_length, 2.0_f64.sqrt(), epsilon = 1e-10);
}

#[test]
fn file_roundtrip_binary() {
    let dir = tempdir().unwrap();
    let original = parse_stl_bytes(unit_cube_ascii().as_bytes(), "cube.stl").unwrap();

    let path = dir.path().join("cube_binary.stl");
    save_stl_as(&original, &path, StlFormat::Binary).unwrap();

    assert_eq!(detect_format_file(&path).unwrap(), StlFormat::Binary);

    let loaded = parse_stl(&path).unwrap();
    assert_eq!(loaded.metadata().format, StlFormat::Binary);
    assert_eq!(loaded.triangle_count(), original.triangle_count());

    // Binary floats survive bit-identically.
    for (a, b) in original.triangles().iter().zip(loaded.triangles()) {
        assert_eq!(a.vertices(), b.vertices());
        assert_eq!(a.normal, b.normal);
    }

    // Save of the loaded model routes by its recorded format and
    // reproduces the same bytes.
    let again = dir.path().join("cube_binary_2.stl");
    save_stl(&loaded, &again).unwrap();
    assert_eq!(
        std::fs::read(&path).unwrap(),
        std::fs::read(&again).unwrap()
    );
}

#[test]
fn file_roundtrip_ascii() {
    let dir = tempdir().unwrap();
    let original = parse_stl_bytes(unit_cube_ascii().as_bytes(), "cube.stl").unwrap();

    let path = dir.path().join("cube_ascii.stl");
    save_stl_as(&original, &path, StlFormat::Ascii).unwrap();

    assert_eq!(detect_format_file(&path).unwrap(), StlFormat::Ascii);

    let loaded = parse_stl(&path).unwrap();
    assert_eq!(loaded.metadata().format, StlFormat::Ascii);
    assert_eq!(loaded.triangle_count(), 12);

    for (a, b) in original.triangles().iter().zip(loaded.triangles()) {
        for (va, vb) in a.vertices().iter().zip(b.vertices()) {
            assert!((va - vb).norm() < 1e-5);
        }
    }

    let meta = loaded.metadata();
    assert_relative_eq!(meta.surface_area, 6.0, epsilon = 1e-5);
}

#[test]
fn detection_consistency_for_serialized_models() {
    let model = parse_stl_bytes(unit_cube_ascii().as_bytes(), "cube.stl").unwrap();
    let ascii = stl_to_bytes(&model, StlFormat::Ascii).unwrap();
    let binary = stl_to_bytes(&model, StlFormat::Binary).unwrap();
    assert_eq!(detect_format(&ascii), StlFormat::Ascii);
    assert_eq!(detect_format(&binary), StlFormat::Binary);
}

#[test]
fn ambiguous_solid_prefixed_binary_sized_file_with_keywords_is_ascii() {
    // Build an ASCII file, then pad it so its length satisfies the binary
    // size equation for whatever count its bytes 80..84 spell. The
    // keyword census must still win and classify it ASCII.
    let mut bytes = unit_cube_ascii().into_bytes();
    let declared = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]);
    let expected = 84u64 + 50 * u64::from(declared);
    if expected > bytes.len() as u64 && expected < 10_000_000 {
        // Pad with ASCII-harmless trailing newlines after endsolid.
        bytes.resize(usize::try_from(expected).unwrap(), b'\n');
    }
    assert_eq!(detect_format(&bytes), StlFormat::Ascii);
    let model = parse_stl_bytes(&bytes, "padded.stl").unwrap();
    assert_eq!(model.metadata().format, StlFormat::Ascii);
}

#[test]
fn missing_file_is_file_not_found() {
    match parse_stl("definitely_missing_4711.stl") {
        Err(StlError::FileNotFound { path }) => {
            assert!(path.to_string_lossy().contains("definitely_missing"));
        }
        other => panic!("expected FileNotFound, got {other:?}"),
    }
}

#[test]
fn empty_file_is_empty_input() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.stl");
    std::fs::File::create(&path).unwrap();

    assert_eq!(detect_format_file(&path).unwrap(), StlFormat::Unknown);
    assert!(matches!(parse_stl(&path), Err(StlError::EmptyInput)));
}

#[test]
fn short_garbage_file_is_unknown_and_unparseable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tiny.stl");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(&[0x00, 0x01]).unwrap();
    drop(file);

    assert_eq!(detect_format_file(&path).unwrap(), StlFormat::Unknown);
    assert!(parse_stl(&path).is_err());
}

#[test]
fn model_raw_bytes_keep_the_source_buffer() {
    let bytes = unit_cube_ascii().into_bytes();
    let model = parse_stl_bytes(&bytes, "cube.stl").unwrap();
    assert_eq!(model.raw_bytes(), bytes.as_slice());
}
