//! Derived per-model statistics.

use chrono::{DateTime, Utc};

use crate::{Aabb, StlFormat, Triangle};

/// Enclosed volume below this magnitude is reported as `None` (open or
/// flat geometry has no meaningful volume).
const VOLUME_EPSILON: f64 = 1e-9;

/// Statistics derived from a model's triangle sequence.
///
/// Computed once when the model is created and replaced wholesale by
/// structural edits, so the counts and bounds always agree with the
/// triangles they describe.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshMetadata {
    /// Name of the source file (empty for in-memory sources).
    pub file_name: String,
    /// Wire encoding the model was parsed from.
    pub format: StlFormat,
    /// Number of triangles.
    pub triangle_count: usize,
    /// Axis-aligned box enclosing every vertex.
    pub bounding_box: Aabb,
    /// Sum of triangle areas.
    pub surface_area: f64,
    /// Enclosed volume by the divergence theorem, if meaningful.
    ///
    /// `None` when the signed volume is near zero, as for open meshes and
    /// flat geometry. No watertightness check is performed.
    pub volume: Option<f64>,
    /// Number of triangles thinner than the quality threshold.
    pub degenerate_count: usize,
    /// Shortest triangle edge in the mesh.
    pub min_edge_length: f64,
    /// Longest triangle edge in the mesh.
    pub max_edge_length: f64,
    /// Mean edge length over all triangle edges.
    pub avg_edge_length: f64,
    /// When the model was created.
    pub loaded_at: DateTime<Utc>,
}

impl MeshMetadata {
    /// Derive metadata from a validated triangle sequence.
    ///
    /// Callers outside the crate obtain metadata only through the model
    /// factory, which guarantees the sequence is non-empty and valid.
    pub(crate) fn derive(
        triangles: &[Triangle],
        file_name: impl Into<String>,
        format: StlFormat,
    ) -> Self {
        let mut bounding_box = Aabb::empty();
        let mut surface_area = 0.0;
        let mut signed_volume = 0.0;
        let mut degenerate_count = 0;
        let mut min_edge = f64::INFINITY;
        let mut max_edge: f64 = 0.0;
        let mut total_edge = 0.0;

        for tri in triangles {
            for v in &tri.vertices() {
                bounding_box.expand_to_include(v);
            }
            surface_area += tri.area();
            signed_volume += signed_tetrahedron_volume(tri);
            if tri.is_thin() {
                degenerate_count += 1;
            }
            for len in tri.edge_lengths() {
                min_edge = min_edge.min(len);
                max_edge = max_edge.max(len);
                total_edge += len;
            }
        }

        let edge_count = triangles.len() * 3;
        let avg_edge_length = if edge_count == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)] // edge counts stay far below 2^52
            let n = edge_count as f64;
            total_edge / n
        };

        let volume = signed_volume.abs();
        Self {
            file_name: file_name.into(),
            format,
            triangle_count: triangles.len(),
            bounding_box,
            surface_area,
            volume: (volume > VOLUME_EPSILON).then_some(volume),
            degenerate_count,
            min_edge_length: if min_edge.is_finite() { min_edge } else { 0.0 },
            max_edge_length: max_edge,
            avg_edge_length,
            loaded_at: Utc::now(),
        }
    }
}

/// Signed volume of the tetrahedron formed by a triangle and the origin.
///
/// Summed over a closed CCW-wound mesh this yields the enclosed volume
/// (divergence theorem).
fn signed_tetrahedron_volume(tri: &Triangle) -> f64 {
    let v0 = &tri.v0;
    let v1 = &tri.v1;
    let v2 = &tri.v2;

    // (v0 · (v1 × v2)) / 6, with mul_add for accuracy
    let cx = v1.y.mul_add(v2.z, -(v1.z * v2.y));
    let cy = v1.z.mul_add(v2.x, -(v1.x * v2.z));
    let cz = v1.x.mul_add(v2.y, -(v1.y * v2.x));
    v0.z.mul_add(cz, v0.x.mul_add(cx, v0.y * cy)) / 6.0
}
