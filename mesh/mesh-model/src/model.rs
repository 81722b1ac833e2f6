//! The validated mesh aggregate.

use nalgebra::Matrix4;
use uuid::Uuid;

use crate::error::{ModelError, ModelResult};
use crate::{MeshMetadata, StlFormat, Triangle};

/// A validated, immutable triangle mesh with derived metadata.
///
/// Created only through [`MeshModel::create`], which enforces the model
/// invariants:
///
/// - the triangle sequence is non-empty;
/// - every triangle is [valid](Triangle::is_valid) (finite, non-degenerate);
/// - the metadata agrees with the triangles (count, bounding box).
///
/// The model exclusively owns its triangles and the raw source bytes;
/// structural edits ([`filtered`](Self::filtered),
/// [`transformed`](Self::transformed)) return a new model with freshly
/// derived metadata rather than mutating in place.
///
/// # Example
///
/// ```
/// use mesh_model::{MeshModel, StlFormat, Triangle};
/// use nalgebra::{Point3, Vector3};
///
/// let tri = Triangle::new(
///     Vector3::new(0.0, 0.0, 1.0),
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// );
/// let model = MeshModel::create(vec![tri], "tri.stl", StlFormat::Ascii, Vec::new()).unwrap();
/// assert_eq!(model.metadata().triangle_count, 1);
/// ```
#[derive(Debug, Clone)]
pub struct MeshModel {
    id: Uuid,
    metadata: MeshMetadata,
    triangles: Vec<Triangle>,
    raw_bytes: Vec<u8>,
}

impl MeshModel {
    /// Build a model from parsed triangles, validating every invariant.
    ///
    /// `raw_bytes` is the original file content, kept for provenance only;
    /// pass an empty vector for synthetic meshes.
    ///
    /// # Errors
    ///
    /// - [`ModelError::NoTriangles`] if the sequence is empty.
    /// - [`ModelError::InvalidTriangle`] for the first triangle with a
    ///   non-finite component or degenerate geometry.
    pub fn create(
        triangles: Vec<Triangle>,
        file_name: impl Into<String>,
        format: StlFormat,
        raw_bytes: Vec<u8>,
    ) -> ModelResult<Self> {
        if triangles.is_empty() {
            return Err(ModelError::NoTriangles);
        }

        for (index, tri) in triangles.iter().enumerate() {
            if !tri.has_finite_coords() {
                return Err(ModelError::InvalidTriangle {
                    index,
                    details: "non-finite component".to_string(),
                });
            }
            if tri.is_degenerate() {
                return Err(ModelError::InvalidTriangle {
                    index,
                    details: "degenerate geometry (collinear vertices)".to_string(),
                });
            }
        }

        let metadata = MeshMetadata::derive(&triangles, file_name, format);
        Ok(Self {
            id: Uuid::new_v4(),
            metadata,
            triangles,
            raw_bytes,
        })
    }

    /// Unique id of this model instance.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Derived metadata.
    #[inline]
    #[must_use]
    pub const fn metadata(&self) -> &MeshMetadata {
        &self.metadata
    }

    /// The ordered triangle sequence.
    #[inline]
    #[must_use]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// The original source bytes (empty for synthetic meshes).
    #[inline]
    #[must_use]
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw_bytes
    }

    /// Number of triangles. Always greater than zero.
    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Create a new model keeping only the triangles the predicate accepts.
    ///
    /// Metadata is re-derived and the new model gets a fresh id; the source
    /// bytes are carried over for provenance.
    ///
    /// # Errors
    ///
    /// [`ModelError::NoTriangles`] if the predicate rejects everything.
    pub fn filtered(&self, mut predicate: impl FnMut(&Triangle) -> bool) -> ModelResult<Self> {
        let kept: Vec<Triangle> = self
            .triangles
            .iter()
            .filter(|tri| predicate(tri))
            .copied()
            .collect();
        Self::create(
            kept,
            self.metadata.file_name.clone(),
            self.metadata.format,
            self.raw_bytes.clone(),
        )
    }

    /// Create a new model with every vertex mapped through a homogeneous
    /// transform.
    ///
    /// Normals are recomputed from the transformed winding rather than
    /// transformed directly, so non-rigid transforms stay consistent.
    ///
    /// # Errors
    ///
    /// [`ModelError::InvalidTriangle`] if the transform collapses a
    /// triangle (for example a zero scale).
    pub fn transformed(&self, transform: &Matrix4<f64>) -> ModelResult<Self> {
        let mapped: Vec<Triangle> = self
            .triangles
            .iter()
            .map(|tri| {
                let v0 = transform.transform_point(&tri.v0);
                let v1 = transform.transform_point(&tri.v1);
                let v2 = transform.transform_point(&tri.v2);
                let mut out = Triangle::new(tri.normal, v0, v1, v2);
                if let Some(n) = out.computed_normal() {
                    out.normal = n;
                }
                out
            })
            .collect();
        Self::create(
            mapped,
            self.metadata.file_name.clone(),
            self.metadata.format,
            self.raw_bytes.clone(),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    fn tri(z: f64) -> Triangle {
        Triangle::new(
            Vector3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, z),
            Point3::new(1.0, 0.0, z),
            Point3::new(0.5, 1.0, z),
        )
    }

    #[test]
    fn create_rejects_empty() {
        let result = MeshModel::create(Vec::new(), "empty.stl", StlFormat::Ascii, Vec::new());
        assert!(matches!(result, Err(ModelError::NoTriangles)));
    }

    #[test]
    fn create_rejects_degenerate() {
        let bad = Triangle::new(
            Vector3::zeros(),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        );
        let result =
            MeshModel::create(vec![tri(0.0), bad], "bad.stl", StlFormat::Binary, Vec::new());
        match result {
            Err(ModelError::InvalidTriangle { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidTriangle, got {other:?}"),
        }
    }

    #[test]
    fn create_rejects_nan() {
        let mut bad = tri(0.0);
        bad.v1.y = f64::NAN;
        let result = MeshModel::create(vec![bad], "nan.stl", StlFormat::Ascii, Vec::new());
        assert!(matches!(
            result,
            Err(ModelError::InvalidTriangle { index: 0, .. })
        ));
    }

    #[test]
    fn metadata_agrees_with_triangles() {
        let model = MeshModel::create(
            vec![tri(0.0), tri(1.0)],
            "two.stl",
            StlFormat::Ascii,
            vec![1, 2, 3],
        )
        .unwrap();
        assert_eq!(model.metadata().triangle_count, model.triangle_count());
        assert_eq!(model.raw_bytes(), &[1, 2, 3]);
        let bb = model.metadata().bounding_box;
        for t in model.triangles() {
            for v in &t.vertices() {
                assert!(bb.contains(v));
            }
        }
    }

    #[test]
    fn filtered_rederives_metadata() {
        let model = MeshModel::create(
            vec![tri(0.0), tri(5.0)],
            "two.stl",
            StlFormat::Ascii,
            Vec::new(),
        )
        .unwrap();
        let lower = model.filtered(|t| t.v0.z < 1.0).unwrap();
        assert_eq!(lower.triangle_count(), 1);
        assert_relative_eq!(lower.metadata().bounding_box.max.z, 0.0);
        assert_ne!(lower.id(), model.id());
    }

    #[test]
    fn filtered_to_nothing_fails() {
        let model =
            MeshModel::create(vec![tri(0.0)], "one.stl", StlFormat::Ascii, Vec::new()).unwrap();
        assert!(matches!(
            model.filtered(|_| false),
            Err(ModelError::NoTriangles)
        ));
    }

    #[test]
    fn transformed_scales_bounds() {
        let model =
            MeshModel::create(vec![tri(0.0)], "one.stl", StlFormat::Ascii, Vec::new()).unwrap();
        let scale = Matrix4::new_scaling(2.0);
        let scaled = model.transformed(&scale).unwrap();
        assert_relative_eq!(scaled.metadata().bounding_box.max.x, 2.0, epsilon = 1e-10);
        assert_relative_eq!(
            scaled.metadata().surface_area,
            model.metadata().surface_area * 4.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn transformed_to_zero_scale_fails() {
        let model =
            MeshModel::create(vec![tri(0.0)], "one.stl", StlFormat::Ascii, Vec::new()).unwrap();
        let collapse = Matrix4::new_scaling(0.0);
        assert!(matches!(
            model.transformed(&collapse),
            Err(ModelError::InvalidTriangle { .. })
        ));
    }
}
