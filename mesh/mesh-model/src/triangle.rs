//! Triangle value type with a stored facet normal.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cross-product magnitude below which a triangle is degenerate.
///
/// A degenerate triangle has collinear (or coincident) vertices and
/// contributes no surface area.
pub const DEGENERACY_EPSILON: f64 = 1e-12;

/// Area below which a triangle counts toward the thin-triangle statistic.
///
/// Looser than [`DEGENERACY_EPSILON`]: triangles in this band are valid but
/// flagged in the model metadata as quality hazards.
pub const THIN_TRIANGLE_AREA: f64 = 1e-9;

/// A single STL facet: three vertices plus the facet normal.
///
/// Unlike an indexed mesh face, the triangle stores concrete vertex
/// positions. The normal is the one carried by the source file (or
/// recomputed from winding when the file's normal is unusable), so a
/// parse/save cycle reproduces it exactly.
///
/// Winding is **counter-clockwise when viewed from outside**; the normal
/// follows the right-hand rule.
///
/// # Example
///
/// ```
/// use mesh_model::Triangle;
/// use nalgebra::{Point3, Vector3};
///
/// let tri = Triangle::new(
///     Vector3::new(0.0, 0.0, 1.0),
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// );
///
/// assert!((tri.area() - 0.5).abs() < 1e-10);
/// assert!(tri.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Triangle {
    /// Facet normal as stored in the source file.
    pub normal: Vector3<f64>,
    /// First vertex.
    pub v0: Point3<f64>,
    /// Second vertex.
    pub v1: Point3<f64>,
    /// Third vertex.
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Create a triangle from a normal and three vertices.
    #[inline]
    #[must_use]
    pub const fn new(
        normal: Vector3<f64>,
        v0: Point3<f64>,
        v1: Point3<f64>,
        v2: Point3<f64>,
    ) -> Self {
        Self { normal, v0, v1, v2 }
    }

    /// Create a triangle from coordinate arrays.
    ///
    /// Convenience constructor for wire-format code that reads raw floats.
    #[inline]
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Point3::new is not const in nalgebra
    pub fn from_arrays(normal: [f64; 3], v0: [f64; 3], v1: [f64; 3], v2: [f64; 3]) -> Self {
        Self {
            normal: Vector3::new(normal[0], normal[1], normal[2]),
            v0: Point3::new(v0[0], v0[1], v0[2]),
            v1: Point3::new(v1[0], v1[1], v1[2]),
            v2: Point3::new(v2[0], v2[1], v2[2]),
        }
    }

    /// Compute the (unnormalized) face normal via the right-hand cross
    /// product of the two edges leaving `v0`.
    ///
    /// The magnitude equals twice the triangle's area.
    #[inline]
    #[must_use]
    pub fn normal_unnormalized(&self) -> Vector3<f64> {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        e1.cross(&e2)
    }

    /// Compute the unit normal from vertex winding (CCW, right-hand rule).
    ///
    /// Returns `None` for degenerate triangles. Used to replace a stored
    /// normal whose magnitude is near zero.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_model::Triangle;
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let tri = Triangle::new(
    ///     Vector3::zeros(),
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(0.0, 1.0, 0.0),
    /// );
    /// let n = tri.computed_normal().unwrap();
    /// assert!((n.z - 1.0).abs() < 1e-10);
    /// ```
    #[must_use]
    pub fn computed_normal(&self) -> Option<Vector3<f64>> {
        let n = self.normal_unnormalized();
        let len = n.norm();
        if len > DEGENERACY_EPSILON {
            Some(n / len)
        } else {
            None
        }
    }

    /// Compute the area: half the cross-product magnitude.
    #[inline]
    #[must_use]
    pub fn area(&self) -> f64 {
        self.normal_unnormalized().norm() * 0.5
    }

    /// Check whether the vertices are collinear within [`DEGENERACY_EPSILON`].
    #[inline]
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.normal_unnormalized().norm() < DEGENERACY_EPSILON
    }

    /// Check whether the triangle is thinner than [`THIN_TRIANGLE_AREA`].
    ///
    /// Thin triangles are accepted by the model factory but counted in the
    /// metadata's degenerate statistic.
    #[inline]
    #[must_use]
    pub fn is_thin(&self) -> bool {
        self.area() < THIN_TRIANGLE_AREA
    }

    /// Check that every component (normal and vertices) is finite.
    #[must_use]
    pub fn has_finite_coords(&self) -> bool {
        let Self { normal, v0, v1, v2 } = self;
        normal.iter().all(|c| c.is_finite())
            && v0.iter().all(|c| c.is_finite())
            && v1.iter().all(|c| c.is_finite())
            && v2.iter().all(|c| c.is_finite())
    }

    /// Check validity: all components finite and not degenerate.
    ///
    /// Every triangle in a [`MeshModel`](crate::MeshModel) satisfies this.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.has_finite_coords() && !self.is_degenerate()
    }

    /// Compute the centroid.
    #[inline]
    #[must_use]
    pub fn centroid(&self) -> Point3<f64> {
        Point3::new(
            (self.v0.x + self.v1.x + self.v2.x) / 3.0,
            (self.v0.y + self.v1.y + self.v2.y) / 3.0,
            (self.v0.z + self.v1.z + self.v2.z) / 3.0,
        )
    }

    /// Compute the lengths of the three edges.
    ///
    /// Returns `[len01, len12, len20]`.
    #[inline]
    #[must_use]
    pub fn edge_lengths(&self) -> [f64; 3] {
        [
            (self.v1 - self.v0).norm(),
            (self.v2 - self.v1).norm(),
            (self.v0 - self.v2).norm(),
        ]
    }

    /// Get the length of the shortest edge.
    #[inline]
    #[must_use]
    pub fn min_edge_length(&self) -> f64 {
        let [a, b, c] = self.edge_lengths();
        a.min(b).min(c)
    }

    /// Get the length of the longest edge.
    #[inline]
    #[must_use]
    pub fn max_edge_length(&self) -> f64 {
        let [a, b, c] = self.edge_lengths();
        a.max(b).max(c)
    }

    /// Get the vertices as an array.
    #[inline]
    #[must_use]
    pub const fn vertices(&self) -> [Point3<f64>; 3] {
        [self.v0, self.v1, self.v2]
    }

    /// Create a triangle with reversed winding and flipped normal.
    #[inline]
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            normal: -self.normal,
            v0: self.v0,
            v1: self.v2,
            v2: self.v1,
        }
    }
}
