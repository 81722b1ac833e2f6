//! Validated triangle-mesh model for STL ingestion.
//!
//! This crate provides the in-memory model produced by the STL parsers:
//!
//! - [`Triangle`] - one facet: stored normal plus three vertices
//! - [`Aabb`] - axis-aligned bounding box
//! - [`MeshMetadata`] - statistics derived at model creation
//! - [`MeshModel`] - immutable aggregate built by a validating factory
//! - [`StlFormat`] - ASCII / binary / unknown classification
//!
//! The crate performs no I/O; the `stl-io` crate layers parsing and
//! serialization on top of it.
//!
//! # Invariants
//!
//! A [`MeshModel`] always holds at least one triangle, every triangle is
//! finite and non-degenerate, and the metadata (count, bounding box,
//! surface area) is derived from exactly the triangles it accompanies.
//! Structural edits return new models; nothing is mutated in place.
//!
//! # Example
//!
//! ```
//! use mesh_model::{MeshModel, StlFormat, Triangle};
//! use nalgebra::{Point3, Vector3};
//!
//! let tri = Triangle::new(
//!     Vector3::new(0.0, 0.0, 1.0),
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! );
//! let model = MeshModel::create(vec![tri], "tri.stl", StlFormat::Ascii, Vec::new()).unwrap();
//! assert!(model.metadata().bounding_box.contains(&Point3::new(0.5, 0.5, 0.0)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod bounds;
mod error;
mod format;
mod metadata;
mod model;
mod triangle;

pub use bounds::Aabb;
pub use error::{ModelError, ModelResult};
pub use format::StlFormat;
pub use metadata::MeshMetadata;
pub use model::MeshModel;
pub use triangle::{Triangle, DEGENERACY_EPSILON, THIN_TRIANGLE_AREA};

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point3, Vector3};
