//! Geometry storage and spatial indexing.
//!
//! This module provides the minimal geometry the field engines work on:
//! vertex positions, cell connectivity, a stable identity handle, and a
//! bounding-volume tree per geometry.
//!
//! # Index Types
//!
//! - [`VertexId`] - Identifies a vertex; scalar fields are keyed by it
//! - [`CellId`] - Identifies a cell (point, segment, polygon)
//! - [`GeometryId`] - Identifies a whole geometry object
//!
//! Vertex and cell ids are generic over the underlying integer type
//! ([`MeshIndex`]), defaulting to `u32`.
//!
//! # Construction
//!
//! ```
//! use meshfield::mesh::{build_from_triangles, Geometry};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let geo: Geometry = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//! assert_eq!(geo.bv_tree().num_cells(), 1);
//! ```

mod builder;
mod bvtree;
mod geometry;
mod index;

pub use builder::{
    build_from_cells, build_from_quads, build_from_segments, build_from_triangles,
    build_point_cloud,
};
pub use bvtree::{Aabb, BoxOverlap, BvTree, BvTreeOptions, SpatialCorrespondence};
pub use geometry::{Geometry, GeometryId, GeometryKind};
pub use index::{CellId, MeshIndex, VertexId};
