//! # meshfield
//!
//! Scalar field composition on meshes.
//!
//! meshfield holds per-vertex scalar fields bound to lightweight geometries
//! and provides engines that combine them:
//!
//! - **Overlap**: several fields on the same geometry are reduced into one
//!   (sum, average, min, max)
//! - **Switch**: a target geometry picks its field from a pool of candidates,
//!   either an exact match or by spatial correspondence through
//!   bounding-volume trees
//! - **Scale**: per-vertex scaling displacements weighted by a filter field
//!
//! ## Quick Start
//!
//! ```no_run
//! use meshfield::prelude::*;
//!
//! let geo: Geometry = meshfield::io::load("part.stl").unwrap();
//! let mut thermal = meshfield::io::field::read("thermal.txt", &geo).unwrap();
//! let mut mechanical = meshfield::io::field::read("mechanical.txt", &geo).unwrap();
//!
//! let mut overlap = OverlapScalarFields::new();
//! overlap.set_method(OverlapMethod::Max);
//! overlap.add_field(&geo, &mut thermal);
//! overlap.add_field(&geo, &mut mechanical);
//! overlap.execute();
//!
//! let combined = overlap.result(geo.id()).unwrap();
//! println!("{} values", combined.len());
//! ```
//!
//! ## Switching Between Geometries
//!
//! ```
//! use meshfield::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let target: Geometry = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
//! let source: Geometry = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//! let field = ScalarField::from_values(&source, [1.0, 2.0, 3.0, 4.0]);
//!
//! let mut switch = SwitchScalarField::new();
//! switch.set_target(&target);
//! switch.add_field(&field, &source);
//! switch.switch().unwrap();
//!
//! // Both target cells overlap the box of the source triangle.
//! assert_eq!(switch.switched_field().len(), 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod field;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use meshfield::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::{
        OverlapMethod, OverlapScalarFields, ScaleGeometry, ScaleOptions, SwitchOptions,
        SwitchScalarField,
    };
    pub use crate::error::{FieldError, Result};
    pub use crate::field::ScalarField;
    pub use crate::mesh::{
        build_from_cells, build_from_quads, build_from_segments, build_from_triangles,
        build_point_cloud, CellId, Geometry, GeometryId, GeometryKind, MeshIndex, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_overlap_then_switch() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let target: Geometry = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
        let source: Geometry = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();

        let mut a = ScalarField::from_values(&source, [1.0, 1.0]);
        let mut b = ScalarField::from_values(&source, [2.0, 2.0, 2.0, 2.0]);
        let mut overlap = OverlapScalarFields::new();
        overlap.add_field(&source, &mut a);
        overlap.add_field(&source, &mut b);
        overlap.execute();
        let combined = overlap.result(source.id()).unwrap().clone();
        assert_eq!(combined.to_dense(4, f64::NAN), vec![3.0, 3.0, 2.0, 2.0]);

        let mut switch = SwitchScalarField::new();
        switch.set_target(&target);
        switch.add_field(&combined, &source);
        switch.switch().unwrap();

        let result = switch.switched_field();
        assert!(result.is_bound_to(&target));
        assert_eq!(result.to_dense(4, f64::NAN), vec![3.0, 3.0, 2.0, 2.0]);
    }
}
