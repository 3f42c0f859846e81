//! Scaling displacements for geometry vertices.
//!
//! [`ScaleGeometry`] computes, for every vertex `p`, the displacement that
//! scales it about an origin `c` by a per-axis factor `s`:
//!
//! ```text
//! d(p) = (s ∘ (p - c) + c - p) * filter(p)
//! ```
//!
//! where `∘` is the component-wise product and `filter` is an optional
//! scalar field acting as a per-vertex weight. A weight of `0` pins a vertex,
//! `1` applies the full scaling.
//!
//! The weight multiplies the displacement, not the scaled position: some
//! scaling tools compute `(s ∘ (p - c) + c) * w - p` instead, which moves a
//! vertex of weight `0` to the world origin. Here it stays in place.
//!
//! # Example
//!
//! ```
//! use meshfield::algo::scale::{ScaleGeometry, ScaleOptions};
//! use meshfield::mesh::{build_from_triangles, Geometry, VertexId};
//! use nalgebra::{Point3, Vector3};
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mut geo: Geometry = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//!
//! let options = ScaleOptions::default().with_scaling(Vector3::new(2.0, 2.0, 1.0));
//! let mut scale = ScaleGeometry::with_options(options);
//! scale.execute(&geo);
//! scale.apply(&mut geo);
//!
//! assert_eq!(*geo.position(VertexId::new(1)), Point3::new(2.0, 0.0, 0.0));
//! ```

use log::debug;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::field::ScalarField;
use crate::mesh::{Geometry, GeometryId, MeshIndex, VertexId};

/// Options for [`ScaleGeometry`].
#[derive(Debug, Clone)]
pub struct ScaleOptions {
    /// Scaling factor per axis (default: ones).
    pub scaling: Vector3<f64>,

    /// Fixed point of the scaling (default: world origin).
    pub origin: Point3<f64>,

    /// Scale about the vertex centroid instead of `origin`.
    pub mean_point: bool,

    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl Default for ScaleOptions {
    fn default() -> Self {
        Self {
            scaling: Vector3::new(1.0, 1.0, 1.0),
            origin: Point3::origin(),
            mean_point: false,
            parallel: true,
        }
    }
}

impl ScaleOptions {
    /// Set the per-axis scaling factor.
    pub fn with_scaling(mut self, scaling: Vector3<f64>) -> Self {
        self.scaling = scaling;
        self
    }

    /// Scale uniformly on all axes.
    pub fn uniform(mut self, factor: f64) -> Self {
        self.scaling = Vector3::new(factor, factor, factor);
        self
    }

    /// Set the fixed point. Turns off `mean_point`.
    pub fn with_origin(mut self, origin: Point3<f64>) -> Self {
        self.origin = origin;
        self.mean_point = false;
        self
    }

    /// Scale about the vertex centroid.
    pub fn with_mean_point(mut self, mean_point: bool) -> Self {
        self.mean_point = mean_point;
        self
    }

    /// Enable or disable parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Computes and applies filtered scaling displacements.
#[derive(Debug, Clone)]
pub struct ScaleGeometry<I: MeshIndex = u32> {
    options: ScaleOptions,
    filter: Option<ScalarField<I>>,
    source: Option<GeometryId>,
    displacements: Vec<Vector3<f64>>,
}

impl<I: MeshIndex> Default for ScaleGeometry<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> ScaleGeometry<I> {
    /// Create a manipulator with default options (identity scaling).
    pub fn new() -> Self {
        Self::with_options(ScaleOptions::default())
    }

    /// Create a manipulator with the given options.
    pub fn with_options(options: ScaleOptions) -> Self {
        Self {
            options,
            filter: None,
            source: None,
            displacements: Vec::new(),
        }
    }

    /// The options in use.
    pub fn options(&self) -> &ScaleOptions {
        &self.options
    }

    /// Replace the options. Drops computed displacements.
    pub fn set_options(&mut self, options: ScaleOptions) {
        self.options = options;
        self.reset();
    }

    /// Set or clear the per-vertex weight field. Drops computed displacements.
    pub fn set_filter(&mut self, filter: Option<ScalarField<I>>) {
        self.filter = filter;
        self.reset();
    }

    /// The per-vertex weight field, if any.
    pub fn filter(&self) -> Option<&ScalarField<I>> {
        self.filter.as_ref()
    }

    fn reset(&mut self) {
        self.source = None;
        self.displacements.clear();
    }

    /// Compute one displacement per vertex of `geometry`.
    ///
    /// A filter whose value count differs from the vertex count is ignored
    /// (all weights `1`); ids missing from the filter weigh `1`. An empty
    /// geometry yields no displacements.
    pub fn execute(&mut self, geometry: &Geometry<I>) {
        self.reset();
        let Some(centroid) = geometry.centroid() else {
            debug!("scale: {:?} has no vertices", geometry.id());
            return;
        };

        let origin = if self.options.mean_point {
            centroid
        } else {
            self.options.origin
        };
        let scaling = self.options.scaling;

        let filter = self
            .filter
            .as_ref()
            .filter(|f| f.len() == geometry.num_vertices());
        if self.filter.is_some() && filter.is_none() {
            debug!(
                "scale: filter size does not match {} vertices of {:?}, ignoring it",
                geometry.num_vertices(),
                geometry.id()
            );
        }

        let displacement = |(i, p): (usize, &Point3<f64>)| {
            let weight = filter
                .and_then(|f| f.get(VertexId::new(i)))
                .unwrap_or(1.0);
            let scaled = origin + (p - origin).component_mul(&scaling);
            (scaled - p) * weight
        };

        let positions = geometry.positions();
        self.displacements = if self.options.parallel {
            positions.par_iter().enumerate().map(displacement).collect()
        } else {
            positions.iter().enumerate().map(displacement).collect()
        };
        self.source = Some(geometry.id());
    }

    /// The last computed displacements, indexed by vertex id.
    pub fn displacements(&self) -> &[Vector3<f64>] {
        &self.displacements
    }

    /// Displacement of one vertex, if computed.
    pub fn displacement(&self, v: VertexId<I>) -> Option<&Vector3<f64>> {
        self.displacements.get(v.index())
    }

    /// Move the vertices of `geometry` by the computed displacements.
    ///
    /// Returns `false`, leaving `geometry` untouched, when nothing was
    /// computed or the displacements belong to another geometry.
    pub fn apply(&self, geometry: &mut Geometry<I>) -> bool {
        if self.source != Some(geometry.id()) {
            debug!(
                "scale: displacements were not computed for {:?}",
                geometry.id()
            );
            return false;
        }
        geometry.displace(&self.displacements);
        true
    }

    /// Displacement lengths as a field bound to the executed geometry.
    pub fn displacement_magnitudes(&self) -> ScalarField<I> {
        let mut field: ScalarField<I> = self
            .displacements
            .iter()
            .enumerate()
            .map(|(i, d)| (VertexId::new(i), d.norm()))
            .collect();
        field.set_geometry(self.source);
        field.with_name("displacement")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_quads;

    fn unit_square() -> Geometry {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        build_from_quads(&vertices, &[[0, 1, 2, 3]]).unwrap()
    }

    #[test]
    fn test_unit_scaling_is_identity() {
        let geo = unit_square();
        let mut scale = ScaleGeometry::new();
        scale.execute(&geo);
        assert_eq!(scale.displacements().len(), 4);
        for d in scale.displacements() {
            assert_eq!(*d, Vector3::zeros());
        }
    }

    #[test]
    fn test_scale_about_origin() {
        let geo = unit_square();
        let mut scale = ScaleGeometry::with_options(ScaleOptions::default().uniform(2.0));
        scale.execute(&geo);
        assert_eq!(
            scale.displacement(VertexId::new(2)),
            Some(&Vector3::new(2.0, 2.0, 0.0))
        );
        assert_eq!(
            scale.displacement(VertexId::new(0)),
            Some(&Vector3::zeros())
        );
    }

    #[test]
    fn test_mean_point_keeps_centroid() {
        let mut geo = unit_square();
        let before = geo.centroid().unwrap();
        let options = ScaleOptions::default()
            .with_scaling(Vector3::new(3.0, 0.5, 1.0))
            .with_mean_point(true);
        let mut scale = ScaleGeometry::with_options(options);
        scale.execute(&geo);
        assert!(scale.apply(&mut geo));

        let after = geo.centroid().unwrap();
        assert!((after - before).norm() < 1e-12);
        assert!((*geo.position(VertexId::new(0)) - Point3::new(-2.0, 0.5, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_zero_filter_pins_vertices() {
        let geo = unit_square();
        let filter = ScalarField::from_values(&geo, [0.0, 1.0, 0.5, 0.0]);
        let mut scale =
            ScaleGeometry::with_options(ScaleOptions::default().uniform(2.0).with_parallel(false));
        scale.set_filter(Some(filter));
        scale.execute(&geo);

        assert_eq!(scale.displacements()[1], Vector3::new(2.0, 0.0, 0.0));
        assert_eq!(scale.displacements()[2], Vector3::new(1.0, 1.0, 0.0));
        assert_eq!(scale.displacements()[3], Vector3::zeros());
    }

    #[test]
    fn test_mismatched_filter_is_ignored() {
        let geo = unit_square();
        let filter = ScalarField::from_values(&geo, [0.0, 0.0]);
        let mut scale = ScaleGeometry::with_options(ScaleOptions::default().uniform(2.0));
        scale.set_filter(Some(filter));
        scale.execute(&geo);
        assert_eq!(scale.displacements()[3], Vector3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_apply_requires_matching_geometry() {
        let geo = unit_square();
        let mut other = unit_square();
        let mut scale = ScaleGeometry::with_options(ScaleOptions::default().uniform(2.0));

        assert!(!scale.apply(&mut other));
        scale.execute(&geo);
        assert!(!scale.apply(&mut other));
        assert_eq!(*other.position(VertexId::new(2)), Point3::new(2.0, 2.0, 0.0));
    }

    #[test]
    fn test_apply_invalidates_tree() {
        let mut geo = unit_square();
        geo.bv_tree();
        assert!(geo.has_tree());

        let mut scale = ScaleGeometry::with_options(ScaleOptions::default().uniform(0.5));
        scale.execute(&geo);
        scale.apply(&mut geo);
        assert!(!geo.has_tree());
        let bounds = geo.bv_tree().bounds().unwrap();
        assert_eq!(bounds.max, Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_magnitudes_field() {
        let geo = unit_square();
        let mut scale = ScaleGeometry::with_options(ScaleOptions::default().uniform(2.0));
        scale.execute(&geo);
        let field = scale.displacement_magnitudes();

        assert!(field.is_bound_to(&geo));
        assert_eq!(field.len(), 4);
        assert!((field.get(VertexId::new(2)).unwrap() - 8.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_empty_geometry_is_noop() {
        let geo = Geometry::<u32>::default();
        let mut scale = ScaleGeometry::with_options(ScaleOptions::default().uniform(2.0));
        scale.execute(&geo);
        assert!(scale.displacements().is_empty());
        assert!(scale.displacement_magnitudes().is_empty());
    }
}
