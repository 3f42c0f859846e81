//! Scalar fields bound to a geometry.
//!
//! A [`ScalarField`] maps vertex ids to `f64` values. It is sparse: a field
//! need not carry a value for every vertex of its geometry. A field is bound
//! to at most one geometry, by [`GeometryId`], and may carry a name.
//!
//! # Example
//!
//! ```
//! use meshfield::field::ScalarField;
//! use meshfield::mesh::{build_from_triangles, Geometry, VertexId};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let geo: Geometry = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//!
//! let mut field = ScalarField::from_values(&geo, [1.0, 2.0]).with_name("pressure");
//! assert!(field.is_bound_to(&geo));
//! assert_eq!(field.get(VertexId::new(1)), Some(2.0));
//!
//! // Pad to the geometry size.
//! field.resize(geo.num_vertices(), 0.0);
//! assert_eq!(field.get(VertexId::new(2)), Some(0.0));
//! ```

use std::collections::BTreeMap;

use crate::mesh::{Geometry, GeometryId, MeshIndex, VertexId};

/// Sparse scalar values keyed by vertex id.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField<I: MeshIndex = u32> {
    name: String,
    geometry: Option<GeometryId>,
    values: BTreeMap<VertexId<I>, f64>,
}

impl<I: MeshIndex> Default for ScalarField<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> ScalarField<I> {
    /// Create an empty, unbound, unnamed field.
    pub fn new() -> Self {
        Self {
            name: String::new(),
            geometry: None,
            values: BTreeMap::new(),
        }
    }

    /// Create an empty field bound to `geometry`.
    pub fn bound_to(geometry: &Geometry<I>) -> Self {
        let mut field = Self::new();
        field.bind(geometry);
        field
    }

    /// Create a field bound to `geometry` holding `values` at ids `0, 1, 2, ...`.
    pub fn from_values(geometry: &Geometry<I>, values: impl IntoIterator<Item = f64>) -> Self {
        let mut field = Self::bound_to(geometry);
        field.extend(
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (VertexId::new(i), v)),
        );
        field
    }

    /// Set the name, builder style.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    // ==================== Binding ====================

    /// The field name (empty if unnamed).
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the field.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The geometry this field is bound to, if any.
    #[inline]
    pub fn geometry(&self) -> Option<GeometryId> {
        self.geometry
    }

    /// Bind to `geometry`, replacing any previous binding.
    pub fn bind(&mut self, geometry: &Geometry<I>) {
        self.geometry = Some(geometry.id());
    }

    /// Set or clear the binding by handle.
    pub fn set_geometry(&mut self, geometry: Option<GeometryId>) {
        self.geometry = geometry;
    }

    /// Whether this field is bound to exactly `geometry`.
    #[inline]
    pub fn is_bound_to(&self, geometry: &Geometry<I>) -> bool {
        self.geometry == Some(geometry.id())
    }

    // ==================== Values ====================

    /// Number of ids carrying a value.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no id carries a value.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `id`, if present.
    #[inline]
    pub fn get(&self, id: VertexId<I>) -> Option<f64> {
        self.values.get(&id).copied()
    }

    /// Whether `id` carries a value.
    #[inline]
    pub fn contains(&self, id: VertexId<I>) -> bool {
        self.values.contains_key(&id)
    }

    /// Set the value at `id`, returning the previous one.
    pub fn insert(&mut self, id: VertexId<I>, value: f64) -> Option<f64> {
        self.values.insert(id, value)
    }

    /// Remove the value at `id`.
    pub fn remove(&mut self, id: VertexId<I>) -> Option<f64> {
        self.values.remove(&id)
    }

    /// Drop all values. Name and binding are kept.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Make the field cover exactly the ids `0..len`.
    ///
    /// Values at ids `>= len` are dropped; missing ids below `len` are set
    /// to `fill`. Existing values below `len` are untouched.
    pub fn resize(&mut self, len: usize, fill: f64) {
        if len <= I::MAX.to_usize() {
            self.values.split_off(&VertexId::new(len));
        }
        for i in 0..len {
            self.values.entry(VertexId::new(i)).or_insert(fill);
        }
    }

    /// Iterate over `(id, value)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId<I>, f64)> + '_ {
        self.values.iter().map(|(&id, &v)| (id, v))
    }

    /// Iterate over ids carrying a value, ascending.
    pub fn ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.values.keys().copied()
    }

    /// Dense copy over ids `0..len`, `fill` where a value is missing.
    pub fn to_dense(&self, len: usize, fill: f64) -> Vec<f64> {
        (0..len)
            .map(|i| self.get(VertexId::new(i)).unwrap_or(fill))
            .collect()
    }
}

impl<I: MeshIndex> Extend<(VertexId<I>, f64)> for ScalarField<I> {
    /// Bulk insert; later pairs overwrite earlier ones with the same id.
    fn extend<T: IntoIterator<Item = (VertexId<I>, f64)>>(&mut self, iter: T) {
        self.values.extend(iter);
    }
}

impl<I: MeshIndex> FromIterator<(VertexId<I>, f64)> for ScalarField<I> {
    fn from_iter<T: IntoIterator<Item = (VertexId<I>, f64)>>(iter: T) -> Self {
        let mut field = Self::new();
        field.extend(iter);
        field
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_point_cloud;
    use nalgebra::Point3;

    fn cloud(n: usize) -> Geometry {
        let points: Vec<Point3<f64>> = (0..n).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
        build_point_cloud(&points).unwrap()
    }

    #[test]
    fn test_new_field_is_empty_and_unbound() {
        let field = ScalarField::<u32>::new();
        assert!(field.is_empty());
        assert!(field.geometry().is_none());
        assert_eq!(field.name(), "");
    }

    #[test]
    fn test_binding() {
        let a = cloud(2);
        let b = cloud(2);
        let mut field = ScalarField::bound_to(&a);
        assert!(field.is_bound_to(&a));
        assert!(!field.is_bound_to(&b));

        field.bind(&b);
        assert_eq!(field.geometry(), Some(b.id()));
    }

    #[test]
    fn test_resize_pads_with_fill() {
        let geo = cloud(5);
        let mut field = ScalarField::from_values(&geo, [1.0, 2.0, 3.0]);
        field.resize(5, 0.0);
        assert_eq!(field.to_dense(5, f64::NAN), vec![1.0, 2.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_resize_truncates() {
        let geo = cloud(4);
        let mut field = ScalarField::from_values(&geo, [1.0, 2.0, 3.0, 4.0]);
        field.resize(2, 0.0);
        assert_eq!(field.len(), 2);
        assert!(!field.contains(VertexId::new(2)));
        assert_eq!(field.get(VertexId::new(1)), Some(2.0));
    }

    #[test]
    fn test_resize_fills_holes_in_sparse_field() {
        let mut field: ScalarField = [(VertexId::new(2), 7.0)].into_iter().collect();
        field.resize(3, -1.0);
        assert_eq!(field.to_dense(3, 0.0), vec![-1.0, -1.0, 7.0]);
    }

    #[test]
    fn test_insert_and_remove() {
        let mut field = ScalarField::<u32>::new();
        assert_eq!(field.insert(VertexId::new(3), 1.5), None);
        assert_eq!(field.insert(VertexId::new(3), 2.5), Some(1.5));
        assert_eq!(field.remove(VertexId::new(3)), Some(2.5));
        assert!(field.is_empty());
    }

    #[test]
    fn test_iteration_is_ordered() {
        let mut field = ScalarField::<u32>::new();
        field.extend([(VertexId::new(4), 4.0), (VertexId::new(1), 1.0)]);
        let ids: Vec<usize> = field.ids().map(|v| v.index()).collect();
        assert_eq!(ids, vec![1, 4]);
    }
}
