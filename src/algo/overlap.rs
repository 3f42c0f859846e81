//! Overlap of concurrent scalar fields on shared geometries.
//!
//! [`OverlapScalarFields`] collects, for any number of geometries, the
//! fields defined on each of them and reduces the concurrent values at every
//! vertex into a single field per geometry, using one [`OverlapMethod`] for
//! all groups.
//!
//! # Write access
//!
//! Registered fields are borrowed mutably. [`OverlapScalarFields::execute`]
//! resizes every registered field in place to its geometry's vertex count,
//! zero-filling missing values and dropping values past the end. Registration
//! hands the engine write access to the caller's field, not ownership; the
//! normalized field is what the caller sees once the engine is dropped.
//!
//! # Example
//!
//! ```
//! use meshfield::algo::overlap::{OverlapMethod, OverlapScalarFields};
//! use meshfield::field::ScalarField;
//! use meshfield::mesh::{build_from_triangles, Geometry};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let geo: Geometry = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//!
//! let mut a = ScalarField::from_values(&geo, [1.0, 5.0, 2.0]);
//! let mut b = ScalarField::from_values(&geo, [4.0, 0.0, 2.0]);
//!
//! let mut overlap = OverlapScalarFields::new();
//! overlap.set_method(OverlapMethod::Max);
//! overlap.add_field(&geo, &mut a);
//! overlap.add_field(&geo, &mut b);
//! overlap.execute();
//!
//! let result = overlap.result(geo.id()).unwrap();
//! assert_eq!(result.to_dense(3, 0.0), vec![4.0, 5.0, 2.0]);
//! ```

use indexmap::IndexMap;
use log::{debug, trace};

use crate::field::ScalarField;
use crate::mesh::{Geometry, GeometryId, MeshIndex};

/// Reduction applied to the concurrent values at one vertex.
///
/// The integer codes are stable and accepted by
/// [`OverlapScalarFields::set_method_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverlapMethod {
    /// Largest value.
    Max = 1,
    /// Smallest value.
    Min = 2,
    /// Arithmetic mean.
    Average = 3,
    /// Sum of all values.
    #[default]
    Sum = 4,
}

impl OverlapMethod {
    /// All methods, in code order.
    pub const ALL: [OverlapMethod; 4] = [
        OverlapMethod::Max,
        OverlapMethod::Min,
        OverlapMethod::Average,
        OverlapMethod::Sum,
    ];

    /// Method for an integer code in `1..=4`.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(OverlapMethod::Max),
            2 => Some(OverlapMethod::Min),
            3 => Some(OverlapMethod::Average),
            4 => Some(OverlapMethod::Sum),
            _ => None,
        }
    }

    /// Integer code of this method.
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Reduce concurrent values to one.
    ///
    /// - no values: `0.0`
    /// - one value: that value, whatever the method
    /// - otherwise: fold with the method. `Sum` and `Average` start from
    ///   `0.0` (`Average` adds `v / n` per value); `Min` and `Max` start from
    ///   the first value and fold over all values, the first included.
    pub fn reduce(self, values: &[f64]) -> f64 {
        let Some(&first) = values.first() else {
            return 0.0;
        };
        if values.len() == 1 {
            return first;
        }

        match self {
            OverlapMethod::Max => values.iter().fold(first, |acc, &v| acc.max(v)),
            OverlapMethod::Min => values.iter().fold(first, |acc, &v| acc.min(v)),
            OverlapMethod::Average => {
                let n = values.len() as f64;
                values.iter().fold(0.0, |acc, &v| acc + v / n)
            }
            OverlapMethod::Sum => values.iter().fold(0.0, |acc, &v| acc + v),
        }
    }
}

/// Fields registered for one geometry.
#[derive(Debug)]
struct OverlapGroup<'a, I: MeshIndex> {
    geometry: &'a Geometry<I>,
    fields: Vec<&'a mut ScalarField<I>>,
}

/// Reduces several fields per geometry into one field per geometry.
///
/// Groups and results are keyed by [`GeometryId`] and iterate in the order
/// geometries were first registered.
#[derive(Debug)]
pub struct OverlapScalarFields<'a, I: MeshIndex = u32> {
    groups: IndexMap<GeometryId, OverlapGroup<'a, I>>,
    method: OverlapMethod,
    results: IndexMap<GeometryId, ScalarField<I>>,
}

impl<'a, I: MeshIndex> Default for OverlapScalarFields<'a, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, I: MeshIndex> OverlapScalarFields<'a, I> {
    /// Create an engine with no groups, using [`OverlapMethod::Sum`].
    pub fn new() -> Self {
        Self {
            groups: IndexMap::new(),
            method: OverlapMethod::default(),
            results: IndexMap::new(),
        }
    }

    // ==================== Configuration ====================

    /// The reduction method in use.
    #[inline]
    pub fn method(&self) -> OverlapMethod {
        self.method
    }

    /// Integer code of the reduction method in use.
    #[inline]
    pub fn method_code(&self) -> i32 {
        self.method.code()
    }

    /// Set the reduction method. Clears cached results.
    pub fn set_method(&mut self, method: OverlapMethod) {
        self.method = method;
        self.results.clear();
    }

    /// Set the reduction method by code.
    ///
    /// Codes outside `1..=4` are ignored (method and results unchanged);
    /// returns whether the code was accepted.
    pub fn set_method_code(&mut self, code: i32) -> bool {
        match OverlapMethod::from_code(code) {
            Some(method) => {
                self.set_method(method);
                true
            }
            None => {
                debug!("ignoring unknown overlap method code {}", code);
                false
            }
        }
    }

    // ==================== Registration ====================

    /// Register `field` as defined on `geometry`.
    ///
    /// Skipped, returning `false`, when the geometry has no vertices, the
    /// field has no values, or the field is bound to another geometry. An
    /// unbound field is bound to `geometry`. Accepting a field clears all
    /// cached results.
    pub fn add_field(&mut self, geometry: &'a Geometry<I>, field: &'a mut ScalarField<I>) -> bool {
        if geometry.is_empty() || field.is_empty() {
            debug!(
                "skipping overlap field on {:?}: empty geometry or field",
                geometry.id()
            );
            return false;
        }
        match field.geometry() {
            Some(bound) if bound != geometry.id() => {
                debug!(
                    "skipping overlap field bound to {:?}, registered on {:?}",
                    bound,
                    geometry.id()
                );
                return false;
            }
            Some(_) => {}
            None => field.bind(geometry),
        }

        self.groups
            .entry(geometry.id())
            .or_insert_with(|| OverlapGroup {
                geometry,
                fields: Vec::new(),
            })
            .fields
            .push(field);
        self.results.clear();
        true
    }

    /// Register many `(geometry, field)` pairs; returns how many were accepted.
    pub fn add_fields<T>(&mut self, fields: T) -> usize
    where
        T: IntoIterator<Item = (&'a Geometry<I>, &'a mut ScalarField<I>)>,
    {
        fields
            .into_iter()
            .map(|(geometry, field)| self.add_field(geometry, field))
            .filter(|&accepted| accepted)
            .count()
    }

    /// Drop the group of a geometry. Clears all cached results.
    ///
    /// Returns whether a group was removed.
    pub fn remove_geometry(&mut self, geometry: GeometryId) -> bool {
        let removed = self.groups.shift_remove(&geometry).is_some();
        self.results.clear();
        removed
    }

    /// Drop every group and cached result.
    pub fn remove_all(&mut self) {
        self.groups.clear();
        self.results.clear();
    }

    /// Drop everything and restore the default method.
    pub fn clear(&mut self) {
        self.remove_all();
        self.method = OverlapMethod::default();
    }

    // ==================== Execution ====================

    /// Reduce every group into one field per geometry.
    ///
    /// Does nothing when no group is registered. Otherwise every registered
    /// field is resized in place to its geometry's vertex count (zero fill)
    /// and the result for each geometry covers all of its vertices.
    pub fn execute(&mut self) {
        if self.groups.is_empty() {
            return;
        }
        self.results.clear();

        let method = self.method;
        let mut scratch: Vec<f64> = Vec::new();

        for (&id, group) in self.groups.iter_mut() {
            let geometry = group.geometry;
            let size = geometry.num_vertices();
            trace!(
                "overlapping {} fields on {:?} ({} vertices, {:?})",
                group.fields.len(),
                id,
                size,
                method
            );

            for field in group.fields.iter_mut() {
                field.resize(size, 0.0);
            }

            let mut result = ScalarField::bound_to(geometry);
            for v in geometry.vertex_ids() {
                scratch.clear();
                scratch.extend(group.fields.iter().map(|f| f.get(v).unwrap_or(0.0)));
                result.insert(v, method.reduce(&scratch));
            }

            self.results.insert(id, result);
        }

        debug!("overlap produced {} fields", self.results.len());
    }

    // ==================== Results ====================

    /// Overlapped field of one geometry, if computed.
    pub fn result(&self, geometry: GeometryId) -> Option<&ScalarField<I>> {
        self.results.get(&geometry)
    }

    /// Number of fields left after overlapping: one per linked geometry.
    pub fn num_effective_fields(&self) -> usize {
        self.groups.len()
    }

    /// Number of registered fields across all geometries.
    pub fn num_linked_fields(&self) -> usize {
        self.groups.values().map(|g| g.fields.len()).sum()
    }

    /// Geometries with at least one registered field, in registration order.
    pub fn linked_geometries(&self) -> Vec<GeometryId> {
        self.groups.keys().copied().collect()
    }

    /// All overlapped fields keyed by geometry.
    pub fn results(&self) -> &IndexMap<GeometryId, ScalarField<I>> {
        &self.results
    }

    /// All overlapped fields as `(geometry, field)` pairs.
    pub fn result_list(&self) -> Vec<(GeometryId, &ScalarField<I>)> {
        self.results.iter().map(|(&id, f)| (id, f)).collect()
    }

    /// Take the overlapped fields out of the engine, leaving the cache empty.
    pub fn take_results(&mut self) -> IndexMap<GeometryId, ScalarField<I>> {
        std::mem::take(&mut self.results)
    }
}
