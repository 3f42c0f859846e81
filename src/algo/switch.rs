//! Switching a field onto a target geometry from a pool of candidates.
//!
//! [`SwitchScalarField`] holds candidate fields, each paired with the
//! geometry it is defined on, and resolves the field of one target
//! geometry from them:
//!
//! 1. **Exact match**: the first candidate (in registration order) whose
//!    source geometry *is* the target becomes the result, renamed after that
//!    candidate and bound to the target. Nothing else is consulted.
//! 2. **Spatial correspondence**: otherwise, if mapping is enabled, every
//!    candidate is matched against the target through their bounding-volume
//!    trees. The vertices of every matched target cell take the candidate's
//!    value at the same id. The first candidate to write an id keeps it; the
//!    result is named after the last candidate that matched any cell.
//! 3. If the result is still empty, resolution fails.
//!
//! # Shared numbering
//!
//! The correspondence pass reads each candidate at the *target* vertex id.
//! This is only meaningful when source and target number their vertices the
//! same way in the matched region, e.g. a patch extracted from the target
//! without renumbering, or a duplicate of the target. No interpolation is
//! attempted; target ids the candidate has no value for stay unset.
//!
//! # Example
//!
//! ```
//! use meshfield::algo::switch::SwitchScalarField;
//! use meshfield::field::ScalarField;
//! use meshfield::mesh::{build_from_triangles, Geometry};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let target: Geometry = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//! let copy = target.clone();
//!
//! let on_copy = ScalarField::from_values(&copy, [1.0, 2.0, 3.0]).with_name("copy");
//! let on_target = ScalarField::from_values(&target, [7.0, 8.0, 9.0]).with_name("exact");
//!
//! let mut switch = SwitchScalarField::new();
//! switch.add_field(&on_copy, &copy);
//! switch.add_field(&on_target, &target);
//! switch.set_target(&target);
//!
//! switch.switch().unwrap();
//! assert_eq!(switch.switched_field().name(), "exact");
//! ```

use log::debug;

use crate::error::{FieldError, Result};
use crate::field::ScalarField;
use crate::mesh::{BoxOverlap, Geometry, MeshIndex, SpatialCorrespondence};

/// Tolerance used for spatial correspondence unless configured otherwise.
pub const DEFAULT_TOLERANCE: f64 = 1.0e-8;

/// Options for field switching.
#[derive(Debug, Clone)]
pub struct SwitchOptions {
    /// Whether to fall back to spatial correspondence when no candidate is
    /// defined on the target itself (default: true).
    pub mapping: bool,

    /// Tolerance passed to the spatial correspondence query.
    pub tolerance: f64,
}

impl Default for SwitchOptions {
    fn default() -> Self {
        Self {
            mapping: true,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl SwitchOptions {
    /// Enable or disable the spatial correspondence fallback.
    pub fn with_mapping(mut self, mapping: bool) -> Self {
        self.mapping = mapping;
        self
    }

    /// Disable the spatial correspondence fallback.
    pub fn exact_only(mut self) -> Self {
        self.mapping = false;
        self
    }

    /// Set the correspondence tolerance.
    ///
    /// Checked by [`SwitchOptions::validate`] when switching.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Check that the tolerance is a finite, non-negative number.
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(FieldError::invalid_param(
                "tolerance",
                self.tolerance,
                "must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate<'a, I: MeshIndex> {
    field: &'a ScalarField<I>,
    source: &'a Geometry<I>,
}

/// Resolves the field of a target geometry from candidate fields.
#[derive(Debug)]
pub struct SwitchScalarField<'a, I: MeshIndex = u32, C: SpatialCorrespondence = BoxOverlap> {
    pool: Vec<Candidate<'a, I>>,
    target: Option<&'a Geometry<I>>,
    options: SwitchOptions,
    correspondence: C,
    result: ScalarField<I>,
}

impl<'a, I: MeshIndex> Default for SwitchScalarField<'a, I, BoxOverlap> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, I: MeshIndex> SwitchScalarField<'a, I, BoxOverlap> {
    /// Create an engine with an empty pool, no target, and default options.
    pub fn new() -> Self {
        Self::with_correspondence(BoxOverlap)
    }
}

impl<'a, I: MeshIndex, C: SpatialCorrespondence> SwitchScalarField<'a, I, C> {
    /// Create an engine using a custom correspondence strategy.
    pub fn with_correspondence(correspondence: C) -> Self {
        Self {
            pool: Vec::new(),
            target: None,
            options: SwitchOptions::default(),
            correspondence,
            result: ScalarField::new(),
        }
    }

    /// Replace the options, builder style.
    pub fn with_options(mut self, options: SwitchOptions) -> Self {
        self.options = options;
        self
    }

    // ==================== Configuration ====================

    /// Current options.
    pub fn options(&self) -> &SwitchOptions {
        &self.options
    }

    /// Replace the options.
    pub fn set_options(&mut self, options: SwitchOptions) {
        self.options = options;
    }

    /// Enable or disable the spatial correspondence fallback.
    pub fn set_mapping(&mut self, mapping: bool) {
        self.options.mapping = mapping;
    }

    /// The target geometry, if set.
    pub fn target(&self) -> Option<&'a Geometry<I>> {
        self.target
    }

    /// Set the geometry to resolve a field for. Clears the previous result.
    pub fn set_target(&mut self, target: &'a Geometry<I>) {
        self.target = Some(target);
        self.result = ScalarField::new();
    }

    // ==================== Registration ====================

    /// Append a candidate defined on `source`.
    ///
    /// Skipped, returning `false`, when the field is bound to a geometry
    /// other than `source`. An unbound field is taken as defined on `source`.
    pub fn add_field(&mut self, field: &'a ScalarField<I>, source: &'a Geometry<I>) -> bool {
        if let Some(bound) = field.geometry() {
            if bound != source.id() {
                debug!(
                    "skipping switch candidate '{}' bound to {:?}, registered on {:?}",
                    field.name(),
                    bound,
                    source.id()
                );
                return false;
            }
        }
        self.pool.push(Candidate { field, source });
        self.result = ScalarField::new();
        true
    }

    /// Append many `(field, source)` candidates in order; returns how many
    /// were accepted.
    pub fn add_fields<T>(&mut self, fields: T) -> usize
    where
        T: IntoIterator<Item = (&'a ScalarField<I>, &'a Geometry<I>)>,
    {
        fields
            .into_iter()
            .map(|(field, source)| self.add_field(field, source))
            .filter(|&accepted| accepted)
            .count()
    }

    /// Number of candidates in the pool.
    pub fn num_candidates(&self) -> usize {
        self.pool.len()
    }

    /// Drop the pool, the target, and the result. Options are kept.
    pub fn clear(&mut self) {
        self.pool.clear();
        self.target = None;
        self.result = ScalarField::new();
    }

    // ==================== Resolution ====================

    /// Resolve the field of the target geometry.
    ///
    /// On success the result is non-empty and bound to the target. On
    /// failure the result is empty and unbound:
    /// - [`FieldError::InvalidParameter`] when the tolerance is negative or
    ///   not finite,
    /// - [`FieldError::NoTarget`] when no target was set,
    /// - [`FieldError::Unresolved`] when no candidate provides any value.
    ///
    /// When mapping, the result takes the name of the last candidate whose
    /// correspondence with the target is non-empty, even if every id it could
    /// write was already taken by an earlier candidate.
    pub fn switch(&mut self) -> Result<()> {
        self.result = ScalarField::new();
        self.options.validate()?;
        let target = self.target.ok_or(FieldError::NoTarget)?;

        if let Some(exact) = self.pool.iter().find(|c| c.source.id() == target.id()) {
            let mut result = exact.field.clone();
            result.bind(target);
            debug!(
                "switch: '{}' is defined on target {:?}",
                result.name(),
                target.id()
            );
            self.result = result;
            return Ok(());
        }

        if self.options.mapping {
            let result = self.map_candidates(target);
            if !result.is_empty() {
                debug!(
                    "switch: mapped {} of {} target vertices",
                    result.len(),
                    target.num_vertices()
                );
                self.result = result;
                return Ok(());
            }
        }

        debug!(
            "switch: no candidate among {} resolves target {:?}",
            self.pool.len(),
            target.id()
        );
        Err(FieldError::Unresolved)
    }

    fn map_candidates(&self, target: &Geometry<I>) -> ScalarField<I> {
        let target_tree = target.bv_tree();
        let mut result = ScalarField::new();

        for candidate in &self.pool {
            let cells = self.correspondence.correspond(
                candidate.source.bv_tree(),
                target_tree,
                self.options.tolerance,
            );
            if cells.is_empty() {
                continue;
            }
            result.set_name(candidate.field.name());

            for cell in cells {
                for &v in target.cell_vertices(cell) {
                    if result.contains(v) {
                        continue;
                    }
                    if let Some(value) = candidate.field.get(v) {
                        result.insert(v, value);
                    }
                }
            }
        }

        if !result.is_empty() {
            result.bind(target);
        }
        result
    }

    // ==================== Results ====================

    /// The resolved field; empty until [`SwitchScalarField::switch`] succeeds.
    pub fn switched_field(&self) -> &ScalarField<I> {
        &self.result
    }

    /// Take the resolved field out of the engine, leaving it empty.
    pub fn take_result(&mut self) -> ScalarField<I> {
        std::mem::take(&mut self.result)
    }
}
