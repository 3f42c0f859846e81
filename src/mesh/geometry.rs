//! Geometry storage for field composition.
//!
//! A [`Geometry`] is a flat cell list over a vertex array. It carries only
//! what the field engines consume: enumerable vertex ids, coordinates, the
//! vertices incident to each cell, and a lazily built bounding-volume tree.
//!
//! Identity is carried by a [`GeometryId`] allocated at construction. Two
//! geometries are "the same" only when their ids are equal; cloning a
//! geometry allocates a fresh id, since the clone is a different object.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use nalgebra::{Point3, Vector3};

use super::bvtree::{Aabb, BvTree, BvTreeOptions};
use super::index::{CellId, MeshIndex, VertexId};

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

/// Stable handle identifying one geometry object.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct GeometryId(u64);

impl GeometryId {
    fn fresh() -> Self {
        Self(NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw handle value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for GeometryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G({})", self.0)
    }
}

impl fmt::Display for GeometryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of cells a geometry is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    /// Unconnected points; every vertex is its own one-vertex cell.
    PointCloud,
    /// Polyline made of two-vertex segments.
    Curve,
    /// Polygonal surface (triangles, quads, or larger polygons).
    Surface,
}

impl GeometryKind {
    /// Whether a cell with `size` vertices is allowed for this kind.
    pub fn accepts_cell_size(self, size: usize) -> bool {
        match self {
            GeometryKind::PointCloud => size == 1,
            GeometryKind::Curve => size == 2,
            GeometryKind::Surface => size >= 3,
        }
    }
}

/// A discrete geometry: vertex positions plus cell connectivity.
///
/// Cells are stored in compressed form: `cell_offsets[c]..cell_offsets[c + 1]`
/// is the range of `cell_vertices` incident to cell `c`.
#[derive(Debug)]
pub struct Geometry<I: MeshIndex = u32> {
    id: GeometryId,
    kind: GeometryKind,
    pub(crate) positions: Vec<Point3<f64>>,
    pub(crate) cell_offsets: Vec<usize>,
    pub(crate) cell_vertices: Vec<VertexId<I>>,
    tree_options: BvTreeOptions,
    tree: OnceLock<BvTree<I>>,
}

impl<I: MeshIndex> Default for Geometry<I> {
    fn default() -> Self {
        Self::new(GeometryKind::PointCloud)
    }
}

impl<I: MeshIndex> Clone for Geometry<I> {
    fn clone(&self) -> Self {
        Self {
            id: GeometryId::fresh(),
            kind: self.kind,
            positions: self.positions.clone(),
            cell_offsets: self.cell_offsets.clone(),
            cell_vertices: self.cell_vertices.clone(),
            tree_options: self.tree_options.clone(),
            tree: OnceLock::new(),
        }
    }
}

impl<I: MeshIndex> Geometry<I> {
    /// Create an empty geometry of the given kind.
    pub fn new(kind: GeometryKind) -> Self {
        Self {
            id: GeometryId::fresh(),
            kind,
            positions: Vec::new(),
            cell_offsets: vec![0],
            cell_vertices: Vec::new(),
            tree_options: BvTreeOptions::default(),
            tree: OnceLock::new(),
        }
    }

    /// Set the options used when the bounding-volume tree is (re)built.
    pub fn with_tree_options(mut self, options: BvTreeOptions) -> Self {
        self.tree_options = options;
        self.tree = OnceLock::new();
        self
    }

    // ==================== Accessors ====================

    /// The identity handle of this geometry.
    #[inline]
    pub fn id(&self) -> GeometryId {
        self.id
    }

    /// The kind of cells this geometry holds.
    #[inline]
    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Number of cells.
    #[inline]
    pub fn num_cells(&self) -> usize {
        self.cell_offsets.len() - 1
    }

    /// A geometry without vertices is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.positions[v.index()]
    }

    /// All vertex positions, indexed by vertex id.
    #[inline]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Move a vertex. Drops the cached bounding-volume tree.
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) {
        self.positions[v.index()] = pos;
        self.invalidate_tree();
    }

    /// Translate every vertex by the matching offset.
    ///
    /// Offsets beyond the vertex count are ignored; missing ones leave the
    /// vertex in place.
    pub fn displace(&mut self, offsets: &[Vector3<f64>]) {
        for (p, d) in self.positions.iter_mut().zip(offsets) {
            *p += d;
        }
        self.invalidate_tree();
    }

    /// Vertices incident to a cell, in cell order.
    #[inline]
    pub fn cell_vertices(&self, c: CellId<I>) -> &[VertexId<I>] {
        let i = c.index();
        &self.cell_vertices[self.cell_offsets[i]..self.cell_offsets[i + 1]]
    }

    // ==================== Iteration ====================

    /// Iterate over all vertex ids, `0..num_vertices`.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        (0..self.positions.len()).map(VertexId::new)
    }

    /// Iterate over all cell ids.
    pub fn cell_ids(&self) -> impl Iterator<Item = CellId<I>> + '_ {
        (0..self.num_cells()).map(CellId::new)
    }

    /// Iterate over cells with their incident vertices.
    pub fn cells(&self) -> impl Iterator<Item = (CellId<I>, &[VertexId<I>])> + '_ {
        self.cell_ids().map(move |c| (c, self.cell_vertices(c)))
    }

    // ==================== Geometry ====================

    /// Axis-aligned bounds of one cell.
    pub fn cell_bounds(&self, c: CellId<I>) -> Aabb {
        Aabb::from_points(self.cell_vertices(c).iter().map(|&v| self.position(v)))
            .unwrap_or_else(Aabb::empty)
    }

    /// Axis-aligned bounds of all vertices, `None` when empty.
    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter())
    }

    /// Mean of the vertex positions, `None` when empty.
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.positions.is_empty() {
            return None;
        }
        let sum: Vector3<f64> = self.positions.iter().map(|p| p.coords).sum();
        Some(Point3::from(sum / self.positions.len() as f64))
    }

    // ==================== Spatial index ====================

    /// The bounding-volume tree over this geometry's cells, built on first use.
    pub fn bv_tree(&self) -> &BvTree<I> {
        self.tree
            .get_or_init(|| BvTree::build(self, &self.tree_options))
    }

    /// Whether the tree has been built since the last geometry change.
    pub fn has_tree(&self) -> bool {
        self.tree.get().is_some()
    }

    /// Drop the cached tree; the next [`Geometry::bv_tree`] call rebuilds it.
    pub fn invalidate_tree(&mut self) {
        self.tree = OnceLock::new();
    }

    // ==================== Construction ====================

    /// Append a vertex and return its id. Point clouds also get a matching cell.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        let id = VertexId::new(self.positions.len());
        self.positions.push(position);
        if self.kind == GeometryKind::PointCloud {
            self.push_cell_unchecked(&[id]);
        }
        self.invalidate_tree();
        id
    }

    pub(crate) fn push_cell_unchecked(&mut self, vertices: &[VertexId<I>]) -> CellId<I> {
        let id = CellId::new(self.num_cells());
        self.cell_vertices.extend_from_slice(vertices);
        self.cell_offsets.push(self.cell_vertices.len());
        id
    }
}
