//! Bounding-volume tree over geometry cells and cross-mesh correspondence.
//!
//! [`BvTree`] is an axis-aligned bounding-box hierarchy built top-down: each
//! node splits its cells at the median centroid along the longest axis of
//! the centroid bounds, until a node holds at most `max_leaf_size` cells.
//!
//! [`SpatialCorrespondence`] answers the question the switch engine asks:
//! which cells of a target geometry coincide with a source geometry, within
//! a tolerance. [`BoxOverlap`] answers it with a simultaneous descent of the
//! two trees, comparing cell boxes at the leaves.
//!
//! # Example
//!
//! ```
//! use meshfield::mesh::{build_from_triangles, BoxOverlap, Geometry, SpatialCorrespondence};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let source: Geometry = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//! let target: Geometry = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//!
//! let cells = BoxOverlap.correspond(source.bv_tree(), target.bv_tree(), 1e-8);
//! assert_eq!(cells.len(), 1);
//! ```

use nalgebra::Point3;
use rayon::prelude::*;

use super::geometry::Geometry;
use super::index::{CellId, MeshIndex};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl Aabb {
    /// Box spanning two corners.
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// The empty box: merging anything into it yields that thing.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Smallest box containing all points, `None` for no points.
    pub fn from_points<'p>(points: impl IntoIterator<Item = &'p Point3<f64>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bb = Self::new(first, first);
        for p in iter {
            bb.grow(p);
        }
        Some(bb)
    }

    /// Whether the box contains nothing.
    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    /// Extend to contain `p`.
    pub fn grow(&mut self, p: &Point3<f64>) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    /// Smallest box containing both boxes.
    pub fn merge(&self, other: &Aabb) -> Aabb {
        let mut out = *self;
        for i in 0..3 {
            out.min[i] = out.min[i].min(other.min[i]);
            out.max[i] = out.max[i].max(other.max[i]);
        }
        out
    }

    /// Center point.
    pub fn center(&self) -> Point3<f64> {
        Point3::from((self.min.coords + self.max.coords) * 0.5)
    }

    /// Index (0, 1, 2) of the axis with the largest extent.
    pub fn longest_axis(&self) -> usize {
        let d = self.max - self.min;
        if d.x >= d.y && d.x >= d.z {
            0
        } else if d.y >= d.z {
            1
        } else {
            2
        }
    }

    /// Whether the boxes overlap once one of them is inflated by `tol`.
    /// Touching boxes intersect.
    #[inline]
    pub fn intersects(&self, other: &Aabb, tol: f64) -> bool {
        (0..3).all(|i| self.min[i] - tol <= other.max[i] && other.min[i] - tol <= self.max[i])
    }

    /// Whether `p` lies inside the box inflated by `tol`.
    pub fn contains_point(&self, p: &Point3<f64>, tol: f64) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] - tol && p[i] <= self.max[i] + tol)
    }
}

/// Options for bounding-volume tree construction.
#[derive(Debug, Clone)]
pub struct BvTreeOptions {
    /// Maximum number of cells stored in a leaf.
    pub max_leaf_size: usize,

    /// Whether to compute cell boxes in parallel (default: true).
    pub parallel: bool,
}

impl Default for BvTreeOptions {
    fn default() -> Self {
        Self {
            max_leaf_size: 4,
            parallel: true,
        }
    }
}

impl BvTreeOptions {
    /// Set the maximum leaf size (at least 1).
    pub fn with_max_leaf_size(mut self, max_leaf_size: usize) -> Self {
        self.max_leaf_size = max_leaf_size.max(1);
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    /// Range into the tree's cell order.
    Leaf { start: usize, end: usize },
    Inner { left: usize, right: usize },
}

#[derive(Debug, Clone)]
struct Node {
    bounds: Aabb,
    kind: NodeKind,
}

/// Bounding-box hierarchy over the cells of one geometry.
#[derive(Debug, Clone)]
pub struct BvTree<I: MeshIndex = u32> {
    nodes: Vec<Node>,
    /// Cells permuted so every leaf owns a contiguous range.
    order: Vec<CellId<I>>,
    /// Box of each cell, indexed by cell id.
    cell_bounds: Vec<Aabb>,
}

impl<I: MeshIndex> BvTree<I> {
    /// Build a tree over all cells of `geometry`.
    pub fn build(geometry: &Geometry<I>, options: &BvTreeOptions) -> Self {
        let num_cells = geometry.num_cells();

        let cell_bounds: Vec<Aabb> = if options.parallel {
            (0..num_cells)
                .into_par_iter()
                .map(|c| geometry.cell_bounds(CellId::new(c)))
                .collect()
        } else {
            (0..num_cells)
                .map(|c| geometry.cell_bounds(CellId::new(c)))
                .collect()
        };

        let mut order: Vec<CellId<I>> = (0..num_cells).map(CellId::new).collect();
        let mut nodes = Vec::with_capacity(2 * num_cells / options.max_leaf_size.max(1) + 1);

        if num_cells > 0 {
            build_node(
                &mut nodes,
                &mut order,
                0,
                &cell_bounds,
                options.max_leaf_size.max(1),
            );
        }

        Self {
            nodes,
            order,
            cell_bounds,
        }
    }

    /// Number of cells indexed.
    #[inline]
    pub fn num_cells(&self) -> usize {
        self.cell_bounds.len()
    }

    /// Whether the tree indexes no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes (inner and leaf).
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Bounds of the whole tree.
    pub fn bounds(&self) -> Option<Aabb> {
        self.nodes.first().map(|n| n.bounds)
    }

    /// Box of one cell.
    #[inline]
    pub fn cell_bounds(&self, c: CellId<I>) -> &Aabb {
        &self.cell_bounds[c.index()]
    }

    /// Depth of the deepest leaf (a single leaf has depth 1, empty tree 0).
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 1usize)];
        while let Some((n, d)) = stack.pop() {
            match self.nodes[n].kind {
                NodeKind::Leaf { .. } => max_depth = max_depth.max(d),
                NodeKind::Inner { left, right } => {
                    stack.push((left, d + 1));
                    stack.push((right, d + 1));
                }
            }
        }
        max_depth
    }

    /// Cells whose box intersects `query` inflated by `tol`, in ascending order.
    pub fn query(&self, query: &Aabb, tol: f64) -> Vec<CellId<I>> {
        let mut hits = Vec::new();
        if self.nodes.is_empty() {
            return hits;
        }

        let mut stack = vec![0usize];
        while let Some(n) = stack.pop() {
            let node = &self.nodes[n];
            if !node.bounds.intersects(query, tol) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { start, end } => {
                    hits.extend(
                        self.order[start..end]
                            .iter()
                            .copied()
                            .filter(|&c| self.cell_bounds[c.index()].intersects(query, tol)),
                    );
                }
                NodeKind::Inner { left, right } => {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }

        hits.sort_unstable();
        hits
    }

    fn leaf_cells(&self, n: usize) -> &[CellId<I>] {
        match self.nodes[n].kind {
            NodeKind::Leaf { start, end } => &self.order[start..end],
            NodeKind::Inner { .. } => &[],
        }
    }
}

/// Recursively build the subtree for `order` (which starts at `offset` in
/// the full order) and return its node index.
fn build_node<I: MeshIndex>(
    nodes: &mut Vec<Node>,
    order: &mut [CellId<I>],
    offset: usize,
    cell_bounds: &[Aabb],
    max_leaf_size: usize,
) -> usize {
    let bounds = order
        .iter()
        .fold(Aabb::empty(), |acc, c| acc.merge(&cell_bounds[c.index()]));

    let index = nodes.len();
    nodes.push(Node {
        bounds,
        kind: NodeKind::Leaf {
            start: offset,
            end: offset + order.len(),
        },
    });

    if order.len() <= max_leaf_size {
        return index;
    }

    // Split on the centroid spread, not the box, so large cells don't skew it.
    let mut centroid_bounds = Aabb::empty();
    for c in order.iter() {
        centroid_bounds.grow(&cell_bounds[c.index()].center());
    }
    let axis = centroid_bounds.longest_axis();
    let mid = order.len() / 2;
    order.select_nth_unstable_by(mid, |a, b| {
        let ca = cell_bounds[a.index()].center()[axis];
        let cb = cell_bounds[b.index()].center()[axis];
        ca.total_cmp(&cb)
    });

    let (lo, hi) = order.split_at_mut(mid);
    let left = build_node(nodes, lo, offset, cell_bounds, max_leaf_size);
    let right = build_node(nodes, hi, offset + mid, cell_bounds, max_leaf_size);
    nodes[index].kind = NodeKind::Inner { left, right };

    index
}

/// Cross-mesh spatial matching between two bounding-volume trees.
pub trait SpatialCorrespondence {
    /// Target cells that spatially coincide with the source geometry within
    /// `tolerance`.
    ///
    /// Implementations must be deterministic for fixed inputs. The returned
    /// ids are sorted and unique; an empty result is not an error.
    fn correspond<I: MeshIndex>(
        &self,
        source: &BvTree<I>,
        target: &BvTree<I>,
        tolerance: f64,
    ) -> Vec<CellId<I>>;
}

/// Box-level correspondence: a target cell matches when its box, inflated
/// by the tolerance, intersects the box of at least one source cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxOverlap;

impl SpatialCorrespondence for BoxOverlap {
    fn correspond<I: MeshIndex>(
        &self,
        source: &BvTree<I>,
        target: &BvTree<I>,
        tolerance: f64,
    ) -> Vec<CellId<I>> {
        if source.is_empty() || target.is_empty() {
            return Vec::new();
        }

        let mut matched = vec![false; target.num_cells()];
        let mut stack = vec![(0usize, 0usize)];

        while let Some((s, t)) = stack.pop() {
            let s_node = &source.nodes[s];
            let t_node = &target.nodes[t];
            if !t_node.bounds.intersects(&s_node.bounds, tolerance) {
                continue;
            }

            match (&s_node.kind, &t_node.kind) {
                (NodeKind::Leaf { .. }, NodeKind::Leaf { .. }) => {
                    for &tc in target.leaf_cells(t) {
                        if matched[tc.index()] {
                            continue;
                        }
                        let t_box = target.cell_bounds(tc);
                        if source
                            .leaf_cells(s)
                            .iter()
                            .any(|&sc| t_box.intersects(source.cell_bounds(sc), tolerance))
                        {
                            matched[tc.index()] = true;
                        }
                    }
                }
                (NodeKind::Leaf { .. }, &NodeKind::Inner { left, right }) => {
                    stack.push((s, left));
                    stack.push((s, right));
                }
                (&NodeKind::Inner { left, right }, NodeKind::Leaf { .. }) => {
                    stack.push((left, t));
                    stack.push((right, t));
                }
                (
                    &NodeKind::Inner {
                        left: sl,
                        right: sr,
                    },
                    &NodeKind::Inner {
                        left: tl,
                        right: tr,
                    },
                ) => {
                    stack.push((sl, tl));
                    stack.push((sl, tr));
                    stack.push((sr, tl));
                    stack.push((sr, tr));
                }
            }
        }

        matched
            .iter()
            .enumerate()
            .filter_map(|(i, &m)| m.then(|| CellId::new(i)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_triangles, build_point_cloud};

    /// An `n` x `n` grid of unit quads split into triangles, shifted along x.
    fn create_grid(n: usize, x_offset: f64) -> Geometry {
        let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
        let mut faces = Vec::with_capacity(n * n * 2);

        for j in 0..=n {
            for i in 0..=n {
                vertices.push(Point3::new(i as f64 + x_offset, j as f64, 0.0));
            }
        }

        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i;
                let v10 = v00 + 1;
                let v01 = v00 + (n + 1);
                let v11 = v01 + 1;

                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }

        build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_aabb_intersects_with_tolerance() {
        let a = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Point3::new(1.5, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        assert!(!a.intersects(&b, 0.1));
        assert!(a.intersects(&b, 0.5));

        let touching = Aabb::new(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        assert!(a.intersects(&touching, 0.0));
    }

    #[test]
    fn test_aabb_merge_and_empty() {
        let empty = Aabb::empty();
        assert!(empty.is_empty());

        let a = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        assert_eq!(empty.merge(&a), a);
        assert_eq!(a.longest_axis(), 0);
        assert!(a.contains_point(&Point3::new(1.05, 0.5, 0.5), 0.1));
    }

    #[test]
    fn test_tree_covers_all_cells() {
        let geo = create_grid(6, 0.0);
        let tree = BvTree::build(&geo, &BvTreeOptions::default().with_max_leaf_size(2));

        assert_eq!(tree.num_cells(), geo.num_cells());
        assert!(tree.depth() > 1);

        let all = tree.query(&tree.bounds().unwrap(), 0.0);
        assert_eq!(all.len(), geo.num_cells());
    }

    #[test]
    fn test_parallel_and_sequential_build_agree() {
        let geo = create_grid(5, 0.0);
        let par = BvTree::build(&geo, &BvTreeOptions::default());
        let seq = BvTree::build(&geo, &BvTreeOptions::default().sequential());

        let probe = Aabb::new(Point3::new(1.2, 1.2, -1.0), Point3::new(2.8, 2.1, 1.0));
        assert_eq!(par.query(&probe, 0.0), seq.query(&probe, 0.0));
    }

    #[test]
    fn test_query_matches_brute_force() {
        let geo = create_grid(8, 0.0);
        let tree = geo.bv_tree();
        let probe = Aabb::new(Point3::new(2.5, 3.5, -1.0), Point3::new(4.2, 3.9, 1.0));

        let expected: Vec<CellId> = geo
            .cell_ids()
            .filter(|&c| geo.cell_bounds(c).intersects(&probe, 0.0))
            .collect();
        assert_eq!(tree.query(&probe, 0.0), expected);
    }

    #[test]
    fn test_correspondence_identical_meshes() {
        let source = create_grid(4, 0.0);
        let target = create_grid(4, 0.0);

        let cells = BoxOverlap.correspond(source.bv_tree(), target.bv_tree(), 1e-8);
        assert_eq!(cells.len(), target.num_cells());
    }

    #[test]
    fn test_correspondence_disjoint_meshes() {
        let source = create_grid(3, 0.0);
        let target = create_grid(3, 10.0);

        let cells = BoxOverlap.correspond(source.bv_tree(), target.bv_tree(), 1e-8);
        assert!(cells.is_empty());
    }

    #[test]
    fn test_correspondence_honors_tolerance() {
        let source = create_grid(2, 0.0);
        // Gap of 0.5 between source (x <= 2) and target (x >= 2.5).
        let target = create_grid(2, 2.5);

        let tight = BoxOverlap.correspond(source.bv_tree(), target.bv_tree(), 1e-8);
        assert!(tight.is_empty());

        let loose = BoxOverlap.correspond(source.bv_tree(), target.bv_tree(), 0.6);
        assert!(!loose.is_empty());
        assert!(loose.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_correspondence_matches_brute_force() {
        let source = create_grid(3, 0.0);
        let target = create_grid(6, 1.5);
        let tol = 1e-8;

        let expected: Vec<CellId> = target
            .cell_ids()
            .filter(|&tc| {
                let tb = target.cell_bounds(tc);
                source
                    .cell_ids()
                    .any(|sc| tb.intersects(&source.cell_bounds(sc), tol))
            })
            .collect();

        let cells = BoxOverlap.correspond(source.bv_tree(), target.bv_tree(), tol);
        assert_eq!(cells, expected);
    }

    #[test]
    fn test_point_cloud_tree() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
        ];
        let cloud: Geometry = build_point_cloud(&points).unwrap();
        let probe = Aabb::new(Point3::new(4.0, -1.0, -1.0), Point3::new(6.0, 1.0, 1.0));
        assert_eq!(cloud.bv_tree().query(&probe, 0.0), vec![CellId::new(1)]);
    }
}
