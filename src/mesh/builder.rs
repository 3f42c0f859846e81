//! Geometry construction utilities.
//!
//! Geometries are built from a vertex array and a cell list, the way mesh
//! file formats store them. All builders validate the connectivity before
//! allocating the geometry.

use nalgebra::Point3;

use super::geometry::{Geometry, GeometryKind};
use super::index::{MeshIndex, VertexId};
use crate::error::{FieldError, Result};

/// Build a geometry from vertices and arbitrary cells.
///
/// Every cell must reference existing vertices, must not repeat a vertex,
/// and must have a size accepted by `kind`. A point cloud ignores `cells`
/// and gets one cell per vertex.
///
/// # Example
/// ```
/// use meshfield::mesh::{build_from_cells, Geometry, GeometryKind};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let cells = vec![vec![0, 1, 2, 3]];
///
/// let geo: Geometry = build_from_cells(GeometryKind::Surface, &vertices, &cells).unwrap();
/// assert_eq!(geo.num_cells(), 1);
/// ```
pub fn build_from_cells<I: MeshIndex, C: AsRef<[usize]>>(
    kind: GeometryKind,
    vertices: &[Point3<f64>],
    cells: &[C],
) -> Result<Geometry<I>> {
    if vertices.is_empty() {
        return Err(FieldError::EmptyGeometry);
    }
    if vertices.len() - 1 > I::MAX.to_usize() {
        return Err(FieldError::invalid_param(
            "vertices",
            vertices.len(),
            "too many for the index type",
        ));
    }

    let mut geometry = Geometry::new(kind);
    geometry.positions.reserve(vertices.len());

    if kind == GeometryKind::PointCloud {
        for &p in vertices {
            geometry.add_vertex(p);
        }
        return Ok(geometry);
    }

    if cells.is_empty() {
        return Err(FieldError::EmptyGeometry);
    }

    for (ci, cell) in cells.iter().enumerate() {
        validate_cell(kind, ci, cell.as_ref(), vertices.len())?;
    }

    geometry.positions.extend_from_slice(vertices);
    let mut ids: Vec<VertexId<I>> = Vec::with_capacity(8);
    for cell in cells {
        ids.clear();
        ids.extend(cell.as_ref().iter().map(|&v| VertexId::new(v)));
        geometry.push_cell_unchecked(&ids);
    }

    Ok(geometry)
}

fn validate_cell(kind: GeometryKind, ci: usize, cell: &[usize], num_vertices: usize) -> Result<()> {
    if !kind.accepts_cell_size(cell.len()) {
        return Err(FieldError::InvalidCellSize {
            cell: ci,
            size: cell.len(),
        });
    }
    for (k, &vi) in cell.iter().enumerate() {
        if vi >= num_vertices {
            return Err(FieldError::InvalidVertexIndex {
                cell: ci,
                vertex: vi,
            });
        }
        if cell[..k].contains(&vi) {
            return Err(FieldError::DegenerateCell { cell: ci });
        }
    }
    Ok(())
}

/// Build a surface geometry from triangles.
///
/// # Example
/// ```
/// use meshfield::mesh::{build_from_triangles, Geometry};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let geo: Geometry = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
/// assert_eq!(geo.num_vertices(), 3);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<Geometry<I>> {
    build_from_cells(GeometryKind::Surface, vertices, faces)
}

/// Build a surface geometry from quads (counter-clockwise vertex order).
pub fn build_from_quads<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 4]],
) -> Result<Geometry<I>> {
    build_from_cells(GeometryKind::Surface, vertices, faces)
}

/// Build a curve geometry from segments.
pub fn build_from_segments<I: MeshIndex>(
    vertices: &[Point3<f64>],
    segments: &[[usize; 2]],
) -> Result<Geometry<I>> {
    build_from_cells(GeometryKind::Curve, vertices, segments)
}

/// Build a point cloud; every vertex becomes a one-vertex cell.
pub fn build_point_cloud<I: MeshIndex>(vertices: &[Point3<f64>]) -> Result<Geometry<I>> {
    build_from_cells::<I, [usize; 1]>(GeometryKind::PointCloud, vertices, &[])
}
