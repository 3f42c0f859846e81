//! STL (stereolithography) format support.
//!
//! Loading produces a [`GeometryKind::Surface`] of triangles. Both binary and
//! ASCII files are read; files are written as binary.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use log::debug;
use nalgebra::{Point3, Vector3};

use crate::error::{FieldError, Result};
use crate::mesh::{build_from_triangles, Geometry, GeometryKind, MeshIndex};

/// Load a triangle surface from an STL file.
///
/// Vertices shared by several triangles are merged when their coordinates
/// are identical. Triangles that collapse onto fewer than three distinct
/// vertices are dropped.
///
/// # Example
///
/// ```no_run
/// use meshfield::io::stl;
/// use meshfield::mesh::Geometry;
///
/// let geo: Geometry = stl::load("part.stl").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<Geometry<I>> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let stl = stl_io::read_stl(&mut file).map_err(|e| FieldError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let vertices: Vec<Point3<f64>> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();

    let triangles: Vec<[usize; 3]> = stl
        .faces
        .iter()
        .map(|tri| tri.vertices)
        .filter(|&[a, b, c]| a != b && b != c && a != c)
        .collect();

    if triangles.len() < stl.faces.len() {
        debug!(
            "{}: dropped {} degenerate triangles",
            path.display(),
            stl.faces.len() - triangles.len()
        );
    }

    if triangles.is_empty() {
        return Err(FieldError::LoadError {
            path: path.to_path_buf(),
            message: "STL file contains no valid triangles".to_string(),
        });
    }

    build_from_triangles(&vertices, &triangles)
}

/// Save the triangle cells of a surface to a binary STL file.
///
/// Cells that are not triangles are skipped.
pub fn save<P: AsRef<Path>, I: MeshIndex>(geometry: &Geometry<I>, path: P) -> Result<()> {
    let path = path.as_ref();

    let triangles: Vec<stl_io::Triangle> = geometry
        .cells()
        .filter(|(_, cell)| cell.len() == 3)
        .map(|(_, cell)| {
            let p0 = geometry.position(cell[0]);
            let p1 = geometry.position(cell[1]);
            let p2 = geometry.position(cell[2]);

            let n = (p1 - p0)
                .cross(&(p2 - p0))
                .try_normalize(0.0)
                .unwrap_or_else(Vector3::zeros);

            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [
                    stl_io::Vertex::new([p0.x as f32, p0.y as f32, p0.z as f32]),
                    stl_io::Vertex::new([p1.x as f32, p1.y as f32, p1.z as f32]),
                    stl_io::Vertex::new([p2.x as f32, p2.y as f32, p2.z as f32]),
                ],
            }
        })
        .collect();

    if geometry.kind() != GeometryKind::Surface || triangles.is_empty() {
        return Err(FieldError::SaveError {
            path: path.to_path_buf(),
            message: "geometry has no triangle cells".to_string(),
        });
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    stl_io::write_stl(&mut writer, triangles.iter()).map_err(|e| FieldError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_point_cloud;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("meshfield-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_save_and_load() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let geo: Geometry = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();

        let path = temp_path("square.stl");
        save(&geo, &path).unwrap();
        let loaded: Geometry = load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.kind(), GeometryKind::Surface);
        assert_eq!(loaded.num_cells(), 2);
        assert_eq!(loaded.num_vertices(), 4);
        assert_ne!(loaded.id(), geo.id());

        let bounds = loaded.bounding_box().unwrap();
        assert_eq!(bounds.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.max, Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_save_rejects_point_cloud() {
        let geo: Geometry = build_point_cloud(&[Point3::origin()]).unwrap();
        let path = temp_path("cloud.stl");
        let err = save(&geo, &path).unwrap_err();
        assert!(matches!(err, FieldError::SaveError { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load::<_, u32>(temp_path("missing.stl")).unwrap_err();
        assert!(matches!(err, FieldError::Io(_)));
    }
}
