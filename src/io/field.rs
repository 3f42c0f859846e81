//! Plain-text scalar field files.
//!
//! Reading expects one value per line; the `k`-th value line is vertex `k`.
//! Blank lines and lines starting with `#` are skipped:
//!
//! ```text
//! # pressure
//! 1.0
//! 2.5
//! -0.25
//! ```
//!
//! Writing emits `id value` per line in ascending id order, with the field
//! name as a leading `#` comment when set. Such files are for inspection and
//! are not read back by [`read`].

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;

use crate::error::{FieldError, Result};
use crate::field::ScalarField;
use crate::mesh::{Geometry, MeshIndex, VertexId};

/// Read a field bound to `geometry`.
///
/// The field is named after the file stem. Values past the vertex count of
/// `geometry` are kept; callers that need an exact cover use
/// [`ScalarField::resize`].
pub fn read<P: AsRef<Path>, I: MeshIndex>(
    path: P,
    geometry: &Geometry<I>,
) -> Result<ScalarField<I>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let mut field = ScalarField::bound_to(geometry);
    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        field.set_name(stem);
    }

    let mut next = 0;
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let value: f64 = text.parse().map_err(|e: std::num::ParseFloatError| FieldError::Parse {
            path: path.to_path_buf(),
            line: lineno + 1,
            message: format!("{} ({:?})", e, text),
        })?;
        field.insert(VertexId::new(next), value);
        next += 1;
    }

    if next != geometry.num_vertices() {
        debug!(
            "{}: {} values for {} vertices",
            path.display(),
            next,
            geometry.num_vertices()
        );
    }

    Ok(field)
}

/// Write `field` as `id value` lines.
pub fn write<P: AsRef<Path>, I: MeshIndex>(field: &ScalarField<I>, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    if !field.name().is_empty() {
        writeln!(writer, "# {}", field.name())?;
    }
    for (id, value) in field.iter() {
        writeln!(writer, "{} {}", id.index(), value)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_point_cloud;
    use nalgebra::Point3;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("meshfield-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    fn cloud(n: usize) -> Geometry {
        let points: Vec<Point3<f64>> = (0..n).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
        build_point_cloud(&points).unwrap()
    }

    #[test]
    fn test_read_skips_comments_and_blanks() {
        let geo = cloud(3);
        let path = temp_path("pressure.txt");
        std::fs::write(&path, "# header\n1.5\n\n  -2\n# mid\n3e1\n").unwrap();
        let field = read(&path, &geo).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(field.is_bound_to(&geo));
        assert_eq!(field.name(), "pressure");
        assert_eq!(field.to_dense(3, 0.0), vec![1.5, -2.0, 30.0]);
    }

    #[test]
    fn test_read_reports_line() {
        let geo = cloud(2);
        let path = temp_path("broken.txt");
        std::fs::write(&path, "1.0\n\nabc\n").unwrap();
        let err = read(&path, &geo).unwrap_err();
        std::fs::remove_file(&path).ok();

        match err {
            FieldError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_write_is_ordered() {
        let mut field = ScalarField::<u32>::new().with_name("out");
        field.insert(VertexId::new(2), 0.5);
        field.insert(VertexId::new(0), 4.0);

        let path = temp_path("out.txt");
        write(&field, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(text, "# out\n0 4\n2 0.5\n");
    }
}
