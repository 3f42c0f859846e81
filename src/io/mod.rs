//! Geometry and field file I/O.
//!
//! # Supported Formats
//!
//! | Data | Format | Extension | Load | Save |
//! |------|--------|-----------|------|------|
//! | Geometry | STL (binary and ASCII) | `.stl` | ✓ | ✓ |
//! | Scalar field | plain text | any | ✓ | ✓ |
//!
//! Geometry loading dispatches on the file extension:
//!
//! ```no_run
//! use meshfield::io::load;
//! use meshfield::mesh::Geometry;
//!
//! let geo: Geometry = load("part.stl").unwrap();
//! let field = meshfield::io::field::read("pressure.txt", &geo).unwrap();
//! ```

pub mod field;
pub mod stl;

use std::path::Path;

use crate::error::{FieldError, Result};
use crate::mesh::{Geometry, MeshIndex};

/// Supported geometry file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// STL (stereolithography) format.
    Stl,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "stl" => Some(Format::Stl),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

fn detect(path: &Path) -> Result<Format> {
    Format::from_path(path).ok_or_else(|| FieldError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load a geometry with automatic format detection.
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<Geometry<I>> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Stl => stl::load(path),
    }
}

/// Save a geometry with automatic format detection.
pub fn save<P: AsRef<Path>, I: MeshIndex>(geometry: &Geometry<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Stl => stl::save(geometry, path),
    }
}
