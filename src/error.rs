//! Error types for meshfield.
//!
//! Registration into the engines never fails: malformed input is skipped.
//! The errors below cover geometry construction, switch resolution and I/O.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`FieldError`].
pub type Result<T> = std::result::Result<T, FieldError>;

/// Errors that can occur while building geometries, resolving fields, or loading data.
#[derive(Error, Debug)]
pub enum FieldError {
    /// The geometry has no vertices.
    #[error("geometry has no vertices")]
    EmptyGeometry,

    /// A cell references an invalid vertex index.
    #[error("cell {cell} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The cell index.
        cell: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A cell lists the same vertex more than once.
    #[error("cell {cell} is degenerate (has duplicate vertices)")]
    DegenerateCell {
        /// The cell index.
        cell: usize,
    },

    /// A cell has a vertex count that does not fit the geometry kind.
    #[error("cell {cell} has {size} vertices, which does not match the geometry kind")]
    InvalidCellSize {
        /// The cell index.
        cell: usize,
        /// Number of vertices in the offending cell.
        size: usize,
    },

    /// Switch resolution was requested without a target geometry.
    #[error("no target geometry set for field switch")]
    NoTarget,

    /// No candidate field could populate the target geometry.
    #[error("no candidate field matches the target geometry")]
    Unresolved,

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading a geometry from file.
    #[error("failed to load geometry from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving a geometry to file.
    #[error("failed to save geometry to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// A field file contains a line that is not a number.
    #[error("{path}:{line}: {message}")]
    Parse {
        /// The file path.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// Error message.
        message: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl FieldError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        FieldError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}
