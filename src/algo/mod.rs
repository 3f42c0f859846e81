//! Field composition and geometry manipulation.
//!
//! - **Overlap**: reduce concurrent fields on one geometry into a single field
//!   ([`overlap::OverlapScalarFields`])
//! - **Switch**: pick or map a field for a target geometry from a pool of
//!   candidates ([`switch::SwitchScalarField`])
//! - **Scale**: per-vertex scaling displacements, optionally filtered by a
//!   field ([`scale::ScaleGeometry`])

pub mod overlap;
pub mod scale;
pub mod switch;

pub use overlap::{OverlapMethod, OverlapScalarFields};
pub use scale::{ScaleGeometry, ScaleOptions};
pub use switch::{SwitchOptions, SwitchScalarField};
