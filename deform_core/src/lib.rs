//! # deform_core
//!
//! Host-side geometry for learned deformation fields.
//!
//! Everything here runs on plain `f32`/`f64` values with no tensor backend,
//! so it can be used to prepare data, to check trained networks and as the
//! numerical reference for the differentiable versions in `neural_deform`.
//!
//! ## Modules
//!
//! - [`types`]: Points, actuation matrices and training samples
//! - [`region`]: Per-mode region enumerations
//! - [`rotation`]: Closest proper rotation via SVD
//! - [`procrustes`]: Similarity alignment of corresponding point sets
//! - [`error`]: Error types
//!
//! ## Usage
//!
//! ```ignore
//! use deform_core::prelude::*;
//!
//! let fit = procrustes(&jaw_rest, &jaw_posed)?;
//! println!("jaw residual: {:.4}", fit.residual);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod procrustes;
pub mod region;
pub mod rotation;
pub mod types;

pub use error::CoreError;
pub use procrustes::{procrustes, ProcrustesFit, SimilarityTransform, MIN_PROCRUSTES_POINTS};
pub use region::{regions_from_tags, HeadRegion, RegionMask, SimRegion, SurfaceRegion};
pub use rotation::{closest_rotation, rotation_residual, RotationFactors, ADJOINT_EPSILON};
pub use types::{actuation_to_matrix, matrix_to_actuation, Actuation, Point3, Sample};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::CoreError;
    pub use crate::procrustes::{procrustes, ProcrustesFit, SimilarityTransform};
    pub use crate::region::{HeadRegion, RegionMask, SimRegion, SurfaceRegion};
    pub use crate::rotation::{closest_rotation, rotation_residual, RotationFactors};
    pub use crate::types::{Actuation, Point3, Sample};
}
