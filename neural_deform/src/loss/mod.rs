//! Loss functions.
//!
//! - [`rotation`]: differentiable closest rotation and the rigidity residual
//! - [`procrustes`]: differentiable similarity alignment
//! - [`regression`]: region-masked L1 terms
//! - [`composer`]: the [`LossComposer`] seam and the three training-mode composers

pub mod composer;
pub mod procrustes;
pub mod regression;
pub mod rotation;

pub use composer::{FullHeadLoss, LossComposer, LossOutput, SimulatorLoss, SurfaceLoss};
pub use procrustes::{procrustes_fit, procrustes_loss, SimilarityFit};
pub use regression::{l1_loss, masked_l1};
pub use rotation::{closest_rotation, deformation_loss, energy_loss, rotation_residual};
