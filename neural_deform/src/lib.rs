//! # neural_deform
//!
//! Physics-regularised coordinate networks for deformation fields, trained
//! with Burn.
//!
//! A sine-activated MLP maps a 3D point to a displacement. Training combines
//! per-region supervision with regularizers built on the network's
//! per-sample Jacobian: the distance of each Jacobian (or Jacobian times an
//! actuation) from the closest proper rotation.
//!
//! ## Features
//!
//! - **Coordinate network**: SIREN-style MLP with optional Fourier encoding
//!   and sigmoid rescale
//! - **Per-sample Jacobian**: forward-mode tangents that stay in the autodiff graph
//! - **Closest rotation**: host SVD with an exact adjoint for gradients
//! - **Loss composers**: surface, full-head and simulator modes
//! - **Training**: epoch loop over any [`data::Dataset`], checkpoints, evaluation
//!
//! ## Quick Start
//!
//! ```ignore
//! use burn::backend::{Autodiff, NdArray};
//! use neural_deform::prelude::*;
//!
//! type MyBackend = Autodiff<NdArray>;
//!
//! let device = Default::default();
//! let config = TrainingConfig::default();
//! let composer = config.full_head_loss.init();
//! let mut trainer = AdamTrainer::<MyBackend, _>::with_adam(config, composer, device)?;
//!
//! let mut dataset = InMemoryDataset::new(samples)?.with_shuffle(42);
//! let reports = trainer.fit(&mut dataset)?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! deform_core (host math: regions, samples, SVD, Procrustes)
//!     │
//!     ▼
//! neural_deform
//!     nn ──► loss ──► training
//!      │              │
//!      └──── data ────┘
//! ```
//!
//! ## Feature Flags
//!
//! - `ndarray` (default): CPU backend
//! - `wgpu`: GPU backend via WebGPU

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod data;
pub mod error;
pub mod eval;
pub mod loss;
pub mod nn;
pub mod training;

pub use config::{
    CoordinateNetworkConfig, FullHeadLossConfig, SimulatorLossConfig, SurfaceLossConfig,
    TrainingConfig, TrainingMode,
};
pub use error::{DeformError, Result};
pub use nn::CoordinateNetwork;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::*;
    pub use crate::data::{Batch, Dataset, InMemoryDataset};
    pub use crate::error::{DeformError, Result};
    pub use crate::eval::{evaluate, EvaluationReport, RegionReport};
    pub use crate::loss::{FullHeadLoss, LossComposer, LossOutput, SimulatorLoss, SurfaceLoss};
    pub use crate::nn::{CoordinateInput, CoordinateNetwork};
    pub use crate::training::{
        checkpoint_exists, load_checkpoint, save_checkpoint, AdamTrainer, CheckpointMetadata,
        EpochReport, Trainer,
    };
    pub use deform_core::prelude::*;
}
