//! Loss composition per training mode.
//!
//! A composer partitions a batch by region, applies each region's term and a
//! Jacobian regularizer, and sums the weighted terms. Terms for regions that
//! are absent or too small contribute a zero tensor so the total keeps the
//! same structure from batch to batch.

use burn::prelude::*;
use deform_core::{HeadRegion, RegionMask, SimRegion, SurfaceRegion};

use super::procrustes::procrustes_loss;
use super::regression::masked_l1;
use super::rotation::{deformation_loss, energy_loss};
use crate::config::{FullHeadLossConfig, SimulatorLossConfig, SurfaceLossConfig};
use crate::data::{select_rows, Batch};
use crate::error::{DeformError, Result};
use crate::nn::CoordinateNetwork;

/// Total loss plus its weighted terms.
#[derive(Debug, Clone)]
pub struct LossOutput<B: Backend> {
    /// Sum of all terms `[1]`.
    pub total: Tensor<B, 1>,
    /// Named, already weighted terms.
    pub terms: Vec<(&'static str, Tensor<B, 1>)>,
}

impl<B: Backend> LossOutput<B> {
    /// Sum weighted terms into a total.
    pub fn from_terms(terms: Vec<(&'static str, Tensor<B, 1>)>, device: &B::Device) -> Self {
        let total = terms
            .iter()
            .fold(Tensor::zeros([1], device), |acc, (_, t)| acc + t.clone());
        Self { total, terms }
    }

    /// Look up a term by name.
    pub fn term(&self, name: &str) -> Option<&Tensor<B, 1>> {
        self.terms.iter().find(|(n, _)| *n == name).map(|(_, t)| t)
    }
}

/// Turns a network's prediction and Jacobian on a batch into a scalar loss.
pub trait LossComposer<B: Backend> {
    /// Region enumeration of the batches this composer accepts.
    type Region: RegionMask;

    /// Whether batches must carry actuation matrices.
    fn uses_actuations(&self) -> bool {
        false
    }

    /// Compose the loss from a prediction `[N, 3]` and Jacobian `[N, 3, 3]`.
    fn compose(
        &self,
        prediction: Tensor<B, 2>,
        jacobian: Tensor<B, 3>,
        batch: &Batch<B, Self::Region>,
    ) -> Result<LossOutput<B>>;

    /// Forward pass, Jacobian and loss for one batch.
    fn process_batch(
        &self,
        network: &CoordinateNetwork<B>,
        batch: &Batch<B, Self::Region>,
    ) -> Result<LossOutput<B>> {
        batch.check_actuations(self.uses_actuations())?;
        let (prediction, jacobian) = network.forward_with_jacobian(batch.inputs.clone());
        if prediction.dims() != batch.targets.dims() {
            return Err(DeformError::shape(batch.targets.dims(), prediction.dims()));
        }
        self.compose(prediction, jacobian, batch)
    }
}

fn region_l1<B: Backend, R: RegionMask>(
    prediction: &Tensor<B, 2>,
    batch: &Batch<B, R>,
    region: R,
    weight: f32,
) -> Tensor<B, 1> {
    let indices = batch.indices(region);
    if indices.is_empty() {
        log::debug!("no {} samples in batch, term is zero", region.name());
    }
    masked_l1(prediction.clone(), batch.targets.clone(), &indices).mul_scalar(weight)
}

/// Face-model and boundary supervision with a deformation regularizer.
#[derive(Debug, Clone)]
pub struct SurfaceLoss {
    config: SurfaceLossConfig,
}

impl SurfaceLoss {
    /// Create a composer with the given weights.
    pub fn new(config: SurfaceLossConfig) -> Self {
        Self { config }
    }

    /// The weights in use.
    pub fn config(&self) -> &SurfaceLossConfig {
        &self.config
    }
}

impl<B: Backend> LossComposer<B> for SurfaceLoss {
    type Region = SurfaceRegion;

    fn compose(
        &self,
        prediction: Tensor<B, 2>,
        jacobian: Tensor<B, 3>,
        batch: &Batch<B, SurfaceRegion>,
    ) -> Result<LossOutput<B>> {
        let device = prediction.device();
        let c = &self.config;

        let terms = vec![
            ("flame", region_l1(&prediction, batch, SurfaceRegion::Flame, c.w_flame)),
            ("boundary", region_l1(&prediction, batch, SurfaceRegion::Boundary, c.w_boundary)),
            ("deformation", deformation_loss(jacobian)?.mul_scalar(c.w_deformation)),
        ];
        Ok(LossOutput::from_terms(terms, &device))
    }
}

/// Skull, jaw and skin supervision with a deformation regularizer.
///
/// The jaw is matched up to a similarity transform, and only when the batch
/// holds at least `min_jaw_points` jaw samples.
#[derive(Debug, Clone)]
pub struct FullHeadLoss {
    config: FullHeadLossConfig,
}

impl FullHeadLoss {
    /// Create a composer with the given weights.
    pub fn new(config: FullHeadLossConfig) -> Self {
        Self { config }
    }

    /// The weights in use.
    pub fn config(&self) -> &FullHeadLossConfig {
        &self.config
    }
}

impl<B: Backend> LossComposer<B> for FullHeadLoss {
    type Region = HeadRegion;

    fn compose(
        &self,
        prediction: Tensor<B, 2>,
        jacobian: Tensor<B, 3>,
        batch: &Batch<B, HeadRegion>,
    ) -> Result<LossOutput<B>> {
        let device = prediction.device();
        let c = &self.config;

        let jaw_indices = batch.indices(HeadRegion::Jaw);
        let jaw = if jaw_indices.len() >= c.min_jaw_points.max(deform_core::MIN_PROCRUSTES_POINTS) {
            procrustes_loss(
                select_rows(prediction.clone(), &jaw_indices),
                select_rows(batch.targets.clone(), &jaw_indices),
            )?
            .mul_scalar(c.w_jaw)
        } else {
            log::debug!(
                "{} jaw samples in batch, skipping alignment term",
                jaw_indices.len()
            );
            Tensor::zeros([1], &device)
        };

        let terms = vec![
            ("surface", region_l1(&prediction, batch, HeadRegion::Surface, c.w_surface)),
            ("skull", region_l1(&prediction, batch, HeadRegion::Skull, c.w_skull)),
            ("jaw", jaw),
            ("deformation", deformation_loss(jacobian)?.mul_scalar(c.w_deformation)),
        ];
        Ok(LossOutput::from_terms(terms, &device))
    }
}

/// Fixed-point supervision with an actuated rigidity energy.
#[derive(Debug, Clone)]
pub struct SimulatorLoss {
    config: SimulatorLossConfig,
}

impl SimulatorLoss {
    /// Create a composer with the given weights.
    pub fn new(config: SimulatorLossConfig) -> Self {
        Self { config }
    }

    /// The weights in use.
    pub fn config(&self) -> &SimulatorLossConfig {
        &self.config
    }
}

impl<B: Backend> LossComposer<B> for SimulatorLoss {
    type Region = SimRegion;

    fn uses_actuations(&self) -> bool {
        true
    }

    fn compose(
        &self,
        prediction: Tensor<B, 2>,
        jacobian: Tensor<B, 3>,
        batch: &Batch<B, SimRegion>,
    ) -> Result<LossOutput<B>> {
        let device = prediction.device();
        let c = &self.config;
        let actuations = batch
            .actuations
            .clone()
            .ok_or(DeformError::MissingActuations {
                mode: SimRegion::MODE,
            })?;

        let terms = vec![
            ("fixed", region_l1(&prediction, batch, SimRegion::Fixed, c.w_fixed)),
            ("energy", energy_loss(jacobian, actuations)?.mul_scalar(c.w_energy)),
        ];
        Ok(LossOutput::from_terms(terms, &device))
    }
}
