//! Epoch-based trainer.

use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;

use super::metrics::{EpochReport, TermAccumulator};
use crate::config::TrainingConfig;
use crate::data::Dataset;
use crate::error::{DeformError, Result};
use crate::loss::LossComposer;
use crate::nn::CoordinateNetwork;

/// Trainer using Burn's Adam.
pub type AdamTrainer<B, L> =
    Trainer<B, L, OptimizerAdaptor<Adam, CoordinateNetwork<B>, B>>;

fn scalar<B: Backend>(t: Tensor<B, 1>) -> f32 {
    t.into_scalar().elem::<f32>()
}

/// Drives the network, a loss composer and an optimizer through epochs.
///
/// The network and optimizer state are owned here and only change inside
/// [`Trainer::train_epoch`]. All tensors are created on `device`.
pub struct Trainer<B, L, O>
where
    B: AutodiffBackend,
    L: LossComposer<B>,
    O: Optimizer<CoordinateNetwork<B>, B>,
{
    network: CoordinateNetwork<B>,
    composer: L,
    optimizer: O,
    config: TrainingConfig,
    device: B::Device,
    epoch: usize,
    total_steps: usize,
    best_loss: Option<f32>,
}

impl<B, L> Trainer<B, L, OptimizerAdaptor<Adam, CoordinateNetwork<B>, B>>
where
    B: AutodiffBackend,
    L: LossComposer<B>,
{
    /// Build a fresh network and Adam optimizer from `config`.
    pub fn with_adam(config: TrainingConfig, composer: L, device: B::Device) -> Result<Self> {
        config.check()?;
        B::seed(config.seed);
        let network = config.network.init(&device);
        let optimizer = config.optimizer.init();
        Ok(Self::new(network, composer, optimizer, config, device))
    }
}

impl<B, L, O> Trainer<B, L, O>
where
    B: AutodiffBackend,
    L: LossComposer<B>,
    O: Optimizer<CoordinateNetwork<B>, B>,
{
    /// Create a trainer from existing parts.
    pub fn new(
        network: CoordinateNetwork<B>,
        composer: L,
        optimizer: O,
        config: TrainingConfig,
        device: B::Device,
    ) -> Self {
        Self {
            network,
            composer,
            optimizer,
            config,
            device,
            epoch: 0,
            total_steps: 0,
            best_loss: None,
        }
    }

    /// The network being trained.
    pub fn network(&self) -> &CoordinateNetwork<B> {
        &self.network
    }

    /// Consume the trainer, returning the trained network.
    pub fn into_network(self) -> CoordinateNetwork<B> {
        self.network
    }

    /// The loss composer.
    pub fn composer(&self) -> &L {
        &self.composer
    }

    /// The training configuration.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// The execution device.
    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Number of completed epochs.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Number of optimizer steps taken.
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Lowest finite epoch loss so far.
    pub fn best_loss(&self) -> Option<f32> {
        self.best_loss
    }

    /// Run one epoch.
    ///
    /// Uses `max(len / batch_size, 1)` contiguous batches, truncating the last
    /// one to the dataset length. Returns the sample-weighted mean loss. A
    /// non-finite loss is reported, not raised.
    pub fn train_epoch<D>(&mut self, dataset: &mut D) -> Result<EpochReport>
    where
        D: Dataset<Region = L::Region>,
    {
        dataset.prepare_for_epoch();
        let len = dataset.len();
        if len == 0 {
            return Err(DeformError::EmptyDataset);
        }

        let batch_size = self.config.batch_size;
        let num_batches = (len / batch_size).max(1);
        let mut acc = TermAccumulator::new();

        for i in 0..num_batches {
            let start = i * batch_size;
            let end = ((i + 1) * batch_size).min(len);
            let batch = dataset.batch::<B>(start..end, &self.device)?;
            let samples = batch.len();

            let output = self.composer.process_batch(&self.network, &batch)?;
            let loss = scalar(output.total.clone());
            let terms: Vec<(&'static str, f32)> = output
                .terms
                .iter()
                .map(|(name, t)| (*name, scalar(t.clone())))
                .collect();
            log::debug!("epoch {} batch {}/{} loss={:.6}", self.epoch, i + 1, num_batches, loss);

            let grads = output.total.backward();
            let grads = GradientsParams::from_grads(grads, &self.network);
            self.network = self
                .optimizer
                .step(self.config.learning_rate, self.network.clone(), grads);
            self.total_steps += 1;

            acc.push(loss, &terms, samples);
        }

        let report = acc.finish(self.epoch);
        self.epoch += 1;

        if report.mean_loss.is_finite() {
            if self.best_loss.map_or(true, |best| report.mean_loss < best) {
                self.best_loss = Some(report.mean_loss);
            }
        } else {
            log::warn!("non-finite loss in epoch {}: {}", report.epoch, report.mean_loss);
        }

        Ok(report)
    }

    /// Run `num_epochs` epochs, logging every `log_interval`.
    ///
    /// Stops early after the first non-finite epoch and returns the reports so far.
    pub fn fit<D>(&mut self, dataset: &mut D) -> Result<Vec<EpochReport>>
    where
        D: Dataset<Region = L::Region>,
    {
        let num_epochs = self.config.num_epochs;
        let log_interval = self.config.log_interval.max(1);
        log::info!(
            "training {} epochs on {} samples (batch_size={}, lr={:.1e})",
            num_epochs,
            dataset.len(),
            self.config.batch_size,
            self.config.learning_rate
        );

        let mut reports = Vec::with_capacity(num_epochs);
        for _ in 0..num_epochs {
            let report = self.train_epoch(dataset)?;
            let finite = report.is_finite();
            if report.epoch % log_interval == 0 || report.epoch + 1 == num_epochs || !finite {
                report.log("train");
            }
            reports.push(report);
            if !finite {
                break;
            }
        }

        if let Some(best) = self.best_loss {
            log::info!("training finished after {} epochs, best loss {:.6}", self.epoch, best);
        }
        Ok(reports)
    }
}
