//! Training configuration types.

use core::fmt;
use core::str::FromStr;

use burn::config::Config;
use burn::optim::AdamConfig;
use serde::{Deserialize, Serialize};

use super::{CoordinateNetworkConfig, FullHeadLossConfig, SimulatorLossConfig, SurfaceLossConfig};
use crate::error::DeformError;

/// Selects the loss composer and region enumeration for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingMode {
    /// Face-model and boundary supervision on the skin surface.
    Surface,
    /// Skull, jaw and skin supervision through the whole head.
    FullHead,
    /// Fixed points plus an actuated rigidity energy.
    Simulator,
}

impl TrainingMode {
    /// Name used in configuration files and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            TrainingMode::Surface => "surface",
            TrainingMode::FullHead => "full_head",
            TrainingMode::Simulator => "simulator",
        }
    }
}

impl fmt::Display for TrainingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrainingMode {
    type Err = DeformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "surface" => Ok(TrainingMode::Surface),
            "full_head" | "full-head" | "fullhead" => Ok(TrainingMode::FullHead),
            "simulator" => Ok(TrainingMode::Simulator),
            other => Err(DeformError::InvalidConfig {
                message: format!(
                    "unknown training mode '{}', expected surface, full-head or simulator",
                    other
                ),
            }),
        }
    }
}

/// Configuration for a training run.
#[derive(Config)]
pub struct TrainingConfig {
    /// Which loss composer to train with.
    #[config(default = "TrainingMode::FullHead")]
    pub mode: TrainingMode,

    /// Network architecture.
    pub network: CoordinateNetworkConfig,

    /// Weights used in surface mode.
    #[config(default = "SurfaceLossConfig::new()")]
    pub surface_loss: SurfaceLossConfig,

    /// Weights used in full-head mode.
    #[config(default = "FullHeadLossConfig::new()")]
    pub full_head_loss: FullHeadLossConfig,

    /// Weights used in simulator mode.
    #[config(default = "SimulatorLossConfig::new()")]
    pub simulator_loss: SimulatorLossConfig,

    /// Optimizer hyperparameters.
    #[config(default = "AdamConfig::new()")]
    pub optimizer: AdamConfig,

    /// Fixed learning rate.
    #[config(default = 1e-3)]
    pub learning_rate: f64,

    /// Samples per batch.
    #[config(default = 1024)]
    pub batch_size: usize,

    /// Number of epochs for `Trainer::fit`.
    #[config(default = 100)]
    pub num_epochs: usize,

    /// Log an epoch summary every this many epochs.
    #[config(default = 10)]
    pub log_interval: usize,

    /// Seed for backend initialization and dataset shuffling.
    #[config(default = 42)]
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self::new(CoordinateNetworkConfig::new())
    }
}

impl TrainingConfig {
    /// A small configuration for quick experiments and tests.
    pub fn fast() -> Self {
        Self::new(
            CoordinateNetworkConfig::new()
                .with_num_hidden_layers(1)
                .with_fourier_features(4),
        )
        .with_batch_size(256)
        .with_num_epochs(20)
        .with_log_interval(5)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.network.validate()?;
        if self.network.input_size != 3 || self.network.output_size != 3 {
            return Err(format!(
                "coordinates and targets are 3-vectors, got input_size={} output_size={}",
                self.network.input_size, self.network.output_size
            ));
        }
        self.surface_loss.validate()?;
        self.full_head_loss.validate()?;
        self.simulator_loss.validate()?;
        if self.batch_size == 0 {
            return Err("batch_size must be > 0".to_string());
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(format!(
                "learning_rate must be positive and finite, got {}",
                self.learning_rate
            ));
        }
        Ok(())
    }

    /// Validate, wrapping failures in [`DeformError::InvalidConfig`].
    pub fn check(&self) -> crate::error::Result<()> {
        self.validate()
            .map_err(|message| DeformError::InvalidConfig { message })
    }
}
