//! Checkpoint save/load.
//!
//! A checkpoint is three sibling files sharing a base path:
//! - `{base}.model.mpk`: network parameters (named MessagePack, full precision)
//! - `{base}.config.json`: the [`TrainingConfig`], used to rebuild the network
//! - `{base}.meta.json`: [`CheckpointMetadata`]

use std::fs;
use std::path::{Path, PathBuf};

use burn::config::Config;
use burn::module::Module;
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};

use crate::config::TrainingConfig;
use crate::error::DeformError;
use crate::nn::CoordinateNetwork;

/// Current checkpoint layout version.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Training progress stored next to the weights.
#[derive(Config, Debug)]
pub struct CheckpointMetadata {
    /// Completed epochs.
    #[config(default = 0)]
    pub epoch: usize,
    /// Optimizer steps taken.
    #[config(default = 0)]
    pub total_steps: usize,
    /// Mean loss of the last epoch.
    #[config(default = "None")]
    pub last_loss: Option<f32>,
    /// Lowest finite epoch loss.
    #[config(default = "None")]
    pub best_loss: Option<f32>,
    /// Checkpoint layout version.
    #[config(default = 1)]
    pub version: u32,
}

impl Default for CheckpointMetadata {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckpointMetadata {
    /// Metadata for a given point in training.
    ///
    /// Non-finite losses are stored as absent.
    pub fn at(epoch: usize, total_steps: usize, last_loss: f32, best_loss: Option<f32>) -> Self {
        Self::new()
            .with_epoch(epoch)
            .with_total_steps(total_steps)
            .with_last_loss(last_loss.is_finite().then_some(last_loss))
            .with_best_loss(best_loss.filter(|l| l.is_finite()))
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn model_path(base: &Path) -> PathBuf {
    // The recorder replaces any extension with `mpk`, so pass it explicitly.
    with_suffix(base, ".model.mpk")
}

fn recorder() -> NamedMpkFileRecorder<FullPrecisionSettings> {
    NamedMpkFileRecorder::<FullPrecisionSettings>::new()
}

/// Whether all three checkpoint files exist for `base`.
pub fn checkpoint_exists(base: &Path) -> bool {
    model_path(base).is_file()
        && with_suffix(base, ".config.json").is_file()
        && with_suffix(base, ".meta.json").is_file()
}

/// Save network parameters, configuration and metadata under `base`.
pub fn save_checkpoint<B: Backend>(
    base: &Path,
    network: &CoordinateNetwork<B>,
    config: &TrainingConfig,
    metadata: &CheckpointMetadata,
) -> crate::error::Result<()> {
    if let Some(dir) = base.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    network.clone().save_file(model_path(base), &recorder())?;
    config.save(with_suffix(base, ".config.json"))?;
    metadata.save(with_suffix(base, ".meta.json"))?;

    log::info!(
        "saved checkpoint {} (epoch {}, steps {})",
        base.display(),
        metadata.epoch,
        metadata.total_steps
    );
    Ok(())
}

/// Load a checkpoint saved with [`save_checkpoint`].
///
/// The network is rebuilt from the stored configuration before the weights are
/// loaded, so the architecture always matches the file.
pub fn load_checkpoint<B: Backend>(
    base: &Path,
    device: &B::Device,
) -> crate::error::Result<(CoordinateNetwork<B>, TrainingConfig, CheckpointMetadata)> {
    let config_path = with_suffix(base, ".config.json");
    let config = TrainingConfig::load(&config_path).map_err(|e| DeformError::Checkpoint {
        message: format!("{}: {}", config_path.display(), e),
    })?;
    config.check()?;

    let meta_path = with_suffix(base, ".meta.json");
    let metadata = CheckpointMetadata::load(&meta_path).map_err(|e| DeformError::Checkpoint {
        message: format!("{}: {}", meta_path.display(), e),
    })?;
    if metadata.version != CHECKPOINT_VERSION {
        return Err(DeformError::Checkpoint {
            message: format!(
                "unsupported checkpoint version {}, expected {}",
                metadata.version, CHECKPOINT_VERSION
            ),
        });
    }

    let network = config
        .network
        .init::<B>(device)
        .load_file(model_path(base), &recorder(), device)?;

    log::info!(
        "loaded checkpoint {} (epoch {}, mode {})",
        base.display(),
        metadata.epoch,
        config.mode
    );
    Ok((network, config, metadata))
}
