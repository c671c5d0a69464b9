//! Training loop, epoch metrics and checkpoints.

mod checkpoint;
mod metrics;
mod trainer;

pub use checkpoint::{checkpoint_exists, load_checkpoint, save_checkpoint, CheckpointMetadata};
pub use metrics::{EpochReport, TermAccumulator};
pub use trainer::{AdamTrainer, Trainer};
