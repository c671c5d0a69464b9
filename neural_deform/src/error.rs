//! Error types for neural_deform.

use burn::record::RecorderError;
use deform_core::CoreError;
use thiserror::Error;

/// Errors that can occur while building, training or persisting a network.
#[derive(Error, Debug)]
pub enum DeformError {
    /// Tensor shape mismatch.
    #[error("tensor shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        got: Vec<usize>,
    },

    /// Actuation matrices were supplied in a mode that has no use for them.
    #[error("actuations supplied in {mode} mode, which does not use them")]
    UnexpectedActuations {
        /// Name of the training mode.
        mode: &'static str,
    },

    /// A mode that needs actuation matrices received a batch without them.
    #[error("{mode} mode requires actuations on every sample")]
    MissingActuations {
        /// Name of the training mode.
        mode: &'static str,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// An epoch was requested over a dataset with no samples.
    #[error("dataset is empty")]
    EmptyDataset,

    /// Host-side geometry error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Model weights could not be recorded or restored.
    #[error("recorder error: {0}")]
    Recorder(#[from] RecorderError),

    /// Checkpoint configuration or metadata could not be read.
    #[error("checkpoint error: {message}")]
    Checkpoint {
        /// Description of the error.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for neural_deform operations.
pub type Result<T> = std::result::Result<T, DeformError>;

impl DeformError {
    /// Build a shape mismatch from two array shapes.
    pub fn shape<const A: usize, const C: usize>(expected: [usize; A], got: [usize; C]) -> Self {
        DeformError::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }
}
