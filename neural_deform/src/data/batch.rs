//! Batch data structure for training.

use burn::prelude::*;
use deform_core::{RegionMask, Sample};

use crate::error::{DeformError, Result};

/// A batch of samples as parallel tensors on one device.
#[derive(Debug, Clone)]
pub struct Batch<B: Backend, R: RegionMask> {
    /// Input coordinates `[N, 3]`.
    pub inputs: Tensor<B, 2>,
    /// Region of every sample.
    pub regions: Vec<R>,
    /// Targets `[N, 3]`.
    pub targets: Tensor<B, 2>,
    /// Actuation matrices `[N, 3, 3]`, simulator data only.
    pub actuations: Option<Tensor<B, 3>>,
}

impl<B: Backend, R: RegionMask> Batch<B, R> {
    /// Create a batch, checking that every array agrees on `N`.
    pub fn new(
        inputs: Tensor<B, 2>,
        regions: Vec<R>,
        targets: Tensor<B, 2>,
        actuations: Option<Tensor<B, 3>>,
    ) -> Result<Self> {
        let [n, d] = inputs.dims();
        if d != 3 {
            return Err(DeformError::shape([n, 3], [n, d]));
        }
        if targets.dims() != [n, 3] {
            return Err(DeformError::shape([n, 3], targets.dims()));
        }
        if regions.len() != n {
            return Err(DeformError::shape([n], [regions.len()]));
        }
        if let Some(a) = &actuations {
            if a.dims() != [n, 3, 3] {
                return Err(DeformError::shape([n, 3, 3], a.dims()));
            }
        }

        Ok(Self {
            inputs,
            regions,
            targets,
            actuations,
        })
    }

    /// Materialize samples on `device`.
    ///
    /// Actuations must be present on every sample or on none.
    pub fn from_samples(samples: &[Sample<R>], device: &B::Device) -> Result<Self> {
        let n = samples.len();
        if n == 0 {
            return Err(DeformError::EmptyDataset);
        }

        let mut inputs = Vec::with_capacity(n * 3);
        let mut targets = Vec::with_capacity(n * 3);
        let mut regions = Vec::with_capacity(n);
        let mut actuations: Vec<f32> = Vec::new();
        for s in samples {
            inputs.extend_from_slice(&s.coordinate.as_array());
            targets.extend_from_slice(&s.target.as_array());
            regions.push(s.region);
            if let Some(a) = &s.actuation {
                actuations.extend(a.iter().flatten());
            }
        }

        let actuations = match actuations.len() / 9 {
            0 => None,
            k if k == n => Some(Tensor::from_data(TensorData::new(actuations, [n, 3, 3]), device)),
            k => return Err(DeformError::shape([n, 3, 3], [k, 3, 3])),
        };

        Self::new(
            Tensor::from_data(TensorData::new(inputs, [n, 3]), device),
            regions,
            Tensor::from_data(TensorData::new(targets, [n, 3]), device),
            actuations,
        )
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Indices of the samples in `region`.
    pub fn indices(&self, region: R) -> Vec<usize> {
        self.regions
            .iter()
            .enumerate()
            .filter(|(_, r)| **r == region)
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of samples in `region`.
    pub fn count(&self, region: R) -> usize {
        self.regions.iter().filter(|r| **r == region).count()
    }

    /// Reject actuations in a mode that does not use them, or their absence
    /// in a mode that does.
    pub fn check_actuations(&self, expected: bool) -> Result<()> {
        match (expected, self.actuations.is_some()) {
            (true, false) => Err(DeformError::MissingActuations { mode: R::MODE }),
            (false, true) => Err(DeformError::UnexpectedActuations { mode: R::MODE }),
            _ => Ok(()),
        }
    }
}

/// Gather rows of `tensor` along the batch axis.
pub fn select_rows<B: Backend, const D: usize>(tensor: Tensor<B, D>, indices: &[usize]) -> Tensor<B, D> {
    let device = tensor.device();
    let indices: Vec<i64> = indices.iter().map(|&i| i as i64).collect();
    let len = indices.len();
    let indices = Tensor::<B, 1, Int>::from_data(TensorData::new(indices, [len]), &device);
    tensor.select(0, indices)
}
