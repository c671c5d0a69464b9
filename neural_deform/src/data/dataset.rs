//! The dataset contract and an in-memory implementation.

use core::ops::Range;

use burn::prelude::*;
use deform_core::{RegionMask, Sample};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::batch::Batch;
use crate::error::{DeformError, Result};

/// A sliceable collection of samples for one training mode.
pub trait Dataset {
    /// Region enumeration of the samples.
    type Region: RegionMask;

    /// Number of samples.
    fn len(&self) -> usize;

    /// Whether the dataset holds no samples.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Called once before every epoch. May reorder or resample.
    fn prepare_for_epoch(&mut self) {}

    /// Materialize a contiguous slice as a batch.
    ///
    /// An `end` past the dataset length is truncated.
    fn batch<B: Backend>(
        &self,
        range: Range<usize>,
        device: &B::Device,
    ) -> Result<Batch<B, Self::Region>>;
}

/// Dataset backed by a `Vec` of samples.
#[derive(Debug, Clone)]
pub struct InMemoryDataset<R: RegionMask> {
    samples: Vec<Sample<R>>,
    rng: Option<StdRng>,
}

impl<R: RegionMask> InMemoryDataset<R> {
    /// Create a dataset that keeps its sample order.
    ///
    /// Actuations must be present on every sample or on none.
    pub fn new(samples: Vec<Sample<R>>) -> Result<Self> {
        let with_actuation = samples.iter().filter(|s| s.actuation.is_some()).count();
        if with_actuation != 0 && with_actuation != samples.len() {
            return Err(DeformError::shape(
                [samples.len(), 3, 3],
                [with_actuation, 3, 3],
            ));
        }
        Ok(Self { samples, rng: None })
    }

    /// Reshuffle before every epoch using a seeded generator.
    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.rng = Some(StdRng::seed_from_u64(seed));
        self
    }

    /// Samples in their current order.
    pub fn samples(&self) -> &[Sample<R>] {
        &self.samples
    }

    /// Whether the samples carry actuation matrices.
    pub fn has_actuations(&self) -> bool {
        self.samples.first().is_some_and(|s| s.actuation.is_some())
    }

    /// Number of samples in `region`.
    pub fn count(&self, region: R) -> usize {
        self.samples.iter().filter(|s| s.region == region).count()
    }
}

impl<R: RegionMask> Dataset for InMemoryDataset<R> {
    type Region = R;

    fn len(&self) -> usize {
        self.samples.len()
    }

    fn prepare_for_epoch(&mut self) {
        if let Some(rng) = self.rng.as_mut() {
            self.samples.shuffle(rng);
        }
    }

    fn batch<B: Backend>(&self, range: Range<usize>, device: &B::Device) -> Result<Batch<B, R>> {
        let end = range.end.min(self.samples.len());
        let start = range.start.min(end);
        Batch::from_samples(&self.samples[start..end], device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use deform_core::{Point3, SurfaceRegion};

    type TestBackend = NdArray;

    fn samples(n: usize) -> Vec<Sample<SurfaceRegion>> {
        (0..n)
            .map(|i| {
                let p = Point3::splat(i as f32);
                Sample::new(p, SurfaceRegion::Flame, p)
            })
            .collect()
    }

    #[test]
    fn test_batch_truncates() {
        let device = Default::default();
        let dataset = InMemoryDataset::new(samples(5)).unwrap();

        let batch = dataset.batch::<TestBackend>(3..8, &device).unwrap();
        assert_eq!(batch.len(), 2);
        assert!(dataset.batch::<TestBackend>(5..10, &device).is_err());
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let mut a = InMemoryDataset::new(samples(32)).unwrap().with_shuffle(9);
        let mut b = InMemoryDataset::new(samples(32)).unwrap().with_shuffle(9);
        a.prepare_for_epoch();
        b.prepare_for_epoch();

        assert_eq!(a.samples(), b.samples());
        assert_ne!(a.samples(), samples(32).as_slice());

        let mut kept = InMemoryDataset::new(samples(8)).unwrap();
        kept.prepare_for_epoch();
        assert_eq!(kept.samples(), samples(8).as_slice());
    }

    #[test]
    fn test_mixed_actuations_rejected() {
        let eye = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let mut data = samples(3);
        data[1] = data[1].with_actuation(eye);
        assert!(InMemoryDataset::new(data).is_err());
    }
}
