//! Evaluation of a trained network against a dataset.

use burn::prelude::*;
use deform_core::{procrustes, Point3, RegionMask, MIN_PROCRUSTES_POINTS};

use crate::data::Dataset;
use crate::error::{DeformError, Result};
use crate::nn::CoordinateNetwork;

/// Per-region accuracy.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionReport {
    /// Region name.
    pub name: &'static str,
    /// Number of samples in the region.
    pub count: usize,
    /// Mean Euclidean distance between prediction and target.
    pub mean_error: f64,
    /// Maximum Euclidean distance between prediction and target.
    pub max_error: f64,
    /// Residual after similarity alignment, for regions with enough points.
    pub procrustes_residual: Option<f64>,
}

/// Accuracy of a network over a whole dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    /// One entry per region, in tag order. Empty regions are omitted.
    pub regions: Vec<RegionReport>,
    /// Mean Euclidean error over every sample.
    pub mean_error: f64,
}

impl EvaluationReport {
    /// Look up a region by name.
    pub fn region(&self, name: &str) -> Option<&RegionReport> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Log the report at info level.
    pub fn log(&self) {
        log::info!("eval mean_error={:.6}", self.mean_error);
        for r in &self.regions {
            match r.procrustes_residual {
                Some(res) => log::info!(
                    "  {:<10} n={:<6} mean={:.6} max={:.6} procrustes={:.6}",
                    r.name,
                    r.count,
                    r.mean_error,
                    r.max_error,
                    res
                ),
                None => log::info!(
                    "  {:<10} n={:<6} mean={:.6} max={:.6}",
                    r.name,
                    r.count,
                    r.mean_error,
                    r.max_error
                ),
            }
        }
    }
}

fn to_points<B: Backend>(t: Tensor<B, 2>) -> Vec<Point3> {
    let values: Vec<f32> = t.into_data().iter::<f32>().collect();
    values
        .chunks_exact(3)
        .map(|c| Point3::new(c[0], c[1], c[2]))
        .collect()
}

/// Host Procrustes residual of a region, `None` when it cannot be fitted.
fn alignment_residual(name: &str, predicted: &[Point3], targets: &[Point3]) -> Option<f64> {
    if predicted.len() < MIN_PROCRUSTES_POINTS {
        return None;
    }
    match procrustes(predicted, targets) {
        Ok(fit) => Some(fit.residual),
        Err(e) => {
            log::debug!("no alignment residual for {}: {}", name, e);
            None
        }
    }
}

/// Predict every sample of `dataset` and compare with its target.
pub fn evaluate<B, D>(
    network: &CoordinateNetwork<B>,
    dataset: &D,
    batch_size: usize,
    device: &B::Device,
) -> Result<EvaluationReport>
where
    B: Backend,
    D: Dataset,
{
    let len = dataset.len();
    if len == 0 {
        return Err(DeformError::EmptyDataset);
    }
    let batch_size = batch_size.max(1);

    let mut regions = Vec::with_capacity(len);
    let mut predicted = Vec::with_capacity(len);
    let mut targets = Vec::with_capacity(len);
    for start in (0..len).step_by(batch_size) {
        let batch = dataset.batch::<B>(start..start + batch_size, device)?;
        predicted.extend(to_points(network.predict(batch.inputs.clone())));
        targets.extend(to_points(batch.targets));
        regions.extend(batch.regions);
    }

    let errors: Vec<f64> = predicted
        .iter()
        .zip(&targets)
        .map(|(p, t)| p.distance(*t) as f64)
        .collect();

    let mut reports = Vec::new();
    for &region in <D::Region as RegionMask>::ALL {
        let indices: Vec<usize> = (0..regions.len()).filter(|&i| regions[i] == region).collect();
        if indices.is_empty() {
            continue;
        }
        let count = indices.len();
        let mean_error = indices.iter().map(|&i| errors[i]).sum::<f64>() / count as f64;
        let max_error = indices.iter().map(|&i| errors[i]).fold(0.0, f64::max);

        let src: Vec<Point3> = indices.iter().map(|&i| predicted[i]).collect();
        let dst: Vec<Point3> = indices.iter().map(|&i| targets[i]).collect();
        let procrustes_residual = alignment_residual(region.name(), &src, &dst);

        reports.push(RegionReport {
            name: region.name(),
            count,
            mean_error,
            max_error,
            procrustes_residual,
        });
    }

    Ok(EvaluationReport {
        regions: reports,
        mean_error: errors.iter().sum::<f64>() / errors.len() as f64,
    })
}
