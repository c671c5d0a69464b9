//! Differentiable similarity Procrustes alignment.

use burn::prelude::*;
use deform_core::{CoreError, MIN_PROCRUSTES_POINTS};

use super::rotation::{closest_rotation, safe_norm};
use crate::error::{DeformError, Result};

/// Similarity transform aligning a source point set to a target.
#[derive(Debug, Clone)]
pub struct SimilarityFit<B: Backend> {
    /// Uniform scale `[1]`.
    pub scale: Tensor<B, 1>,
    /// Proper rotation `[3, 3]`.
    pub rotation: Tensor<B, 2>,
    /// Translation `[1, 3]`.
    pub translation: Tensor<B, 2>,
    /// Mean Euclidean distance after alignment `[1]`.
    pub residual: Tensor<B, 1>,
}

/// Fit `scale·R·s + t ≈ target` for corresponding rows of `source` and `target`.
///
/// Gradients flow to both point sets through the centering, the scale and the
/// rotation. Fewer than three points is an error; callers gate on region size.
pub fn procrustes_fit<B: Backend>(source: Tensor<B, 2>, target: Tensor<B, 2>) -> Result<SimilarityFit<B>> {
    let [n, d] = source.dims();
    if target.dims() != [n, d] || d != 3 {
        return Err(DeformError::shape([n, 3], target.dims()));
    }
    if n < MIN_PROCRUSTES_POINTS {
        return Err(CoreError::TooFewPoints {
            required: MIN_PROCRUSTES_POINTS,
            got: n,
        }
        .into());
    }

    let mu1 = source.clone().mean_dim(0);
    let mu2 = target.clone().mean_dim(0);
    let x1 = source.clone() - mu1.clone();
    let x2 = target.clone() - mu2.clone();

    let var1 = (x1.clone() * x1.clone()).sum();
    let k = x1.transpose().matmul(x2);

    // K = U S Vᵀ and the rotation we need is V Z Uᵀ: the closest rotation to Kᵀ.
    let k_t = k.transpose();
    let rotation = closest_rotation(k_t.clone().reshape([1, 3, 3]))?.reshape([3, 3]);

    let scale = (rotation.clone() * k_t).sum() / var1;
    let scale_2d = scale.clone().reshape([1, 1]);
    let translation = mu2 - mu1.matmul(rotation.clone().transpose()) * scale_2d.clone();

    let aligned = source.matmul(rotation.clone().transpose()) * scale_2d + translation.clone();
    let residual = safe_norm(aligned - target).mean();

    Ok(SimilarityFit {
        scale,
        rotation,
        translation,
        residual,
    })
}

/// Mean residual of the best similarity alignment of `prediction` onto `target`.
pub fn procrustes_loss<B: Backend>(prediction: Tensor<B, 2>, target: Tensor<B, 2>) -> Result<Tensor<B, 1>> {
    Ok(procrustes_fit(prediction, target)?.residual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_identical_sets() {
        let device = Default::default();
        let points = Tensor::<TestBackend, 2>::from_floats(
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            &device,
        );

        let fit = procrustes_fit(points.clone(), points).unwrap();
        let residual: f32 = fit.residual.into_data().to_vec().unwrap()[0];
        let scale: f32 = fit.scale.into_data().to_vec().unwrap()[0];

        assert!(residual < 1e-4, "residual {}", residual);
        assert!((scale - 1.0).abs() < 1e-5, "scale {}", scale);
    }

    #[test]
    fn test_too_few_points() {
        let device = Default::default();
        let points = Tensor::<TestBackend, 2>::zeros([2, 3], &device);
        assert!(matches!(
            procrustes_loss(points.clone(), points),
            Err(DeformError::Core(CoreError::TooFewPoints { got: 2, .. }))
        ));
    }
}
