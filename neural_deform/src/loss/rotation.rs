//! Differentiable closest rotation.
//!
//! Burn has no SVD, so each 3x3 decomposition runs on the host through
//! `deform_core`. The result re-enters the graph as
//! `R₀ + R₀·V·(W ⊙ (Vᵀ·(R₀ᵀ·dM − dMᵀ·R₀)·V))·Vᵀ` with `dM = M − detach(M)`.
//! The correction is exactly zero in value, and its derivative is the adjoint
//! of the polar rotation factor, so gradients reach `M` as if the SVD had been
//! differentiated directly.

use burn::prelude::*;
use deform_core::rotation::{closest_rotation as host_closest_rotation, RotationFactors};
use nalgebra::Matrix3;

use crate::error::{DeformError, Result};

/// Floor under squared norms before `sqrt`, keeping the gradient at zero finite.
pub const NORM_EPSILON: f32 = 1e-12;

/// Row-wise Euclidean norm with a finite gradient at zero. `[N, D] -> [N]`.
pub fn safe_norm<B: Backend>(x: Tensor<B, 2>) -> Tensor<B, 1> {
    let [n, _] = x.dims();
    (x.clone() * x)
        .sum_dim(1)
        .clamp_min(NORM_EPSILON)
        .sqrt()
        .reshape([n])
}

fn push_matrix(out: &mut Vec<f32>, m: &Matrix3<f64>) {
    for r in 0..3 {
        for c in 0..3 {
            out.push(m[(r, c)] as f32);
        }
    }
}

/// Closest proper rotation of every matrix in `m` (`[N, 3, 3]`).
///
/// Matrices with non-finite entries yield NaN rotations so the failure shows
/// up in the loss instead of being hidden.
pub fn closest_rotation<B: Backend>(m: Tensor<B, 3>) -> Result<Tensor<B, 3>> {
    let [n, rows, cols] = m.dims();
    if rows != 3 || cols != 3 {
        return Err(DeformError::shape([n, 3, 3], [n, rows, cols]));
    }
    let device = m.device();

    let values: Vec<f64> = m.to_data().iter::<f64>().collect();
    let mut rotations = Vec::with_capacity(n * 9);
    let mut bases = Vec::with_capacity(n * 9);
    let mut weights = Vec::with_capacity(n * 9);

    for chunk in values.chunks_exact(9) {
        let matrix = Matrix3::from_row_slice(chunk);
        if !matrix.iter().all(|v| v.is_finite()) {
            rotations.extend([f32::NAN; 9]);
            bases.extend([0.0f32; 9]);
            weights.extend([0.0f32; 9]);
            continue;
        }
        let factors: RotationFactors = host_closest_rotation(&matrix)?;
        push_matrix(&mut rotations, &factors.rotation);
        push_matrix(&mut bases, &factors.v);
        push_matrix(&mut weights, &factors.adjoint_weights());
    }

    let constant = |data: Vec<f32>| Tensor::<B, 3>::from_data(TensorData::new(data, [n, 3, 3]), &device);
    let r0 = constant(rotations);
    let v = constant(bases);
    let w = constant(weights);

    let dm = m.clone() - m.detach();
    let skew = r0.clone().swap_dims(1, 2).matmul(dm.clone()) - dm.swap_dims(1, 2).matmul(r0.clone());
    let omega = w * v.clone().swap_dims(1, 2).matmul(skew).matmul(v.clone());
    let correction = r0.clone().matmul(v.clone()).matmul(omega).matmul(v.swap_dims(1, 2));

    Ok(r0 + correction)
}

/// Mean Frobenius distance from each matrix to its closest rotation.
///
/// Zero for a batch of proper rotations; `|c − 1|·√3` for `c·I`.
pub fn rotation_residual<B: Backend>(m: Tensor<B, 3>) -> Result<Tensor<B, 1>> {
    let [n, _, _] = m.dims();
    let rotation = closest_rotation(m.clone())?;
    let diff = (m - rotation).reshape([n, 9]);
    Ok(safe_norm(diff).mean())
}

/// Penalize local non-rigid distortion of the learned map.
pub fn deformation_loss<B: Backend>(jacobian: Tensor<B, 3>) -> Result<Tensor<B, 1>> {
    rotation_residual(jacobian)
}

/// Penalize deviation from rigidity after applying per-sample actuations.
///
/// The residual is taken on `J·A`.
pub fn energy_loss<B: Backend>(jacobian: Tensor<B, 3>, actuations: Tensor<B, 3>) -> Result<Tensor<B, 1>> {
    if jacobian.dims() != actuations.dims() {
        return Err(DeformError::shape(jacobian.dims(), actuations.dims()));
    }
    rotation_residual(jacobian.matmul(actuations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn scalar(t: Tensor<TestBackend, 1>) -> f32 {
        t.into_data().to_vec::<f32>().unwrap()[0]
    }

    #[test]
    fn test_rotation_residual_of_rotation_is_zero() {
        let device = Default::default();
        let (s, c) = (0.6f32.sin(), 0.6f32.cos());
        let m = Tensor::<TestBackend, 3>::from_floats(
            [[[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]]],
            &device,
        );

        let r = scalar(rotation_residual(m).unwrap());
        assert!(r < 1e-3, "expected ~0, got {}", r);
    }

    #[test]
    fn test_uniform_scale_residual() {
        let device = Default::default();
        let m = Tensor::<TestBackend, 3>::from_floats(
            [
                [[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 2.0]],
                [[0.5, 0.0, 0.0], [0.0, 0.5, 0.0], [0.0, 0.0, 0.5]],
            ],
            &device,
        );

        let r = scalar(rotation_residual(m).unwrap());
        let expected = (1.0 + 0.5) / 2.0 * 3.0f32.sqrt();
        assert!((r - expected).abs() < 1e-5, "expected {}, got {}", expected, r);
    }

    #[test]
    fn test_non_finite_propagates() {
        let device = Default::default();
        let m = Tensor::<TestBackend, 3>::from_floats(
            [[[f32::NAN, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]],
            &device,
        );
        let r: Vec<f32> = closest_rotation(m).unwrap().into_data().to_vec().unwrap();
        assert!(r.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_rejects_non_square() {
        let device = Default::default();
        let m = Tensor::<TestBackend, 3>::zeros([2, 3, 2], &device);
        assert!(matches!(
            closest_rotation(m),
            Err(DeformError::ShapeMismatch { .. })
        ));
    }
}
