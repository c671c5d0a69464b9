//! Closest proper rotation to a 3x3 matrix.
//!
//! Polar decomposition through the SVD `M = U·diag(s)·Vᵀ` with the
//! determinant fix `R = U·Z·Vᵀ`, `Z = diag(1, 1, sign(det(U·Vᵀ)))`. The sign
//! fix always lands on the smallest singular value, so the factors are
//! reordered to descending singular values before it is applied.

use core::cmp::Ordering;

use nalgebra::{Matrix3, Vector3};

use crate::error::CoreError;

/// Denominators of the rotation adjoint below this magnitude are dropped.
pub const ADJOINT_EPSILON: f64 = 1e-8;

/// Iteration cap for the SVD; non-finite input never converges.
const MAX_SVD_ITERATIONS: usize = 512;

/// SVD factors of a matrix together with its closest proper rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationFactors {
    /// Left singular vectors, columns ordered by descending singular value.
    pub u: Matrix3<f64>,
    /// Right singular vectors, same column order as `u`.
    pub v: Matrix3<f64>,
    /// Singular values in descending order.
    pub singular_values: Vector3<f64>,
    /// Whether `det(U·Vᵀ) < 0`, i.e. the unconstrained optimum is a reflection.
    pub reflected: bool,
    /// The closest proper rotation `U·Z·Vᵀ`.
    pub rotation: Matrix3<f64>,
}

impl RotationFactors {
    /// Singular values of the symmetric stretch `M = R·P`.
    ///
    /// Identical to `singular_values` except that the smallest one is negated
    /// when the determinant fix was applied.
    pub fn signed_singular_values(&self) -> Vector3<f64> {
        let mut s = self.singular_values;
        if self.reflected {
            s[2] = -s[2];
        }
        s
    }

    /// Coupling weights of the rotation adjoint, expressed in the `V` basis.
    ///
    /// A perturbation `dM` moves the rotation by `dR = R·V·Ω·Vᵀ` with
    /// `Ω_ij = W_ij·(Vᵀ·(Rᵀ·dM − dMᵀ·R)·V)_ij` and
    /// `W_ij = 1 / (s'_i + s'_j)` for `i != j`. The diagonal is zero and any
    /// weight whose denominator is below [`ADJOINT_EPSILON`] is zeroed.
    pub fn adjoint_weights(&self) -> Matrix3<f64> {
        let s = self.signed_singular_values();
        Matrix3::from_fn(|i, j| {
            if i == j {
                return 0.0;
            }
            let denom = s[i] + s[j];
            if denom.abs() < ADJOINT_EPSILON {
                0.0
            } else {
                1.0 / denom
            }
        })
    }
}

/// Compute the closest proper rotation to `m` in Frobenius norm.
pub fn closest_rotation(m: &Matrix3<f64>) -> Result<RotationFactors, CoreError> {
    let svd = m
        .try_svd(true, true, f64::EPSILON, MAX_SVD_ITERATIONS)
        .ok_or(CoreError::Decomposition)?;
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => return Err(CoreError::Decomposition),
    };
    let v = v_t.transpose();
    let s = svd.singular_values;

    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| s[b].partial_cmp(&s[a]).unwrap_or(Ordering::Equal));

    let u = Matrix3::from_columns(&[
        u.column(order[0]).into_owned(),
        u.column(order[1]).into_owned(),
        u.column(order[2]).into_owned(),
    ]);
    let v = Matrix3::from_columns(&[
        v.column(order[0]).into_owned(),
        v.column(order[1]).into_owned(),
        v.column(order[2]).into_owned(),
    ]);
    let singular_values = Vector3::new(s[order[0]], s[order[1]], s[order[2]]);

    let reflected = (u * v.transpose()).determinant() < 0.0;
    let mut z = Matrix3::identity();
    if reflected {
        z[(2, 2)] = -1.0;
    }
    let rotation = u * z * v.transpose();

    Ok(RotationFactors {
        u,
        v,
        singular_values,
        reflected,
        rotation,
    })
}

/// Frobenius distance from `m` to its closest proper rotation.
pub fn rotation_residual(m: &Matrix3<f64>) -> Result<f64, CoreError> {
    let factors = closest_rotation(m)?;
    Ok((m - factors.rotation).norm())
}
