//! Similarity Procrustes alignment of corresponding point sets.

use nalgebra::{Matrix3, Vector3};

use crate::error::CoreError;
use crate::rotation::closest_rotation;
use crate::types::Point3;

/// Minimum number of corresponding points for a well-posed fit.
pub const MIN_PROCRUSTES_POINTS: usize = 3;

/// A similarity transform `x -> scale * R x + t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityTransform {
    /// Uniform scale.
    pub scale: f64,
    /// Proper rotation.
    pub rotation: Matrix3<f64>,
    /// Translation applied after rotation and scaling.
    pub translation: Vector3<f64>,
}

impl SimilarityTransform {
    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Apply the transform to a point.
    pub fn apply(&self, p: Point3) -> Point3 {
        let v = self.rotation * p.to_vector() * self.scale + self.translation;
        Point3::from_vector(&v)
    }
}

/// Result of a Procrustes fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcrustesFit {
    /// Best similarity transform mapping source onto target.
    pub transform: SimilarityTransform,
    /// Mean Euclidean distance between the aligned source and the target.
    pub residual: f64,
}

fn centroid(points: &[Point3]) -> Vector3<f64> {
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.to_vector());
    sum / points.len() as f64
}

/// Find the similarity transform that best maps `source` onto `target`.
///
/// Both slices must correspond index by index and hold at least
/// [`MIN_PROCRUSTES_POINTS`] points. The rotation is always proper; when the
/// best unconstrained alignment is a mirror image the residual reflects the
/// mismatch instead.
pub fn procrustes(source: &[Point3], target: &[Point3]) -> Result<ProcrustesFit, CoreError> {
    if source.len() != target.len() {
        return Err(CoreError::LengthMismatch {
            left: source.len(),
            right: target.len(),
        });
    }
    if source.len() < MIN_PROCRUSTES_POINTS {
        return Err(CoreError::TooFewPoints {
            required: MIN_PROCRUSTES_POINTS,
            got: source.len(),
        });
    }

    let mu1 = centroid(source);
    let mu2 = centroid(target);

    let mut var1 = 0.0;
    let mut k = Matrix3::zeros();
    for (s, t) in source.iter().zip(target) {
        let x1 = s.to_vector() - mu1;
        let x2 = t.to_vector() - mu2;
        var1 += x1.norm_squared();
        k += x1 * x2.transpose();
    }

    // K = U S Vᵀ; the rotation we want is V Z Uᵀ, the closest rotation to Kᵀ.
    let rotation = closest_rotation(&k.transpose())?.rotation;
    let scale = if var1 > 0.0 {
        (rotation * k).trace() / var1
    } else {
        1.0
    };
    let translation = mu2 - rotation * mu1 * scale;

    let transform = SimilarityTransform {
        scale,
        rotation,
        translation,
    };

    let residual = source
        .iter()
        .zip(target)
        .map(|(s, t)| {
            let aligned = rotation * s.to_vector() * scale + translation;
            (aligned - t.to_vector()).norm()
        })
        .sum::<f64>()
        / source.len() as f64;

    Ok(ProcrustesFit {
        transform,
        residual,
    })
}
