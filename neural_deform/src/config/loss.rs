//! Loss weighting for the three training modes.

use burn::config::Config;

use crate::loss::{FullHeadLoss, SimulatorLoss, SurfaceLoss};

fn check_weights(weights: &[(&str, f32)]) -> Result<(), String> {
    for (name, w) in weights {
        if !w.is_finite() || *w < 0.0 {
            return Err(format!("{} must be finite and >= 0, got {}", name, w));
        }
    }
    Ok(())
}

/// Weights for surface-only fitting.
#[derive(Config, Debug)]
pub struct SurfaceLossConfig {
    /// Weight for the L1 loss on face-model points.
    #[config(default = 1.0)]
    pub w_flame: f32,

    /// Weight for the L1 loss on boundary points.
    #[config(default = 1.0)]
    pub w_boundary: f32,

    /// Weight for the closest-rotation deformation regularizer.
    #[config(default = 0.02)]
    pub w_deformation: f32,
}

impl Default for SurfaceLossConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceLossConfig {
    /// Build the matching loss composer.
    pub fn init(&self) -> SurfaceLoss {
        SurfaceLoss::new(self.clone())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        check_weights(&[
            ("w_flame", self.w_flame),
            ("w_boundary", self.w_boundary),
            ("w_deformation", self.w_deformation),
        ])
    }
}

/// Weights for full-head volumetric fitting.
#[derive(Config, Debug)]
pub struct FullHeadLossConfig {
    /// Weight for the L1 loss on skin surface points.
    #[config(default = 10.0)]
    pub w_surface: f32,

    /// Weight for the L1 loss on skull points.
    #[config(default = 2.0)]
    pub w_skull: f32,

    /// Weight for the Procrustes residual on jaw points.
    #[config(default = 1.0)]
    pub w_jaw: f32,

    /// Weight for the closest-rotation deformation regularizer.
    #[config(default = 0.02)]
    pub w_deformation: f32,

    /// Minimum number of jaw points in a batch before the jaw term is used.
    #[config(default = 3)]
    pub min_jaw_points: usize,
}

impl Default for FullHeadLossConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FullHeadLossConfig {
    /// Build the matching loss composer.
    pub fn init(&self) -> FullHeadLoss {
        FullHeadLoss::new(self.clone())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        check_weights(&[
            ("w_surface", self.w_surface),
            ("w_skull", self.w_skull),
            ("w_jaw", self.w_jaw),
            ("w_deformation", self.w_deformation),
        ])?;
        if self.min_jaw_points < deform_core::MIN_PROCRUSTES_POINTS {
            return Err(format!(
                "min_jaw_points must be >= {}, got {}",
                deform_core::MIN_PROCRUSTES_POINTS,
                self.min_jaw_points
            ));
        }
        Ok(())
    }
}

/// Weights for training against simulator actuations.
#[derive(Config, Debug)]
pub struct SimulatorLossConfig {
    /// Weight for the L1 loss on fixed points.
    #[config(default = 2.0)]
    pub w_fixed: f32,

    /// Weight for the actuated closest-rotation energy.
    #[config(default = 0.5)]
    pub w_energy: f32,
}

impl Default for SimulatorLossConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatorLossConfig {
    /// Build the matching loss composer.
    pub fn init(&self) -> SimulatorLoss {
        SimulatorLoss::new(self.clone())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        check_weights(&[("w_fixed", self.w_fixed), ("w_energy", self.w_energy)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let surface = SurfaceLossConfig::default();
        assert_eq!(surface.w_flame, 1.0);
        assert_eq!(surface.w_deformation, 0.02);

        let head = FullHeadLossConfig::default();
        assert_eq!(head.w_surface, 10.0);
        assert_eq!(head.w_skull, 2.0);
        assert_eq!(head.min_jaw_points, 3);

        let sim = SimulatorLossConfig::default();
        assert_eq!(sim.w_fixed, 2.0);
        assert_eq!(sim.w_energy, 0.5);
    }

    #[test]
    fn test_weight_validation() {
        assert!(SurfaceLossConfig::new().with_w_flame(-1.0).validate().is_err());
        assert!(SimulatorLossConfig::new()
            .with_w_energy(f32::NAN)
            .validate()
            .is_err());
        assert!(FullHeadLossConfig::new()
            .with_min_jaw_points(2)
            .validate()
            .is_err());
        assert!(FullHeadLossConfig::new().with_w_jaw(0.0).validate().is_ok());
    }
}
