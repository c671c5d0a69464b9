//! Rotation and Procrustes Fitting
//!
//! Compares the host (nalgebra) and tensor (Burn) paths:
//! 1. Recover a known similarity transform from noisy correspondences
//! 2. Project a batch of perturbed matrices onto the closest rotation
//! 3. Show that a mirrored input still yields a proper rotation
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin rotation_fit
//! ```

use std::process;

use burn::backend::NdArray;
use burn::prelude::*;
use nalgebra::{Matrix3, Rotation3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use neural_deform::loss;
use neural_deform::prelude::*;

type DemoBackend = NdArray;

const NUM_POINTS: usize = 64;
const NUM_MATRICES: usize = 8;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("═══════════════════════════════════════════════════════════════");
    println!("          Rotation and Procrustes Fitting");
    println!("═══════════════════════════════════════════════════════════════");
    println!();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let device = Default::default();
    let mut rng = StdRng::seed_from_u64(7);

    println!("┌─────────────────────────────────────────────────────────────┐");
    println!("│ Step 1: Similarity Procrustes                               │");
    println!("└─────────────────────────────────────────────────────────────┘");
    let truth = SimilarityTransform {
        scale: 1.3,
        rotation: *Rotation3::from_euler_angles(0.3, -0.7, 1.1).matrix(),
        translation: Vector3::new(0.2, -0.5, 0.8),
    };
    let source: Vec<Point3> = (0..NUM_POINTS)
        .map(|_| {
            Point3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            )
        })
        .collect();
    let target: Vec<Point3> = source
        .iter()
        .map(|&p| {
            let noise = Point3::new(
                rng.gen_range(-0.01..0.01),
                rng.gen_range(-0.01..0.01),
                rng.gen_range(-0.01..0.01),
            );
            truth.apply(p) + noise
        })
        .collect();

    let host = procrustes(&source, &target)?;
    let angle_error = Rotation3::from_matrix_unchecked(host.transform.rotation.transpose() * truth.rotation).angle();
    println!("  Host scale:      {:.4} (true {:.4})", host.transform.scale, truth.scale);
    println!("  Host rotation:   {:.2e} rad from truth", angle_error);
    println!("  Host residual:   {:.5}", host.residual);

    let fit = loss::procrustes_fit(
        points_tensor(&source, &device),
        points_tensor(&target, &device),
    )?;
    println!("  Tensor scale:    {:.4}", scalar(fit.scale));
    println!("  Tensor residual: {:.5}", scalar(fit.residual));
    println!();

    println!("┌─────────────────────────────────────────────────────────────┐");
    println!("│ Step 2: Closest Rotation                                    │");
    println!("└─────────────────────────────────────────────────────────────┘");
    let matrices: Vec<Matrix3<f64>> = (0..NUM_MATRICES)
        .map(|_| {
            let r = Rotation3::from_euler_angles(
                rng.gen_range(-3.0..3.0),
                rng.gen_range(-1.5..1.5),
                rng.gen_range(-3.0..3.0),
            );
            r.matrix() + Matrix3::from_fn(|_, _| rng.gen_range(-0.2..0.2))
        })
        .collect();

    let values: Vec<f32> = matrices
        .iter()
        .flat_map(|m| m.transpose().iter().map(|&v| v as f32).collect::<Vec<_>>())
        .collect();
    let batch = Tensor::<DemoBackend, 3>::from_data(TensorData::new(values, [NUM_MATRICES, 3, 3]), &device);
    let rotations = loss::closest_rotation(batch.clone())?;
    let residuals: Vec<f32> = (batch.clone() - rotations)
        .powf_scalar(2.0)
        .reshape([NUM_MATRICES, 9])
        .sum_dim(1)
        .sqrt()
        .into_data()
        .iter::<f32>()
        .collect();

    for (i, (m, tensor_residual)) in matrices.iter().zip(&residuals).enumerate() {
        let factors = closest_rotation(m)?;
        let host_residual = rotation_residual(m)?;
        println!(
            "  [{}] det(R)={:+.3} host={:.5} tensor={:.5}",
            i,
            factors.rotation.determinant(),
            host_residual,
            tensor_residual
        );
    }
    println!("  Batch mean:      {:.5}", scalar(loss::rotation_residual(batch)?));
    println!();

    println!("┌─────────────────────────────────────────────────────────────┐");
    println!("│ Step 3: Mirrored Input                                      │");
    println!("└─────────────────────────────────────────────────────────────┘");
    let mirror = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, -1.0));
    let factors = closest_rotation(&(mirror * 1.5))?;
    println!("  Reflected:       {}", factors.reflected);
    println!("  det(R):          {:+.3}", factors.rotation.determinant());
    println!("  Residual:        {:.5}", rotation_residual(&(mirror * 1.5))?);
    Ok(())
}

fn points_tensor(points: &[Point3], device: &<DemoBackend as Backend>::Device) -> Tensor<DemoBackend, 2> {
    let values: Vec<f32> = points.iter().flat_map(|p| p.as_array()).collect();
    Tensor::from_data(TensorData::new(values, [points.len(), 3]), device)
}

fn scalar(t: Tensor<DemoBackend, 1>) -> f32 {
    t.into_data().iter::<f32>().next().unwrap_or(f32::NAN)
}
