//! Synthetic Deformation Training
//!
//! Trains a coordinate network on a procedurally generated head-like point
//! cloud in any of the three training modes:
//! 1. Generate samples for the chosen mode
//! 2. Train with Adam, logging every `log_interval` epochs
//! 3. Save a checkpoint and reload it on the inference backend
//! 4. Evaluate per-region errors on the reloaded network
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release --bin train_synthetic -- full-head output/head
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;
use std::time::Instant;

use burn::backend::{Autodiff, NdArray};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use neural_deform::data::Dataset;
use neural_deform::prelude::*;

type TrainBackend = Autodiff<NdArray>;
type InferBackend = NdArray;

const NUM_SAMPLES: usize = 512;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("═══════════════════════════════════════════════════════════════");
    println!("          Synthetic Deformation Training");
    println!("═══════════════════════════════════════════════════════════════");
    println!();

    let args: Vec<String> = env::args().collect();
    let mode = match args.get(1).map(|s| TrainingMode::from_str(s)) {
        Some(Ok(mode)) => mode,
        Some(Err(e)) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
        None => {
            println!("Usage: {} <surface|full-head|simulator> [checkpoint_base]", args[0]);
            println!();
            println!("Using default: full-head");
            TrainingMode::FullHead
        }
    };
    let base = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("output/{}", mode)));

    let config = TrainingConfig::new(CoordinateNetworkConfig::new().with_fourier_features(4))
        .with_mode(mode)
        .with_batch_size(64)
        .with_num_epochs(200)
        .with_learning_rate(1e-4)
        .with_log_interval(20);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let result = match mode {
        TrainingMode::Surface => {
            let composer = config.surface_loss.init();
            run(config, composer, surface_samples(&mut rng), &base)
        }
        TrainingMode::FullHead => {
            let composer = config.full_head_loss.init();
            run(config, composer, head_samples(&mut rng), &base)
        }
        TrainingMode::Simulator => {
            let composer = config.simulator_loss.init();
            run(config, composer, simulator_samples(&mut rng), &base)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run<R, L>(config: TrainingConfig, composer: L, samples: Vec<Sample<R>>, base: &Path) -> Result<()>
where
    R: RegionMask,
    L: LossComposer<TrainBackend, Region = R>,
{
    println!("┌─────────────────────────────────────────────────────────────┐");
    println!("│ Step 1: Generate Samples                                    │");
    println!("└─────────────────────────────────────────────────────────────┘");
    let mut dataset = InMemoryDataset::new(samples)?.with_shuffle(config.seed);
    println!("  Mode:            {}", config.mode);
    println!("  Samples:         {}", dataset.len());
    for &region in R::ALL {
        println!("  {:<16} {}", format!("{}:", region.name()), dataset.count(region));
    }
    println!();

    println!("┌─────────────────────────────────────────────────────────────┐");
    println!("│ Step 2: Train                                               │");
    println!("└─────────────────────────────────────────────────────────────┘");
    let device = Default::default();
    let mut trainer = AdamTrainer::<TrainBackend, _>::with_adam(config, composer, device)?;
    let start = Instant::now();
    let reports = trainer.fit(&mut dataset)?;
    let elapsed = start.elapsed();

    let last = match reports.last() {
        Some(report) => report,
        None => {
            println!("  No epochs configured, nothing to save.");
            return Ok(());
        }
    };
    if !last.is_finite() {
        return Err(DeformError::InvalidConfig {
            message: format!("training diverged at epoch {}", last.epoch),
        });
    }
    println!("  Epochs:          {}", trainer.epoch());
    println!("  Steps:           {}", trainer.total_steps());
    println!("  Final loss:      {:.6}", last.mean_loss);
    println!("  Train time:      {:.2}s", elapsed.as_secs_f64());
    println!();

    println!("┌─────────────────────────────────────────────────────────────┐");
    println!("│ Step 3: Checkpoint                                          │");
    println!("└─────────────────────────────────────────────────────────────┘");
    let metadata = CheckpointMetadata::at(
        trainer.epoch(),
        trainer.total_steps(),
        last.mean_loss,
        trainer.best_loss(),
    );
    save_checkpoint(base, trainer.network(), trainer.config(), &metadata)?;

    let device = Default::default();
    let (network, config, metadata) = load_checkpoint::<InferBackend>(base, &device)?;
    println!("  Saved to:        {}", base.display());
    println!("  Reloaded epoch:  {}", metadata.epoch);
    println!();

    println!("┌─────────────────────────────────────────────────────────────┐");
    println!("│ Step 4: Evaluate                                            │");
    println!("└─────────────────────────────────────────────────────────────┘");
    let report = evaluate(&network, &dataset, config.batch_size, &device)?;
    report.log();
    for region in &report.regions {
        let residual = region
            .procrustes_residual
            .map_or_else(|| "-".to_string(), |r| format!("{:.5}", r));
        println!(
            "  {:<10} n={:<5} mean={:.5} max={:.5} procrustes={}",
            region.name, region.count, region.mean_error, region.max_error, residual
        );
    }
    println!("  Overall mean:    {:.5}", report.mean_error);
    Ok(())
}

/// Point on the unit sphere scaled by a random radius in `[r_min, r_max]`.
fn random_point(rng: &mut StdRng, r_min: f32, r_max: f32) -> Point3 {
    loop {
        let p = Point3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let len = p.length();
        if len > 1e-3 && len <= 1.0 {
            return p / len * rng.gen_range(r_min..r_max);
        }
    }
}

/// Smooth outward bulge on the front of the face.
fn bulge(p: Point3) -> Point3 {
    let amount = 0.05 * (-(p.y * p.y + (p.z - 0.5) * (p.z - 0.5)) * 4.0).exp();
    p + Point3::new(0.0, 0.0, amount)
}

/// Rotate about the x axis through a hinge point.
fn open_jaw(p: Point3, angle: f32) -> Point3 {
    let hinge = Point3::new(0.0, -0.1, -0.2);
    let d = p - hinge;
    let (s, c) = angle.sin_cos();
    hinge + Point3::new(d.x, c * d.y - s * d.z, s * d.y + c * d.z)
}

fn surface_samples(rng: &mut StdRng) -> Vec<Sample<SurfaceRegion>> {
    (0..NUM_SAMPLES)
        .map(|_| {
            let p = random_point(rng, 0.95, 1.0);
            if p.z < -0.6 {
                Sample::new(p, SurfaceRegion::Boundary, p)
            } else {
                Sample::new(p, SurfaceRegion::Flame, bulge(p))
            }
        })
        .collect()
}

fn head_samples(rng: &mut StdRng) -> Vec<Sample<HeadRegion>> {
    (0..NUM_SAMPLES)
        .map(|i| match i % 4 {
            0 => {
                let p = random_point(rng, 0.3, 0.6);
                Sample::new(p, HeadRegion::Skull, p)
            }
            1 => {
                let p = random_point(rng, 0.2, 0.5);
                let p = Point3::new(p.x * 0.6, p.y - 0.4, p.z * 0.5);
                Sample::new(p, HeadRegion::Jaw, open_jaw(p, 0.15))
            }
            _ => {
                let p = random_point(rng, 0.95, 1.0);
                Sample::new(p, HeadRegion::Surface, bulge(p))
            }
        })
        .collect()
}

fn simulator_samples(rng: &mut StdRng) -> Vec<Sample<SimRegion>> {
    (0..NUM_SAMPLES)
        .map(|_| {
            let p = random_point(rng, 0.0, 1.0);
            // Contract along x and expand along y, more strongly towards the top.
            let s = 1.0 + 0.2 * (p.y + 1.0) * 0.5;
            let actuation = [[1.0 / s, 0.0, 0.0], [0.0, s, 0.0], [0.0, 0.0, 1.0]];
            let region = if p.y < -0.6 {
                SimRegion::Fixed
            } else {
                SimRegion::Free
            };
            Sample::new(p, region, p).with_actuation(actuation)
        })
        .collect()
}
