//! End-to-end training, checkpoint and error-path tests.

use burn::backend::{Autodiff, NdArray};
use burn::prelude::*;

use neural_deform::data::{Batch, InMemoryDataset};
use neural_deform::loss::LossComposer;
use neural_deform::prelude::*;

type TestBackend = Autodiff<NdArray>;

fn to_vec<B: Backend, const D: usize>(t: Tensor<B, D>) -> Vec<f32> {
    t.into_data().iter::<f32>().collect()
}

/// Two identity-mapped surface points, one offset skull point, one jaw point.
fn head_samples() -> Vec<Sample<HeadRegion>> {
    let a = Point3::new(0.1, 0.2, 0.3);
    let b = Point3::new(-0.2, 0.1, 0.4);
    let skull = Point3::new(0.3, -0.1, 0.2);
    let jaw = Point3::new(0.0, 0.3, -0.2);
    vec![
        Sample::new(a, HeadRegion::Surface, a),
        Sample::new(b, HeadRegion::Surface, b),
        Sample::new(skull, HeadRegion::Skull, skull + Point3::splat(0.05)),
        Sample::new(jaw, HeadRegion::Jaw, jaw),
    ]
}

fn head_config(learning_rate: f64, num_epochs: usize) -> TrainingConfig {
    TrainingConfig::new(
        CoordinateNetworkConfig::new()
            .with_with_fourier(false)
            .with_num_hidden_layers(1)
            .with_hidden_size(32),
    )
    .with_mode(TrainingMode::FullHead)
    .with_batch_size(4)
    .with_num_epochs(num_epochs)
    .with_learning_rate(learning_rate)
    .with_log_interval(10)
}

fn max_surface_error(network: &CoordinateNetwork<TestBackend>, device: &<TestBackend as Backend>::Device) -> f32 {
    let samples = head_samples();
    let surface: Vec<_> = samples
        .iter()
        .filter(|s| s.region == HeadRegion::Surface)
        .collect();
    let inputs: Vec<f32> = surface.iter().flat_map(|s| s.coordinate.as_array()).collect();
    let x = Tensor::<TestBackend, 2>::from_data(TensorData::new(inputs, [surface.len(), 3]), device);
    let predicted = to_vec(network.predict(x));

    surface
        .iter()
        .enumerate()
        .flat_map(|(i, s)| {
            let target = s.target.as_array();
            (0..3).map(move |k| (i, k, target[k]))
        })
        .map(|(i, k, t)| (predicted[i * 3 + k] - t).abs())
        .fold(0.0, f32::max)
}

#[test]
fn test_full_head_loss_decreases_over_fifty_steps() {
    let device = Default::default();
    let config = head_config(3e-3, 50);
    let composer = config.full_head_loss.init();
    let mut trainer = AdamTrainer::<TestBackend, _>::with_adam(config, composer, device).unwrap();
    let mut dataset = InMemoryDataset::new(head_samples()).unwrap();

    let reports = trainer.fit(&mut dataset).unwrap();

    assert_eq!(reports.len(), 50);
    assert_eq!(trainer.total_steps(), 50);
    assert!(reports.iter().all(|r| r.num_batches == 1 && r.num_samples == 4));
    // A single jaw point is below the alignment threshold.
    assert!(reports.iter().all(|r| r.term("jaw") == Some(0.0)));

    let first = reports[0].mean_loss;
    let last = reports[49].mean_loss;
    assert!(last < first, "loss did not decrease: {} -> {}", first, last);
}

/// Adam on an L1 loss levels off around 3e-2 surface error after 50 steps at
/// any usable rate, so convergence to 1e-2 is checked on a longer, slower run.
#[test]
fn test_full_head_surface_converges() {
    let device: <TestBackend as Backend>::Device = Default::default();
    let config = head_config(2e-4, 800);
    let composer = config.full_head_loss.init();
    let mut trainer =
        AdamTrainer::<TestBackend, _>::with_adam(config, composer, device.clone()).unwrap();
    let mut dataset = InMemoryDataset::new(head_samples()).unwrap();

    let initial = max_surface_error(trainer.network(), &device);
    let reports = trainer.fit(&mut dataset).unwrap();
    assert!(reports.iter().all(|r| r.is_finite()));

    let error = max_surface_error(trainer.network(), &device);
    assert!(
        error < 1e-2,
        "surface error {} (started at {}) did not converge",
        error,
        initial
    );
}

#[test]
fn test_absent_regions_contribute_zero() {
    let device = Default::default();
    let network = CoordinateNetworkConfig::new()
        .with_fourier_features(3)
        .init::<TestBackend>(&device);
    let samples: Vec<_> = head_samples()
        .into_iter()
        .filter(|s| s.region == HeadRegion::Surface)
        .collect();
    let batch = Batch::<TestBackend, HeadRegion>::from_samples(&samples, &device).unwrap();

    let output = FullHeadLossConfig::new()
        .init()
        .process_batch(&network, &batch)
        .unwrap();

    let skull = to_vec(output.term("skull").unwrap().clone())[0];
    let jaw = to_vec(output.term("jaw").unwrap().clone())[0];
    assert_eq!(skull, 0.0);
    assert_eq!(jaw, 0.0);

    let total = to_vec(output.total.clone())[0];
    assert!(total.is_finite() && total > 0.0);

    // The composed loss stays differentiable.
    let _grads = output.total.backward();
}

#[test]
fn test_surface_mode_trains() {
    let device = Default::default();
    let config = TrainingConfig::fast()
        .with_mode(TrainingMode::Surface)
        .with_batch_size(8)
        .with_num_epochs(5);
    let composer = config.surface_loss.init();
    let mut trainer = AdamTrainer::<TestBackend, _>::with_adam(config, composer, device).unwrap();

    let samples: Vec<_> = (0..20)
        .map(|i| {
            let t = i as f32 / 20.0;
            let p = Point3::new(t, (2.0 * t).cos() * 0.3, t * t);
            let region = if i % 4 == 0 {
                SurfaceRegion::Boundary
            } else {
                SurfaceRegion::Flame
            };
            Sample::new(p, region, p + Point3::new(0.0, 0.02, 0.0))
        })
        .collect();
    let mut dataset = InMemoryDataset::new(samples).unwrap().with_shuffle(3);

    let reports = trainer.fit(&mut dataset).unwrap();
    // 20 / 8 = 2 batches, the remaining 4 samples are left out of the epoch.
    assert!(reports.iter().all(|r| r.num_batches == 2 && r.num_samples == 16));
    assert!(reports.iter().all(|r| r.is_finite()));
    assert!(reports[0].term("deformation").is_some());
}

#[test]
fn test_simulator_mode_trains() {
    let device = Default::default();
    let config = TrainingConfig::fast()
        .with_mode(TrainingMode::Simulator)
        .with_batch_size(16)
        .with_num_epochs(30)
        .with_learning_rate(1e-3);
    let composer = config.simulator_loss.init();
    let mut trainer = AdamTrainer::<TestBackend, _>::with_adam(config, composer, device).unwrap();

    let samples: Vec<_> = (0..16)
        .map(|i| {
            let t = i as f32 / 16.0;
            let p = Point3::new(t - 0.5, (3.0 * t).sin() * 0.4, 0.2 * t);
            let s = 1.0 + 0.1 * t;
            let actuation = [[s, 0.0, 0.0], [0.0, 1.0 / s, 0.0], [0.0, 0.0, 1.0]];
            let region = if i < 4 { SimRegion::Fixed } else { SimRegion::Free };
            Sample::new(p, region, p).with_actuation(actuation)
        })
        .collect();
    let mut dataset = InMemoryDataset::new(samples).unwrap();

    let reports = trainer.fit(&mut dataset).unwrap();
    assert_eq!(reports.len(), 30);
    assert!(reports.iter().all(|r| r.is_finite()));
    assert!(reports[29].mean_loss < reports[0].mean_loss);
    assert!(reports[0].term("energy").is_some());
}

#[test]
fn test_actuations_rejected_outside_simulator() {
    let device = Default::default();
    let config = head_config(1e-3, 1);
    let composer = config.full_head_loss.init();
    let mut trainer = AdamTrainer::<TestBackend, _>::with_adam(config, composer, device).unwrap();

    let eye = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    let samples: Vec<_> = head_samples().into_iter().map(|s| s.with_actuation(eye)).collect();
    let mut dataset = InMemoryDataset::new(samples).unwrap();

    let result = trainer.train_epoch(&mut dataset);
    assert!(matches!(
        result,
        Err(DeformError::UnexpectedActuations { mode: "full_head" })
    ));
}

#[test]
fn test_simulator_requires_actuations() {
    let device = Default::default();
    let config = TrainingConfig::fast().with_mode(TrainingMode::Simulator);
    let composer = config.simulator_loss.init();
    let mut trainer = AdamTrainer::<TestBackend, _>::with_adam(config, composer, device).unwrap();

    let samples = vec![Sample::new(Point3::splat(0.0), SimRegion::Fixed, Point3::splat(0.0))];
    let mut dataset = InMemoryDataset::new(samples).unwrap();

    assert!(matches!(
        trainer.train_epoch(&mut dataset),
        Err(DeformError::MissingActuations { .. })
    ));
}

#[test]
fn test_empty_dataset() {
    let device = Default::default();
    let config = head_config(1e-3, 1);
    let composer = config.full_head_loss.init();
    let mut trainer = AdamTrainer::<TestBackend, _>::with_adam(config, composer, device).unwrap();
    let mut dataset = InMemoryDataset::<HeadRegion>::new(Vec::new()).unwrap();

    assert!(matches!(
        trainer.train_epoch(&mut dataset),
        Err(DeformError::EmptyDataset)
    ));
}

#[test]
fn test_invalid_config_rejected() {
    let device = Default::default();
    let config = head_config(1e-3, 1).with_batch_size(0);
    let composer = config.full_head_loss.init();
    let result = AdamTrainer::<TestBackend, _>::with_adam(config, composer, device);
    assert!(matches!(result, Err(DeformError::InvalidConfig { .. })));
}

#[test]
fn test_checkpoint_roundtrip() {
    let device = Default::default();
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("run").join("head");

    let mut config = head_config(1e-3, 3);
    config.network = CoordinateNetworkConfig::new()
        .with_fourier_features(3)
        .with_num_hidden_layers(2)
        .with_use_sigmoid_output(true);
    let composer = config.full_head_loss.init();
    let mut trainer = AdamTrainer::<TestBackend, _>::with_adam(config, composer, device).unwrap();
    let mut dataset = InMemoryDataset::new(head_samples()).unwrap();
    let reports = trainer.fit(&mut dataset).unwrap();

    let metadata = CheckpointMetadata::at(
        trainer.epoch(),
        trainer.total_steps(),
        reports[2].mean_loss,
        trainer.best_loss(),
    );
    save_checkpoint(&base, trainer.network(), trainer.config(), &metadata).unwrap();
    assert!(checkpoint_exists(&base));

    let ndarray_device = Default::default();
    let (loaded, loaded_config, loaded_meta) =
        load_checkpoint::<NdArray>(&base, &ndarray_device).unwrap();
    assert_eq!(loaded_config.network.num_hidden_layers, 2);
    assert!(loaded_config.network.use_sigmoid_output);
    assert_eq!(loaded_meta.epoch, 3);
    assert_eq!(loaded_meta.total_steps, 3);

    let probe = [[0.05f32, -0.3, 0.2], [0.4, 0.1, -0.25], [-0.15, 0.35, 0.0]];
    let original = to_vec(
        trainer
            .network()
            .predict(Tensor::<TestBackend, 2>::from_floats(probe, trainer.device())),
    );
    let restored = to_vec(loaded.predict(Tensor::<NdArray, 2>::from_floats(probe, &ndarray_device)));

    for (a, b) in original.iter().zip(&restored) {
        assert!((a - b).abs() < 1e-6, "prediction changed after reload: {} vs {}", a, b);
    }
}
