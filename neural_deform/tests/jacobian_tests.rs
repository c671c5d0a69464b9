//! Integration tests for the per-sample Jacobian.

use burn::backend::{Autodiff, NdArray};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;

use neural_deform::config::CoordinateNetworkConfig;
use neural_deform::loss::deformation_loss;
use neural_deform::nn::CoordinateNetwork;

type TestBackend = NdArray;
type AutodiffBackend = Autodiff<NdArray>;

fn to_vec<B: Backend, const D: usize>(t: Tensor<B, D>) -> Vec<f32> {
    t.into_data().iter::<f32>().collect()
}

fn coords<B: Backend>(device: &B::Device) -> Tensor<B, 2> {
    Tensor::from_floats(
        [
            [0.10, 0.20, -0.30],
            [-0.45, 0.05, 0.25],
            [0.30, -0.35, 0.40],
            [0.00, 0.15, 0.05],
            [-0.20, -0.25, -0.10],
            [0.40, 0.40, 0.35],
        ],
        device,
    )
}

/// Jacobian by reverse mode: one backward pass per output component.
fn autodiff_jacobian(network: &CoordinateNetwork<AutodiffBackend>, x: Tensor<AutodiffBackend, 2>) -> Vec<f32> {
    let [n, d] = x.dims();
    let mut out = vec![0.0f32; n * 3 * d];
    for o in 0..3 {
        let x = x.clone().require_grad();
        let y = network.forward(x.clone());
        let grads = y.slice([0..n, o..o + 1]).sum().backward();
        let g = to_vec(x.grad(&grads).unwrap());
        for s in 0..n {
            for c in 0..d {
                out[s * 3 * d + o * d + c] = g[s * d + c];
            }
        }
    }
    out
}

fn assert_matches_autodiff(config: CoordinateNetworkConfig) {
    let device = Default::default();
    let network = config.init::<AutodiffBackend>(&device);
    let x = coords::<AutodiffBackend>(&device);

    let expected = autodiff_jacobian(&network, x.clone());
    let got = to_vec(network.jacobian(x));

    assert_eq!(expected.len(), got.len());
    for (i, (e, g)) in expected.iter().zip(&got).enumerate() {
        assert!(
            (e - g).abs() < 1e-4 * e.abs().max(1.0),
            "entry {}: autodiff {} vs tangent {}",
            i,
            e,
            g
        );
    }
}

#[test]
fn test_jacobian_matches_autodiff_with_fourier() {
    assert_matches_autodiff(CoordinateNetworkConfig::new().with_fourier_features(4));
}

#[test]
fn test_jacobian_matches_autodiff_without_fourier() {
    assert_matches_autodiff(CoordinateNetworkConfig::new().with_with_fourier(false));
}

#[test]
fn test_jacobian_matches_autodiff_with_rescale() {
    assert_matches_autodiff(
        CoordinateNetworkConfig::new()
            .with_fourier_features(3)
            .with_num_hidden_layers(1)
            .with_use_sigmoid_output(true),
    );
}

#[test]
fn test_jacobian_matches_finite_differences() {
    let device = Default::default();
    let network = CoordinateNetworkConfig::new()
        .with_fourier_features(2)
        .with_num_hidden_layers(1)
        .init::<TestBackend>(&device);
    let x = coords::<TestBackend>(&device);
    let [n, _] = x.dims();
    let jacobian = to_vec(network.jacobian(x.clone()));
    let base = to_vec(x);

    let h = 1e-3f32;
    for c in 0..3 {
        let shifted = |delta: f32| {
            let mut values = base.clone();
            for s in 0..n {
                values[s * 3 + c] += delta;
            }
            let t = Tensor::<TestBackend, 2>::from_data(TensorData::new(values, [n, 3]), &device);
            to_vec(network.forward(t))
        };
        let plus = shifted(h);
        let minus = shifted(-h);
        for s in 0..n {
            for o in 0..3 {
                let fd = (plus[s * 3 + o] - minus[s * 3 + o]) / (2.0 * h);
                let j = jacobian[s * 9 + o * 3 + c];
                assert!(
                    (fd - j).abs() < 1e-2 * j.abs().max(1.0),
                    "sample {} d{}/dx{}: finite difference {} vs {}",
                    s,
                    o,
                    c,
                    fd,
                    j
                );
            }
        }
    }
}

#[test]
fn test_jacobian_is_per_sample() {
    let device = Default::default();
    let network = CoordinateNetworkConfig::new().init::<TestBackend>(&device);
    let x = coords::<TestBackend>(&device);
    let [n, _] = x.dims();

    let batched = to_vec(network.jacobian(x.clone()));
    for s in 0..n {
        let single = x.clone().slice([s..s + 1, 0..3]);
        let alone = to_vec(network.jacobian(single));
        for k in 0..9 {
            assert!(
                (batched[s * 9 + k] - alone[k]).abs() < 1e-5,
                "sample {} entry {} depends on the rest of the batch",
                s,
                k
            );
        }
    }
}

#[test]
fn test_jacobian_loss_reaches_parameters() {
    let device = Default::default();
    let network = CoordinateNetworkConfig::new()
        .with_fourier_features(3)
        .with_num_hidden_layers(1)
        .init::<AutodiffBackend>(&device);
    let x = coords::<AutodiffBackend>(&device);
    let before = to_vec(network.jacobian(x.clone()));

    let loss = deformation_loss(network.jacobian(x.clone())).unwrap();
    let grads = GradientsParams::from_grads(loss.backward(), &network);
    let mut optim = AdamConfig::new().init();
    let updated = optim.step(1e-2, network, grads);

    let after = to_vec(updated.jacobian(x));
    let moved = before
        .iter()
        .zip(&after)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0f32, f32::max);
    assert!(moved > 1e-5, "a loss on the Jacobian did not update the network");
}
