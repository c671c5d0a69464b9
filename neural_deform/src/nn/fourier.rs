//! Fourier positional encoder.

use burn::module::Module;
use burn::prelude::*;

/// Fourier positional encoding for coordinates.
///
/// Band `k` uses frequency `π·2^k`. For every input component the output holds
/// `fourier_features` sines followed by `fourier_features` cosines, and the
/// per-component blocks are concatenated in input order.
#[derive(Module, Debug)]
pub struct FourierEncoder<B: Backend> {
    /// Frequencies `π·2^k`, shape `[fourier_features]`.
    frequencies: Tensor<B, 1>,
    /// Number of frequency bands.
    num_features: usize,
}

impl<B: Backend> FourierEncoder<B> {
    /// Create an encoder with `num_features` bands.
    pub fn new(num_features: usize, device: &B::Device) -> Self {
        let frequencies: Vec<f32> = (0..num_features)
            .map(|k| core::f32::consts::PI * (k as f32).exp2())
            .collect();
        let frequencies = Tensor::from_data(TensorData::new(frequencies, [num_features]), device);

        Self {
            frequencies,
            num_features,
        }
    }

    /// Number of frequency bands.
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Output width for `input_dim` components.
    pub fn output_dim(&self, input_dim: usize) -> usize {
        input_dim * 2 * self.num_features
    }

    fn scaled(&self, coords: Tensor<B, 2>) -> Tensor<B, 3> {
        let [batch, dim] = coords.dims();
        let freqs = self.frequencies.clone().reshape([1, 1, self.num_features]);
        coords.reshape([batch, dim, 1]) * freqs
    }

    /// Encode coordinates.
    ///
    /// Input: `[batch, dim]`. Output: `[batch, dim * 2 * fourier_features]`.
    pub fn forward(&self, coords: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch, dim] = coords.dims();
        let scaled = self.scaled(coords);
        let encoded = Tensor::cat(vec![scaled.clone().sin(), scaled.cos()], 2);
        encoded.reshape([batch, self.output_dim(dim)])
    }

    /// Encode coordinates and return the encoding's tangent.
    ///
    /// The tangent has shape `[batch, dim, dim * 2 * fourier_features]` and
    /// entry `[n, c, j]` is the derivative of feature `j` with respect to input
    /// component `c`. Feature blocks of other components are exactly zero.
    pub fn forward_with_tangent(&self, coords: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 3>) {
        let [batch, dim] = coords.dims();
        let device = coords.device();
        let width = 2 * self.num_features;
        let freqs = self.frequencies.clone().reshape([1, 1, self.num_features]);

        let scaled = self.scaled(coords);
        let sin = scaled.clone().sin();
        let cos = scaled.cos();

        let encoded = Tensor::cat(vec![sin.clone(), cos.clone()], 2).reshape([batch, dim * width]);

        // d/dx sin(fx) = f cos(fx), d/dx cos(fx) = -f sin(fx)
        let local = Tensor::cat(vec![cos * freqs.clone(), sin.neg() * freqs], 2);

        // Spread each component's derivatives onto its own feature block.
        let blocks = local.unsqueeze_dim::<4>(1).repeat_dim(1, dim);
        let mask = identity::<B>(dim, &device).reshape([1, dim, dim, 1]);
        let tangent = (blocks * mask).reshape([batch, dim, dim * width]);

        (encoded, tangent)
    }
}

/// A `[dim, dim]` identity matrix.
pub(crate) fn identity<B: Backend>(dim: usize, device: &B::Device) -> Tensor<B, 2> {
    let mut values = vec![0.0f32; dim * dim];
    for i in 0..dim {
        values[i * dim + i] = 1.0;
    }
    Tensor::from_data(TensorData::new(values, [dim, dim]), device)
}
