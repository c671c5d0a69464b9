//! Sine-activated layers.

use burn::module::Module;
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::prelude::*;

/// Linear layer with the initialization sine networks need.
///
/// Weights are uniform in `±√(6 / fan_in)`, biases uniform in `±1 / √fan_in`.
pub fn siren_linear<B: Backend>(d_input: usize, d_output: usize, device: &B::Device) -> Linear<B> {
    let fan_in = d_input.max(1) as f64;
    let weight_bound = (6.0 / fan_in).sqrt();
    let bias_bound = 1.0 / fan_in.sqrt();

    let mut linear = LinearConfig::new(d_input, d_output)
        .with_initializer(Initializer::Uniform {
            min: -weight_bound,
            max: weight_bound,
        })
        .init(device);
    linear.bias = Some(
        Initializer::Uniform {
            min: -bias_bound,
            max: bias_bound,
        }
        .init([d_output], device),
    );
    linear
}

/// Push a tangent through a linear layer.
///
/// The bias drops out, so each `[dim, in]` slice is multiplied by the weight.
pub fn linear_tangent<B: Backend>(linear: &Linear<B>, tangent: Tensor<B, 3>) -> Tensor<B, 3> {
    let [batch, dim, width] = tangent.dims();
    let weight = linear.weight.val();
    let out = weight.dims()[1];
    tangent
        .reshape([batch * dim, width])
        .matmul(weight)
        .reshape([batch, dim, out])
}

/// A linear layer followed by `sin`.
#[derive(Module, Debug)]
pub struct SineLayer<B: Backend> {
    linear: Linear<B>,
}

impl<B: Backend> SineLayer<B> {
    /// Create a sine layer.
    pub fn new(d_input: usize, d_output: usize, device: &B::Device) -> Self {
        Self {
            linear: siren_linear(d_input, d_output, device),
        }
    }

    /// Forward pass. `[batch, d_input] -> [batch, d_output]`.
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        self.linear.forward(x).sin()
    }

    /// Forward pass carrying a `[batch, dim, d_input]` tangent.
    pub fn forward_with_tangent(
        &self,
        x: Tensor<B, 2>,
        tangent: Tensor<B, 3>,
    ) -> (Tensor<B, 2>, Tensor<B, 3>) {
        let z = self.linear.forward(x);
        let tangent = linear_tangent(&self.linear, tangent) * z.clone().cos().unsqueeze_dim::<3>(1);
        (z.sin(), tangent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_initialization_bounds() {
        let device = Default::default();
        let linear = siren_linear::<TestBackend>(24, 16, &device);

        let bound = (6.0f32 / 24.0).sqrt();
        let weights: Vec<f32> = linear.weight.val().into_data().to_vec().unwrap();
        assert_eq!(weights.len(), 24 * 16);
        assert!(weights.iter().all(|w| w.abs() <= bound));

        let bias_bound = 1.0 / 24.0f32.sqrt();
        let bias: Vec<f32> = linear
            .bias
            .as_ref()
            .unwrap()
            .val()
            .into_data()
            .to_vec()
            .unwrap();
        assert!(bias.iter().all(|b| b.abs() <= bias_bound));
    }

    #[test]
    fn test_sine_output_range() {
        let device = Default::default();
        let layer = SineLayer::<TestBackend>::new(3, 8, &device);
        let x = Tensor::<TestBackend, 2>::random(
            [32, 3],
            burn::tensor::Distribution::Uniform(-5.0, 5.0),
            &device,
        );

        let y: Vec<f32> = layer.forward(x).into_data().to_vec().unwrap();
        assert!(y.iter().all(|v| v.abs() <= 1.0));
    }
}
