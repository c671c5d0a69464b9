//! The coordinate network and its per-sample Jacobian.

use burn::module::{Module, Param};
use burn::nn::Linear;
use burn::prelude::*;
use burn::tensor::activation::sigmoid;

use super::fourier::{identity, FourierEncoder};
use super::siren::{linear_tangent, siren_linear, SineLayer};
use crate::config::CoordinateNetworkConfig;

/// Something that can be fed to [`CoordinateNetwork::forward`].
///
/// A single coordinate `[dim]` is promoted to a batch of one.
pub trait CoordinateInput<B: Backend> {
    /// Convert into a `[batch, dim]` tensor.
    fn into_batch(self) -> Tensor<B, 2>;
}

impl<B: Backend> CoordinateInput<B> for Tensor<B, 1> {
    fn into_batch(self) -> Tensor<B, 2> {
        self.unsqueeze()
    }
}

impl<B: Backend> CoordinateInput<B> for Tensor<B, 2> {
    fn into_batch(self) -> Tensor<B, 2> {
        self
    }
}

/// Learned affine rescale applied after a sigmoid: `sigmoid(x)·scale + translation`.
#[derive(Module, Debug)]
pub struct OutputRescale<B: Backend> {
    scale: Param<Tensor<B, 1>>,
    translation: Param<Tensor<B, 1>>,
}

impl<B: Backend> OutputRescale<B> {
    /// Start as a plain sigmoid: scale 1, translation 0.
    pub fn new(device: &B::Device) -> Self {
        Self {
            scale: Param::from_tensor(Tensor::ones([1], device)),
            translation: Param::from_tensor(Tensor::zeros([1], device)),
        }
    }

    /// Current scale.
    pub fn scale(&self) -> Tensor<B, 1> {
        self.scale.val()
    }

    /// Current translation.
    pub fn translation(&self) -> Tensor<B, 1> {
        self.translation.val()
    }

    fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        sigmoid(x) * self.scale.val().reshape([1, 1]) + self.translation.val().reshape([1, 1])
    }

    fn forward_with_tangent(
        &self,
        x: Tensor<B, 2>,
        tangent: Tensor<B, 3>,
    ) -> (Tensor<B, 2>, Tensor<B, 3>) {
        let s = sigmoid(x);
        let ds = s.clone() * (s.clone().neg() + 1.0);
        let scale = self.scale.val();
        let tangent = tangent * ds.unsqueeze_dim::<3>(1) * scale.clone().reshape([1, 1, 1]);
        let y = s * scale.reshape([1, 1]) + self.translation.val().reshape([1, 1]);
        (y, tangent)
    }
}

/// Sine-activated coordinate network.
///
/// `[encode] -> linear -> sin -> (linear -> sin) x num_hidden_layers -> linear [-> rescale]`
#[derive(Module, Debug)]
pub struct CoordinateNetwork<B: Backend> {
    encoder: Option<FourierEncoder<B>>,
    input: SineLayer<B>,
    hidden: Vec<SineLayer<B>>,
    output: Linear<B>,
    rescale: Option<OutputRescale<B>>,
    input_size: usize,
    output_size: usize,
}

impl CoordinateNetworkConfig {
    /// Initialize a network on `device`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> CoordinateNetwork<B> {
        let encoder = self
            .with_fourier
            .then(|| FourierEncoder::new(self.fourier_features, device));
        let input = SineLayer::new(self.encoded_size(), self.hidden_size, device);
        let hidden = (0..self.num_hidden_layers)
            .map(|_| SineLayer::new(self.hidden_size, self.hidden_size, device))
            .collect();
        let output = siren_linear(self.hidden_size, self.output_size, device);
        let rescale = self.use_sigmoid_output.then(|| OutputRescale::new(device));

        CoordinateNetwork {
            encoder,
            input,
            hidden,
            output,
            rescale,
            input_size: self.input_size,
            output_size: self.output_size,
        }
    }
}

impl<B: Backend> CoordinateNetwork<B> {
    /// Input coordinate dimension.
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Output dimension.
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// The output rescale, when enabled.
    pub fn rescale(&self) -> Option<&OutputRescale<B>> {
        self.rescale.as_ref()
    }

    /// Forward pass.
    ///
    /// Accepts a `[batch, dim]` tensor or a single `[dim]` coordinate, which
    /// yields a `[1, output_size]` prediction.
    pub fn forward<I: CoordinateInput<B>>(&self, input: I) -> Tensor<B, 2> {
        let mut x = input.into_batch();
        if let Some(encoder) = &self.encoder {
            x = encoder.forward(x);
        }
        x = self.input.forward(x);
        for layer in &self.hidden {
            x = layer.forward(x);
        }
        let x = self.output.forward(x);
        match &self.rescale {
            Some(rescale) => rescale.forward(x),
            None => x,
        }
    }

    /// Inference pass without gradient tracking.
    ///
    /// Parameters and input are detached before the forward pass, so an
    /// autodiff backend records no graph.
    pub fn predict<I: CoordinateInput<B>>(&self, input: I) -> Tensor<B, 2> {
        self.clone().no_grad().forward(input.into_batch().detach())
    }

    /// Prediction and per-sample Jacobian from one pass.
    ///
    /// Returns `([batch, output_size], [batch, output_size, input_size])` with
    /// `J[n, o, c] = ∂out[n, o] / ∂x[n, c]`. Both stay attached to the graph,
    /// so a loss on the Jacobian trains the parameters.
    pub fn forward_with_jacobian(&self, coords: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 3>) {
        let [batch, dim] = coords.dims();
        let device = coords.device();

        let (x, tangent) = match &self.encoder {
            Some(encoder) => encoder.forward_with_tangent(coords),
            None => {
                let seed = identity::<B>(dim, &device)
                    .unsqueeze_dim::<3>(0)
                    .repeat_dim(0, batch);
                (coords, seed)
            }
        };

        let (mut x, mut tangent) = self.input.forward_with_tangent(x, tangent);
        for layer in &self.hidden {
            (x, tangent) = layer.forward_with_tangent(x, tangent);
        }

        let mut y = self.output.forward(x);
        tangent = linear_tangent(&self.output, tangent);
        if let Some(rescale) = &self.rescale {
            (y, tangent) = rescale.forward_with_tangent(y, tangent);
        }

        (y, tangent.swap_dims(1, 2))
    }

    /// Per-sample Jacobian `[batch, output_size, input_size]`.
    pub fn jacobian(&self, coords: Tensor<B, 2>) -> Tensor<B, 3> {
        self.forward_with_jacobian(coords).1
    }
}
