//! Coordinate network configuration.

use burn::config::Config;

/// Configuration for the sine-activated coordinate network.
#[derive(Config, Debug)]
pub struct CoordinateNetworkConfig {
    /// Dimension of the input coordinate.
    #[config(default = 3)]
    pub input_size: usize,

    /// Dimension of the predicted displacement.
    #[config(default = 3)]
    pub output_size: usize,

    /// Number of hidden (linear + sine) blocks after the input block.
    #[config(default = 3)]
    pub num_hidden_layers: usize,

    /// Width of every hidden layer.
    #[config(default = 32)]
    pub hidden_size: usize,

    /// Whether to encode coordinates with Fourier features first.
    #[config(default = true)]
    pub with_fourier: bool,

    /// Number of frequency bands per input component.
    #[config(default = 10)]
    pub fourier_features: usize,

    /// Squash the output through a sigmoid followed by a learned affine rescale.
    #[config(default = false)]
    pub use_sigmoid_output: bool,
}

impl Default for CoordinateNetworkConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinateNetworkConfig {
    /// Width of the first linear layer's input.
    ///
    /// `input_size * 2 * fourier_features` with encoding, `input_size` without.
    pub fn encoded_size(&self) -> usize {
        if self.with_fourier {
            self.input_size * 2 * self.fourier_features
        } else {
            self.input_size
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.input_size == 0 || self.output_size == 0 {
            return Err("input_size and output_size must be > 0".to_string());
        }
        if self.hidden_size == 0 {
            return Err("hidden_size must be > 0".to_string());
        }
        if self.with_fourier && self.fourier_features == 0 {
            return Err("fourier_features must be > 0 when Fourier encoding is enabled".to_string());
        }
        // pi * 2^k leaves f32 precision well before this.
        if self.fourier_features > 24 {
            return Err(format!(
                "fourier_features must be <= 24, got {}",
                self.fourier_features
            ));
        }
        Ok(())
    }
}
