//! Neural network modules.
//!
//! Every layer exposes a plain `forward` and a `forward_with_tangent` that
//! also pushes per-sample input tangents through the layer. Tangents are laid
//! out `[batch, input_dim, features]` and never mix along the batch axis.

mod fourier;
mod network;
mod siren;

pub use fourier::FourierEncoder;
pub use network::{CoordinateInput, CoordinateNetwork, OutputRescale};
pub use siren::{linear_tangent, siren_linear, SineLayer};
