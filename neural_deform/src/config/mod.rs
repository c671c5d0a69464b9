//! Configuration types for networks, losses and training.
//!
//! Every struct derives Burn's `Config`, so defaults, `with_*` builders and
//! JSON persistence come for free.

mod loss;
mod network;
mod training;

pub use loss::{FullHeadLossConfig, SimulatorLossConfig, SurfaceLossConfig};
pub use network::CoordinateNetworkConfig;
pub use training::{TrainingConfig, TrainingMode};
