//! Batches and the dataset contract consumed by the trainer.

mod batch;
mod dataset;

pub use batch::{select_rows, Batch};
pub use dataset::{Dataset, InMemoryDataset};
