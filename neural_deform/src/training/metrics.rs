//! Epoch metrics.

use core::fmt;

/// Summary of one training epoch.
#[derive(Debug, Clone, Default)]
pub struct EpochReport {
    /// Zero-based epoch index.
    pub epoch: usize,
    /// Sample-weighted mean of the batch losses.
    pub mean_loss: f32,
    /// Sample-weighted mean of every weighted loss term.
    pub terms: Vec<(&'static str, f32)>,
    /// Optimizer steps taken.
    pub num_batches: usize,
    /// Samples seen.
    pub num_samples: usize,
}

impl EpochReport {
    /// Whether the mean loss and every term are finite.
    pub fn is_finite(&self) -> bool {
        self.mean_loss.is_finite() && self.terms.iter().all(|(_, v)| v.is_finite())
    }

    /// Look up a term by name.
    pub fn term(&self, name: &str) -> Option<f32> {
        self.terms.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    /// Log the report at info level.
    pub fn log(&self, prefix: &str) {
        log::info!("{} {}", prefix, self);
    }
}

impl fmt::Display for EpochReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "epoch={} loss={:.6} batches={} samples={}",
            self.epoch, self.mean_loss, self.num_batches, self.num_samples
        )?;
        for (name, value) in &self.terms {
            write!(f, " {}={:.6}", name, value)?;
        }
        Ok(())
    }
}

/// Sample-weighted running sums of the loss and its terms.
#[derive(Debug, Clone, Default)]
pub struct TermAccumulator {
    total: f64,
    terms: Vec<(&'static str, f64)>,
    samples: usize,
    batches: usize,
}

impl TermAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one batch of `samples` samples.
    pub fn push(&mut self, loss: f32, terms: &[(&'static str, f32)], samples: usize) {
        let weight = samples as f64;
        self.total += loss as f64 * weight;
        for &(name, value) in terms {
            match self.terms.iter_mut().find(|(n, _)| *n == name) {
                Some((_, sum)) => *sum += value as f64 * weight,
                None => self.terms.push((name, value as f64 * weight)),
            }
        }
        self.samples += samples;
        self.batches += 1;
    }

    /// Finish into a report for `epoch`.
    pub fn finish(self, epoch: usize) -> EpochReport {
        let denom = self.samples.max(1) as f64;
        EpochReport {
            epoch,
            mean_loss: (self.total / denom) as f32,
            terms: self
                .terms
                .into_iter()
                .map(|(n, v)| (n, (v / denom) as f32))
                .collect(),
            num_batches: self.batches,
            num_samples: self.samples,
        }
    }
}
