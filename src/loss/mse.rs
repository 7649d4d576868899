use crate::data::dataset::TrainingData;
use crate::error::Result;
use crate::network::network::Network;

pub struct MseLoss;

impl MseLoss {
    /// Squared error for one example: Σ (predicted - expected)² over outputs.
    pub fn squared_error(predicted: &[f64], expected: &[f64]) -> f64 {
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
    }

    /// Per-output gradient of ½·Σ(predicted - expected)²: predicted - expected.
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| a - b)
            .collect()
    }
}

/// Running mean-squared-error accumulator over a dataset pass.
///
/// Evaluation runs forward-only with dropout ignored (dropout is a
/// training-time regularizer), so accumulating never mutates the network
/// and two identical passes report identical values.
#[derive(Debug, Default)]
pub struct MseTracker {
    sum_sq: f64,
    count: usize,
}

impl MseTracker {
    pub fn new() -> MseTracker {
        MseTracker::default()
    }

    pub fn reset(&mut self) {
        self.sum_sq = 0.0;
        self.count = 0;
    }

    /// Runs one forward pass and adds the example's squared error.
    pub fn accumulate(&mut self, network: &Network, input: &[f64], target: &[f64]) -> Result<()> {
        let output = network.forward(input)?;
        self.sum_sq += MseLoss::squared_error(&output, target);
        self.count += 1;
        Ok(())
    }

    /// Mean squared error over everything accumulated since the last reset.
    pub fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum_sq / self.count as f64
        }
    }
}

/// MSE of `network` over a whole dataset. Forward-only and idempotent.
pub fn evaluate_mse(network: &Network, data: &TrainingData) -> Result<f64> {
    let mut tracker = MseTracker::new();
    for i in 0..data.len() {
        let (input, target) = data.example(i);
        tracker.accumulate(network, input, target)?;
    }
    Ok(tracker.value())
}
