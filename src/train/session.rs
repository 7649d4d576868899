use crate::error::{Result, TrainError};

/// How weight updates are scaled when the merged gradient is applied.
///
/// `Incremental` mirrors the classic online algorithm: the summed gradient
/// is applied directly. Parallel execution turns "one update per example"
/// into per-worker partial sums merged once per epoch — a deliberate
/// semantic shift from strict online learning, kept because it makes the
/// epoch deterministic and the update atomic. `Batch` additionally averages
/// the merged gradient over the dataset size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainAlgorithm {
    Incremental,
    Batch,
}

/// When dropout masks are resampled.
///
/// `PerExample` is the statistically meaningful default; `PerEpoch` draws
/// one mask set for the whole epoch (shared by every worker) and changes
/// convergence behavior accordingly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskPolicy {
    PerExample,
    PerEpoch,
}

/// Hyperparameters for one training session.
///
/// Built and adjusted freely before training; a `TrainingSession` validates
/// it once on construction and never re-reads it from outside, so changing
/// the training setup means starting a new session.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub algorithm: TrainAlgorithm,
    pub learning_rate: f64,
    pub momentum: f64,
    pub do_dropout: bool,
    pub dropout_fraction: f64,
    pub mask_policy: MaskPolicy,
    pub workers: usize,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            algorithm: TrainAlgorithm::Incremental,
            learning_rate: 0.7,
            momentum: 0.0,
            do_dropout: false,
            dropout_fraction: 0.0,
            mask_policy: MaskPolicy::PerExample,
            workers: 1,
            seed: 0,
        }
    }
}

impl TrainingConfig {
    pub fn set_do_dropout(&mut self, enabled: bool) -> &mut Self {
        self.do_dropout = enabled;
        self
    }

    pub fn set_dropout_fraction(&mut self, fraction: f64) -> &mut Self {
        self.dropout_fraction = fraction;
        self
    }

    pub fn set_learning_momentum(&mut self, momentum: f64) -> &mut Self {
        self.momentum = momentum;
        self
    }

    pub fn set_training_algorithm(&mut self, algorithm: TrainAlgorithm) -> &mut Self {
        self.algorithm = algorithm;
        self
    }

    /// Checks every parameter range before any training begins.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(TrainError::InvalidConfiguration(
                "worker count must be at least 1".into(),
            ));
        }
        if !(self.learning_rate > 0.0) {
            return Err(TrainError::InvalidConfiguration(format!(
                "learning rate must be positive, got {}", self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(TrainError::InvalidConfiguration(format!(
                "momentum must be in [0, 1), got {}", self.momentum
            )));
        }
        if !(0.0..1.0).contains(&self.dropout_fraction) {
            return Err(TrainError::InvalidConfiguration(format!(
                "dropout fraction must be in [0, 1), got {}", self.dropout_fraction
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(TrainingConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_workers_rejected() {
        let mut cfg = TrainingConfig::default();
        cfg.workers = 0;
        assert!(matches!(cfg.validate(), Err(TrainError::InvalidConfiguration(_))));
    }

    #[test]
    fn full_dropout_fraction_rejected() {
        let mut cfg = TrainingConfig::default();
        cfg.set_do_dropout(true).set_dropout_fraction(1.0);
        assert!(matches!(cfg.validate(), Err(TrainError::InvalidConfiguration(_))));
    }

    #[test]
    fn nan_learning_rate_rejected() {
        let mut cfg = TrainingConfig::default();
        cfg.learning_rate = f64::NAN;
        assert!(cfg.validate().is_err());
    }
}
