use std::ops::Range;
use std::thread;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::data::dataset::TrainingData;
use crate::error::{Result, TrainError};
use crate::network::network::Network;
use crate::optim::sgd::Sgd;
use crate::train::backprop::{evaluate, GradientBatch};
use crate::train::dropout::{retain_all, sample_masks, DropoutMask};
use crate::train::session::{MaskPolicy, TrainAlgorithm, TrainingConfig};

/// Seed tag for the shared per-epoch mask stream, distinct from any worker index.
const EPOCH_MASK_STREAM: u64 = u64::MAX;

/// One training session: a validated config plus the optimizer state
/// (momentum velocity) and an epoch counter that drives seed derivation.
///
/// The config is fixed for the session's lifetime. Two variants of the same
/// experiment (say dropout vs baseline) are two sessions over two
/// independent network copies with no shared mutable state.
pub struct TrainingSession {
    config: TrainingConfig,
    optimizer: Sgd,
    epoch: u64,
}

impl TrainingSession {
    /// Validates the config up front; nothing trains after a rejection.
    pub fn new(config: TrainingConfig) -> Result<TrainingSession> {
        config.validate()?;
        let optimizer = Sgd::new(config.learning_rate, config.momentum);
        Ok(TrainingSession { config, optimizer, epoch: 0 })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Runs one epoch over the whole dataset across the configured worker
    /// count and returns the epoch MSE on the training data.
    ///
    /// The epoch is atomic: weights are read-only while workers run, and the
    /// single merged update is applied only after every worker finished
    /// cleanly. Any worker error (first one in worker order) aborts the call
    /// with the network exactly as it was before.
    pub fn train_epoch_parallel(&mut self, network: &mut Network, data: &TrainingData) -> Result<f64> {
        if data.is_empty() {
            return Err(TrainError::InvalidConfiguration("dataset is empty".into()));
        }
        if data.num_input != network.input_arity() {
            return Err(TrainError::DimensionMismatch {
                expected: network.input_arity(),
                found: data.num_input,
            });
        }
        if data.num_output != network.output_arity() {
            return Err(TrainError::DimensionMismatch {
                expected: network.output_arity(),
                found: data.num_output,
            });
        }

        self.epoch += 1;
        let epoch = self.epoch;
        let config = &self.config;

        // One mask set for the whole epoch when the coarse policy is chosen;
        // every worker then applies the same masks.
        let epoch_masks = if config.do_dropout
            && config.dropout_fraction > 0.0
            && config.mask_policy == MaskPolicy::PerEpoch
        {
            let mut rng = ChaCha8Rng::seed_from_u64(
                derive_seed(config.seed, epoch, EPOCH_MASK_STREAM));
            Some(sample_masks(network, config.dropout_fraction, &mut rng))
        } else {
            None
        };

        let shards = shard_ranges(data.len(), config.workers);
        let merged = run_workers(network, data, config, epoch, &shards, epoch_masks.as_deref())?;

        let n = data.len() as f64;
        let scale = match config.algorithm {
            TrainAlgorithm::Incremental => 1.0,
            TrainAlgorithm::Batch => 1.0 / n,
        };
        self.optimizer.step(network, &merged, scale)?;

        Ok(merged.sq_error / n)
    }
}

/// Runs every shard to completion and merges the thread-local batches in
/// worker-index order. The scope join is the epoch's only barrier; on any
/// exit path all workers are joined before partial state is inspected.
fn run_workers(
    network: &Network,
    data: &TrainingData,
    config: &TrainingConfig,
    epoch: u64,
    shards: &[Range<usize>],
    epoch_masks: Option<&[DropoutMask]>,
) -> Result<GradientBatch> {
    let results: Vec<Result<GradientBatch>> = if shards.len() == 1 {
        vec![run_shard(network, data, config, epoch, 0, shards[0].clone(), epoch_masks)]
    } else {
        thread::scope(|scope| {
            let handles: Vec<_> = shards.iter().enumerate()
                .map(|(index, shard)| {
                    let shard = shard.clone();
                    thread::Builder::new()
                        .name(format!("epoch-worker-{index}"))
                        .spawn_scoped(scope, move || {
                            run_shard(network, data, config, epoch, index, shard, epoch_masks)
                        })
                })
                .collect();

            handles.into_iter()
                .map(|handle| match handle {
                    Ok(joined) => joined.join().unwrap_or(Err(TrainError::WorkerPanic)),
                    Err(e) => Err(TrainError::ThreadSpawn(e)),
                })
                .collect()
        })
    };

    let mut merged = GradientBatch::zeros_like(network);
    for result in results {
        merged.merge(result?);
    }
    Ok(merged)
}

/// One worker's pass over its shard, accumulating into a thread-local batch.
fn run_shard(
    network: &Network,
    data: &TrainingData,
    config: &TrainingConfig,
    epoch: u64,
    worker: usize,
    shard: Range<usize>,
    epoch_masks: Option<&[DropoutMask]>,
) -> Result<GradientBatch> {
    let mut batch = GradientBatch::zeros_like(network);
    let dropout_on = config.do_dropout && config.dropout_fraction > 0.0;
    let mut rng = ChaCha8Rng::seed_from_u64(derive_seed(config.seed, epoch, worker as u64));
    let retain = retain_all(network);

    for i in shard {
        let (input, target) = data.example(i);
        let fresh;
        let masks: &[DropoutMask] = if !dropout_on {
            &retain
        } else if let Some(shared) = epoch_masks {
            shared
        } else {
            fresh = sample_masks(network, config.dropout_fraction, &mut rng);
            &fresh
        };
        evaluate(network, input, target, masks, &mut batch)?;
    }

    Ok(batch)
}

/// Deterministic per-worker seed: each worker gets its own replayable
/// stream derived from the session seed, the epoch, and its index.
fn derive_seed(seed: u64, epoch: u64, worker: u64) -> u64 {
    seed ^ epoch.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ worker.wrapping_mul(0xD1B5_4A32_D192_ED03)
}

/// Contiguous shards covering `0..n` exactly once. The first `n % workers`
/// shards take one extra example; worker counts beyond `n` are clamped so
/// no shard is empty.
pub fn shard_ranges(n: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1).min(n.max(1));
    let base = n / workers;
    let extra = n % workers;

    let mut shards = Vec::with_capacity(workers);
    let mut start = 0;
    for w in 0..workers {
        let len = base + usize::from(w < extra);
        shards.push(start..start + len);
        start += len;
    }
    shards
}
