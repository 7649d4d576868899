use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use filament_nn::{
    evaluate_mse, ActivationFunction, MaskPolicy, Network, TrainError,
    TrainingConfig, TrainingData, TrainingSession,
};

fn xor_data() -> TrainingData {
    TrainingData::new(
        vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ],
        vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]],
    ).unwrap()
}

fn xor_network(seed: u64) -> Network {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Network::standard(
        &[2, 4, 1],
        ActivationFunction::Sigmoid,
        ActivationFunction::Sigmoid,
        &mut rng,
    ).unwrap()
}

fn config(workers: usize, seed: u64) -> TrainingConfig {
    let mut cfg = TrainingConfig::default();
    cfg.learning_rate = 0.1;
    cfg.workers = workers;
    cfg.seed = seed;
    cfg
}

fn weights_of(network: &Network) -> Vec<Vec<Vec<f64>>> {
    network.layers.iter().map(|l| l.weights.data.clone()).collect()
}

fn max_weight_delta(a: &Network, b: &Network) -> f64 {
    let mut max = 0.0f64;
    for (la, lb) in a.layers.iter().zip(b.layers.iter()) {
        for (ra, rb) in la.weights.data.iter().zip(lb.weights.data.iter()) {
            for (wa, wb) in ra.iter().zip(rb.iter()) {
                max = max.max((wa - wb).abs());
            }
        }
    }
    max
}

#[test]
fn fixed_seed_reproduces_training_trajectory() {
    let data = xor_data();
    let initial = xor_network(11);

    let mut cfg = config(2, 99);
    cfg.set_do_dropout(true).set_dropout_fraction(0.3);

    let mut net_a = initial.clone();
    let mut net_b = initial.clone();
    let mut session_a = TrainingSession::new(cfg.clone()).unwrap();
    let mut session_b = TrainingSession::new(cfg).unwrap();

    for _ in 0..50 {
        session_a.train_epoch_parallel(&mut net_a, &data).unwrap();
        session_b.train_epoch_parallel(&mut net_b, &data).unwrap();
    }

    assert_eq!(weights_of(&net_a), weights_of(&net_b));
}

#[test]
fn parallel_matches_serial_within_tolerance() {
    let data = xor_data();
    let initial = xor_network(5);

    let mut serial = initial.clone();
    let mut parallel = initial.clone();
    let mut serial_session = TrainingSession::new(config(1, 7)).unwrap();
    let mut parallel_session = TrainingSession::new(config(4, 7)).unwrap();

    let mut last_serial = 0.0;
    let mut last_parallel = 0.0;
    for _ in 0..100 {
        last_serial = serial_session.train_epoch_parallel(&mut serial, &data).unwrap();
        last_parallel = parallel_session.train_epoch_parallel(&mut parallel, &data).unwrap();
    }

    // Merge order is fixed, so only floating-point rounding order differs.
    assert!((last_serial - last_parallel).abs() < 1e-9);
    assert!(max_weight_delta(&serial, &parallel) < 1e-9);
}

#[test]
fn zero_fraction_equals_dropout_disabled() {
    let data = xor_data();
    let initial = xor_network(23);

    let mut off = initial.clone();
    let mut zero = initial.clone();

    let mut cfg_off = config(2, 3);
    cfg_off.set_do_dropout(false);
    let mut cfg_zero = config(2, 3);
    cfg_zero.set_do_dropout(true).set_dropout_fraction(0.0);

    let mut session_off = TrainingSession::new(cfg_off).unwrap();
    let mut session_zero = TrainingSession::new(cfg_zero).unwrap();

    for _ in 0..30 {
        session_off.train_epoch_parallel(&mut off, &data).unwrap();
        session_zero.train_epoch_parallel(&mut zero, &data).unwrap();
    }

    assert_eq!(weights_of(&off), weights_of(&zero));
}

#[test]
fn extreme_dropout_fraction_does_not_crash() {
    let data = xor_data();
    let mut net = xor_network(31);

    let mut cfg = config(2, 17);
    cfg.set_do_dropout(true).set_dropout_fraction(0.99);
    let mut session = TrainingSession::new(cfg).unwrap();

    let mut mse = 0.0;
    for _ in 0..100 {
        mse = session.train_epoch_parallel(&mut net, &data).unwrap();
    }
    assert!(mse.is_finite());
    // With nearly every hidden unit masked the model cannot do better than
    // a near-constant prediction; it must not have collapsed to NaN.
    assert!(evaluate_mse(&net, &data).unwrap().is_finite());
}

#[test]
fn per_epoch_mask_policy_is_reproducible() {
    let data = xor_data();
    let initial = xor_network(41);

    let mut cfg = config(2, 13);
    cfg.set_do_dropout(true).set_dropout_fraction(0.25);
    cfg.mask_policy = MaskPolicy::PerEpoch;

    let mut net_a = initial.clone();
    let mut net_b = initial;
    let mut session_a = TrainingSession::new(cfg.clone()).unwrap();
    let mut session_b = TrainingSession::new(cfg).unwrap();

    for _ in 0..20 {
        session_a.train_epoch_parallel(&mut net_a, &data).unwrap();
        session_b.train_epoch_parallel(&mut net_b, &data).unwrap();
    }

    assert_eq!(weights_of(&net_a), weights_of(&net_b));
}

#[test]
fn evaluate_mse_is_idempotent() {
    let data = xor_data();
    let net = xor_network(3);
    let first = evaluate_mse(&net, &data).unwrap();
    let second = evaluate_mse(&net, &data).unwrap();
    assert_eq!(first, second);
}

// Training applies one merged weight update per epoch (per-worker partial
// sums, merged, applied once) instead of a weight step after every example.
// The two XOR tests below pin both consequences of that choice: 500 plain
// lr-0.1 epochs are far too few and sit on the ≈0.25 plateau, while the
// same topology converges once momentum and a longer budget make up for
// the coarser update schedule.

#[test]
fn xor_plateaus_in_500_plain_epochs() {
    for seed in [7u64, 101, 2024] {
        let data = xor_data();
        let mut net = xor_network(seed);
        let mut session = TrainingSession::new(config(2, seed)).unwrap();

        let mut mse = f64::MAX;
        for _ in 0..500 {
            mse = session.train_epoch_parallel(&mut net, &data).unwrap();
        }
        assert!(mse > 0.05, "seed {seed} unexpectedly converged to {mse}");
        assert!(mse < 0.5, "seed {seed} diverged to {mse}");
    }
}

#[test]
fn xor_converges_with_two_workers() {
    // A bad initialization can park 2-4-1 XOR on the 0.25 plateau, so the
    // sanity check accepts convergence from any of a few fixed seeds.
    let seeds = [7u64, 101, 2024];
    let converged = seeds.iter().any(|&seed| xor_run_converges(seed));
    assert!(converged, "xor failed to converge from every seed in {seeds:?}");
}

fn xor_run_converges(seed: u64) -> bool {
    let data = xor_data();
    let mut net = xor_network(seed);

    let mut cfg = config(2, seed);
    cfg.momentum = 0.7;
    let mut session = TrainingSession::new(cfg).unwrap();

    for _ in 0..5000 {
        let mse = session.train_epoch_parallel(&mut net, &data).unwrap();
        if mse < 0.05 {
            return true;
        }
    }
    false
}

#[test]
fn malformed_example_aborts_epoch_and_preserves_weights() {
    let mut data = xor_data();
    // Corrupt one example after construction-time validation.
    data.inputs[2] = vec![1.0, 0.0, 0.5];

    let mut net = xor_network(19);
    let before = weights_of(&net);

    let mut session = TrainingSession::new(config(2, 5)).unwrap();
    let err = session.train_epoch_parallel(&mut net, &data);
    assert!(matches!(err, Err(TrainError::DimensionMismatch { expected: 2, found: 3 })));
    assert_eq!(weights_of(&net), before, "weights changed after aborted epoch");
}

#[test]
fn dataset_arity_mismatch_is_rejected_up_front() {
    let data = xor_data();
    // Network expects 3 inputs; dataset provides 2.
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let mut net = Network::standard(&[3, 4, 1], ActivationFunction::Sigmoid,
                                    ActivationFunction::Sigmoid, &mut rng).unwrap();
    let before = weights_of(&net);
    let mut session = TrainingSession::new(config(2, 5)).unwrap();
    let err = session.train_epoch_parallel(&mut net, &data);
    assert!(matches!(err, Err(TrainError::DimensionMismatch { .. })));
    assert_eq!(weights_of(&net), before);
}

#[test]
fn session_is_tied_to_one_network_shape() {
    let data = xor_data();
    let mut net = xor_network(37);

    let mut session = TrainingSession::new(config(2, 5)).unwrap();
    session.train_epoch_parallel(&mut net, &data).unwrap();

    // Same session, same data arity, but a wider hidden layer: the momentum
    // state no longer matches and the epoch must fail instead of panicking.
    let mut rng = ChaCha8Rng::seed_from_u64(37);
    let mut wider = Network::standard(&[2, 6, 1], ActivationFunction::Sigmoid,
                                      ActivationFunction::Sigmoid, &mut rng).unwrap();
    let before = weights_of(&wider);
    let err = session.train_epoch_parallel(&mut wider, &data);
    assert!(matches!(err, Err(TrainError::InvalidConfiguration(_))));
    assert_eq!(weights_of(&wider), before);
}

#[test]
fn saved_model_round_trips() {
    let net = xor_network(29);
    let mut path = std::env::temp_dir();
    path.push(format!("filament-model-{}.json", std::process::id()));
    net.save_json(path.to_str().unwrap()).unwrap();
    let loaded = Network::load_json(path.to_str().unwrap()).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(weights_of(&net), weights_of(&loaded));
    let data = xor_data();
    assert_eq!(
        evaluate_mse(&net, &data).unwrap(),
        evaluate_mse(&loaded, &data).unwrap()
    );
}
