// Driver for the dropout comparison experiment: trains two copies of the
// same network over the same data — one with dropout, one without — epoch
// by epoch with the parallel trainer, reports train/test MSE for both, and
// saves both models.
//
//   cargo run --release -- <train-file> <test-file>
//
// Dataset files use the text format described in `data::dataset`.

use std::env;
use std::process::ExitCode;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use filament_nn::{
    evaluate_mse, ActivationFunction, Network, TrainAlgorithm, TrainError,
    TrainingConfig, TrainingData, TrainingSession,
};

const NUM_NEURONS_HIDDEN: usize = 96;
const DESIRED_ERROR: f64 = 0.004;
const MAX_EPOCHS: u64 = 6000;
const WORKERS: usize = 8;
const SEED: u64 = 1234;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), TrainError> {
    let mut args = env::args().skip(1);
    let train_path = args.next().unwrap_or_else(|| "datasets/robot.train".into());
    let test_path = args.next().unwrap_or_else(|| "datasets/robot.test".into());

    let train_data = TrainingData::load(&train_path)?;
    let test_data = TrainingData::load(&test_path)?;

    println!("Creating network.");

    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let widths = [
        train_data.num_input,
        NUM_NEURONS_HIDDEN,
        NUM_NEURONS_HIDDEN,
        NUM_NEURONS_HIDDEN,
        train_data.num_output,
    ];
    let mut ann = Network::standard(
        &widths,
        ActivationFunction::Sigmoid,
        ActivationFunction::Sigmoid,
        &mut rng,
    )?;

    println!("Training network.");

    let mut config = TrainingConfig::default();
    config.set_training_algorithm(TrainAlgorithm::Incremental)
        .set_learning_momentum(0.4);
    config.workers = WORKERS;
    config.seed = SEED;

    // Branch the dropout variant off the same initial weights.
    let mut ann_dropout = ann.clone();
    let mut dropout_config = config.clone();
    dropout_config.set_do_dropout(true).set_dropout_fraction(0.15);

    let mut session = TrainingSession::new(config)?;
    let mut session_dropout = TrainingSession::new(dropout_config)?;

    for epoch in 1..=MAX_EPOCHS {
        let error = session.train_epoch_parallel(&mut ann, &train_data)?;
        let error_dropout = session_dropout.train_epoch_parallel(&mut ann_dropout, &train_data)?;
        let error_test = evaluate_mse(&ann, &test_data)?;
        let error_test_dropout = evaluate_mse(&ann_dropout, &test_data)?;

        println!(
            "Epochs {epoch:8}. TRAIN ERROR dropout: {error_dropout:.10} - no dropout: {error:.10}    \
             TEST ERROR dropout: {error_test_dropout:.10} - no dropout: {error_test:.10}"
        );

        if error_test <= DESIRED_ERROR || error_test_dropout <= DESIRED_ERROR {
            break;
        }
    }

    println!("Testing network.");
    println!(
        "MSE error on test data without dropout: {:.6}",
        evaluate_mse(&ann, &test_data)?
    );

    println!("Saving network.");
    ann.save_json("trained.json")?;

    println!(
        "MSE error on test data with dropout: {:.6}",
        evaluate_mse(&ann_dropout, &test_data)?
    );

    println!("Saving network.");
    ann_dropout.save_json("trained_dropout.json")?;

    Ok(())
}
