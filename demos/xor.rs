use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use filament_nn::{
    evaluate_mse, ActivationFunction, Network, TrainingConfig, TrainingData, TrainingSession,
};

fn main() {
    let data = TrainingData::new(
        vec![
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 1.0],
            vec![0.0, 0.0],
        ],
        vec![
            vec![1.0],
            vec![0.0],
            vec![1.0],
            vec![0.0],
        ],
    ).expect("xor data is well-formed");

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut network = Network::standard(
        &[2, 4, 1],
        ActivationFunction::Sigmoid,
        ActivationFunction::Sigmoid,
        &mut rng,
    ).expect("widths chain");

    let mut config = TrainingConfig::default();
    config.learning_rate = 0.5;
    config.momentum = 0.4;
    config.workers = 2;
    config.seed = 42;

    let mut session = TrainingSession::new(config).expect("config is valid");

    for epoch in 1..=2000u32 {
        let mse = session
            .train_epoch_parallel(&mut network, &data)
            .expect("epoch trains");
        if epoch % 200 == 0 {
            println!("Epoch {epoch}: mse = {mse:.6}");
        }
    }

    for input in &data.inputs {
        let output = network.forward(input).expect("arity matches");
        println!("Input: {:?} -> Output: {:.4}", input, output[0]);
    }
    println!("Final MSE: {:.6}", evaluate_mse(&network, &data).expect("evaluation runs"));
}
