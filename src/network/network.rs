use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Result, TrainError};
use crate::layers::dense::Layer;

/// A feedforward network: an ordered stack of fully connected layers.
///
/// `Clone` is a full deep copy — cloning a network before enabling dropout
/// on the copy gives two training variants with no weight aliasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
}

impl Network {
    /// Builds a network from (size, input_size, activation) tuples.
    ///
    /// Fails with `InvalidConfiguration` when the layer widths do not chain
    /// (layer i's input width must equal layer i-1's output width).
    pub fn new<R: Rng>(
        layer_specs: Vec<(usize, usize, ActivationFunction)>,
        rng: &mut R,
    ) -> Result<Network> {
        if layer_specs.is_empty() {
            return Err(TrainError::InvalidConfiguration(
                "network needs at least one layer".into(),
            ));
        }
        for (i, window) in layer_specs.windows(2).enumerate() {
            let (prev_size, ..) = window[0];
            let (_, input_size, _) = window[1];
            if input_size != prev_size {
                return Err(TrainError::InvalidConfiguration(format!(
                    "layer {} expects {} inputs but layer {} outputs {}",
                    i + 1, input_size, i, prev_size
                )));
            }
        }
        let layers = layer_specs.into_iter()
            .map(|(size, input_size, activation)| Layer::new(size, input_size, activation, rng))
            .collect();
        Ok(Network { layers })
    }

    /// Builds a fully connected network from layer widths, e.g.
    /// `[2, 4, 1]` for 2 inputs, one hidden layer of 4, and 1 output.
    pub fn standard<R: Rng>(
        widths: &[usize],
        hidden: ActivationFunction,
        output: ActivationFunction,
        rng: &mut R,
    ) -> Result<Network> {
        if widths.len() < 2 {
            return Err(TrainError::InvalidConfiguration(
                "a network needs an input width and an output width".into(),
            ));
        }
        let last = widths.len() - 1;
        let specs = widths.windows(2).enumerate()
            .map(|(i, w)| {
                let act = if i + 1 == last { output } else { hidden };
                (w[1], w[0], act)
            })
            .collect();
        Network::new(specs, rng)
    }

    /// Width of the input layer (the dataset's input arity).
    pub fn input_arity(&self) -> usize {
        self.layers.first().map(|l| l.input_size).unwrap_or(0)
    }

    /// Width of the output layer (the dataset's output arity).
    pub fn output_arity(&self) -> usize {
        self.layers.last().map(|l| l.size).unwrap_or(0)
    }

    /// Forward pass for inference. Does not mutate the network, so it is
    /// safe to call concurrently through shared references.
    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.input_arity() {
            return Err(TrainError::DimensionMismatch {
                expected: self.input_arity(),
                found: input.len(),
            });
        }
        let mut current = input.to_vec();
        for layer in &self.layers {
            let z = layer.affine(&current);
            current = layer.activate(&z);
        }
        Ok(current)
    }

    /// Serializes the network weights to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: &str) -> std::io::Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn standard_chains_widths() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let net = Network::standard(&[3, 5, 2], ActivationFunction::Sigmoid,
                                    ActivationFunction::Sigmoid, &mut rng).unwrap();
        assert_eq!(net.input_arity(), 3);
        assert_eq!(net.output_arity(), 2);
        assert_eq!(net.layers[1].input_size, 5);
    }

    #[test]
    fn mismatched_specs_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = Network::new(vec![
            (4, 2, ActivationFunction::Sigmoid),
            (1, 3, ActivationFunction::Sigmoid),
        ], &mut rng);
        assert!(matches!(err, Err(TrainError::InvalidConfiguration(_))));
    }

    #[test]
    fn forward_rejects_wrong_arity() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let net = Network::standard(&[2, 3, 1], ActivationFunction::Sigmoid,
                                    ActivationFunction::Sigmoid, &mut rng).unwrap();
        let err = net.forward(&[1.0, 2.0, 3.0]);
        assert!(matches!(err, Err(TrainError::DimensionMismatch { expected: 2, found: 3 })));
    }

    #[test]
    fn clone_is_independent() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let net = Network::standard(&[2, 3, 1], ActivationFunction::Sigmoid,
                                    ActivationFunction::Sigmoid, &mut rng).unwrap();
        let mut copy = net.clone();
        copy.layers[0].weights.data[0][0] += 1.0;
        assert_ne!(net.layers[0].weights.data[0][0], copy.layers[0].weights.data[0][0]);
    }
}
