use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// A fully connected layer: weights, biases, and an activation tag.
///
/// The layer holds parameters only. Activations for a pass live in the
/// caller's buffers (see `train::backprop`), so a `&Layer` can be shared
/// read-only across worker threads while an epoch is in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer{
    pub size: usize,
    pub input_size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction
}

impl Layer {
    pub fn new<R: Rng>(size: usize, input_size: usize, activation: ActivationFunction, rng: &mut R) -> Layer {
        let weights = Matrix::xavier(input_size, size, rng);
        let biases = Matrix::random(1, size, rng);

        Layer {
            size,
            input_size,
            weights,
            biases,
            activator: activation
        }
    }

    /// Linear part of the forward pass: z = xW + b.
    pub fn affine(&self, input: &[f64]) -> Vec<f64> {
        let mut z = self.biases.data[0].clone();
        for j in 0..self.size {
            for (k, x) in input.iter().enumerate() {
                z[j] += x * self.weights.data[k][j];
            }
        }
        z
    }

    /// Activation applied element-wise to a pre-activation vector.
    pub fn activate(&self, z: &[f64]) -> Vec<f64> {
        z.iter().map(|&x| self.activator.function(x)).collect()
    }
}
