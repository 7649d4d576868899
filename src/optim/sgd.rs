use crate::error::{Result, TrainError};
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::train::backprop::GradientBatch;

/// Momentum SGD applied once per epoch from a merged gradient batch.
///
/// Classic momentum: `v = momentum·v + lr·scale·g`, then `w -= v`.
/// The velocity buffers persist across epochs and belong to one training
/// session; a fresh session starts from zero velocity.
pub struct Sgd {
    pub learning_rate: f64,
    pub momentum: f64,
    velocity: Option<Vec<(Matrix, Matrix)>>,
}

impl Sgd {
    pub fn new(learning_rate: f64, momentum: f64) -> Sgd {
        Sgd { learning_rate, momentum, velocity: None }
    }

    /// Applies one weight update to every layer. `scale` lets the caller
    /// average a summed gradient (batch semantics) or apply it as-is
    /// (incremental semantics); gradients themselves arrive unscaled.
    ///
    /// The velocity buffers take their shape from the first network stepped;
    /// a later network with a different shape is rejected rather than
    /// silently mixing momentum state between models.
    pub fn step(&mut self, network: &mut Network, grads: &GradientBatch, scale: f64) -> Result<()> {
        if let Some(velocity) = &self.velocity {
            let matches = velocity.len() == network.layers.len()
                && velocity.iter().zip(network.layers.iter()).all(|((w_vel, _), layer)| {
                    w_vel.rows == layer.weights.rows && w_vel.cols == layer.weights.cols
                });
            if !matches {
                return Err(TrainError::InvalidConfiguration(
                    "optimizer velocity is shaped for a different network; \
                     train each network with its own session".into(),
                ));
            }
        }

        let velocity = self.velocity.get_or_insert_with(|| {
            network.layers.iter()
                .map(|layer| (
                    Matrix::zeros(layer.weights.rows, layer.weights.cols),
                    Matrix::zeros(layer.biases.rows, layer.biases.cols),
                ))
                .collect()
        });

        for (i, layer) in network.layers.iter_mut().enumerate() {
            let (w_vel, b_vel) = &mut velocity[i];
            let (w_grad, b_grad) = (&grads.weight_grads[i], &grads.bias_grads[i]);

            for r in 0..layer.weights.rows {
                for c in 0..layer.weights.cols {
                    let v = self.momentum * w_vel.data[r][c]
                        + self.learning_rate * scale * w_grad.data[r][c];
                    w_vel.data[r][c] = v;
                    layer.weights.data[r][c] -= v;
                }
            }
            for c in 0..layer.biases.cols {
                let v = self.momentum * b_vel.data[0][c]
                    + self.learning_rate * scale * b_grad.data[0][c];
                b_vel.data[0][c] = v;
                layer.biases.data[0][c] -= v;
            }
        }

        Ok(())
    }
}
