use crate::error::{Result, TrainError};
use crate::loss::mse::MseLoss;
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::train::dropout::DropoutMask;

/// Per-layer gradient sums plus the squared-error total for the examples
/// that produced them.
///
/// During the parallel phase each worker owns exactly one batch and writes
/// only to it; the coordinator merges them in worker order after the join
/// barrier, so no gradient memory is ever shared between threads.
#[derive(Debug)]
pub struct GradientBatch {
    pub weight_grads: Vec<Matrix>,
    pub bias_grads: Vec<Matrix>,
    pub sq_error: f64,
    pub examples: usize,
}

impl GradientBatch {
    pub fn zeros_like(network: &Network) -> GradientBatch {
        let weight_grads = network.layers.iter()
            .map(|layer| Matrix::zeros(layer.weights.rows, layer.weights.cols))
            .collect();
        let bias_grads = network.layers.iter()
            .map(|layer| Matrix::zeros(layer.biases.rows, layer.biases.cols))
            .collect();
        GradientBatch { weight_grads, bias_grads, sq_error: 0.0, examples: 0 }
    }

    /// Element-wise sum of another batch into this one.
    pub fn merge(&mut self, other: GradientBatch) {
        for (acc, grad) in self.weight_grads.iter_mut().zip(other.weight_grads.iter()) {
            acc.add_assign(grad);
        }
        for (acc, grad) in self.bias_grads.iter_mut().zip(other.bias_grads.iter()) {
            acc.add_assign(grad);
        }
        self.sq_error += other.sq_error;
        self.examples += other.examples;
    }
}

/// One forward/backward pass for a single example.
///
/// Applies `masks` to hidden activations on the way forward, backpropagates
/// the squared-error gradient through retained units only, and accumulates
/// the per-weight contributions into `batch`. The network itself is never
/// mutated here — update application belongs to the epoch coordinator.
pub fn evaluate(
    network: &Network,
    input: &[f64],
    target: &[f64],
    masks: &[DropoutMask],
    batch: &mut GradientBatch,
) -> Result<()> {
    if input.len() != network.input_arity() {
        return Err(TrainError::DimensionMismatch {
            expected: network.input_arity(),
            found: input.len(),
        });
    }
    if target.len() != network.output_arity() {
        return Err(TrainError::DimensionMismatch {
            expected: network.output_arity(),
            found: target.len(),
        });
    }

    debug_assert_eq!(masks.len(), network.layers.len());

    // Forward, keeping pre-activations and masked activations per layer.
    let mut pre_acts: Vec<Vec<f64>> = Vec::with_capacity(network.layers.len());
    let mut acts: Vec<Vec<f64>> = Vec::with_capacity(network.layers.len());
    let mut current = input.to_vec();
    for (layer, mask) in network.layers.iter().zip(masks.iter()) {
        let z = layer.affine(&current);
        let mut a = layer.activate(&z);
        for (j, value) in a.iter_mut().enumerate() {
            if !mask.is_retained(j) {
                *value = 0.0;
            }
        }
        pre_acts.push(z);
        current = a.clone();
        acts.push(a);
    }

    let output = acts.last().map(|a| a.as_slice()).unwrap_or(&[]);
    batch.sq_error += MseLoss::squared_error(output, target);
    batch.examples += 1;

    // Backward: δ starts as ∂L/∂a at the output and walks back through
    // retained units only.
    let error = MseLoss::derivative(output, target);
    let mut delta = Matrix::from_data(vec![error]);

    for i in (0..network.layers.len()).rev() {
        let layer = &network.layers[i];
        let mask = &masks[i];

        // δ_i = (∂L/∂a_i) ⊙ σ'(z_i), zeroed at dropped units.
        let mut layer_delta = Matrix::zeros(1, layer.size);
        for j in 0..layer.size {
            if mask.is_retained(j) {
                layer_delta.data[0][j] =
                    delta.data[0][j] * layer.activator.derivative(pre_acts[i][j]);
            }
        }

        let input_for_layer = if i == 0 {
            Matrix::from_data(vec![input.to_vec()])
        } else {
            Matrix::from_data(vec![acts[i - 1].clone()])
        };

        // w_grad = a_{i-1}^T · δ_i ; dropped inputs feed zero activation,
        // so their outgoing weight gradients vanish with no special case.
        let w_grad = input_for_layer.transpose() * layer_delta.clone();
        batch.weight_grads[i].add_assign(&w_grad);
        batch.bias_grads[i].add_assign(&layer_delta);

        if i > 0 {
            // Propagate δ_i through weights to get ∂L/∂a_{i-1}.
            delta = layer_delta * layer.weights.transpose();
        }
    }

    Ok(())
}
