use rand::Rng;

use crate::network::network::Network;

/// A sampled retain mask over one layer's neurons.
///
/// Each unit is independently retained with probability `1 - fraction`.
/// Dropped units contribute zero activation on the forward pass and are
/// excluded from gradient flow on the backward pass — zeroed, not rescaled,
/// which is why evaluation always runs with dropout off.
#[derive(Debug, Clone)]
pub struct DropoutMask {
    retained: Vec<bool>,
}

impl DropoutMask {
    pub fn sample<R: Rng>(width: usize, fraction: f64, rng: &mut R) -> DropoutMask {
        let retained = (0..width).map(|_| rng.gen::<f64>() >= fraction).collect();
        DropoutMask { retained }
    }

    pub fn all_retained(width: usize) -> DropoutMask {
        DropoutMask { retained: vec![true; width] }
    }

    /// Builds a mask from an explicit retain vector.
    pub fn from_retained(retained: Vec<bool>) -> DropoutMask {
        DropoutMask { retained }
    }

    pub fn is_retained(&self, unit: usize) -> bool {
        self.retained[unit]
    }

    pub fn width(&self) -> usize {
        self.retained.len()
    }
}

/// One mask per layer for a single forward/backward pass.
///
/// The output layer is never masked; dropout applies to hidden units only.
pub fn sample_masks<R: Rng>(network: &Network, fraction: f64, rng: &mut R) -> Vec<DropoutMask> {
    let last = network.layers.len() - 1;
    network.layers.iter().enumerate()
        .map(|(i, layer)| {
            if i == last {
                DropoutMask::all_retained(layer.size)
            } else {
                DropoutMask::sample(layer.size, fraction, rng)
            }
        })
        .collect()
}

/// The no-op mask set used when dropout is disabled.
pub fn retain_all(network: &Network) -> Vec<DropoutMask> {
    network.layers.iter()
        .map(|layer| DropoutMask::all_retained(layer.size))
        .collect()
}
