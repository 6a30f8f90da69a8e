//! The feed-forward policy network.

use ml::{Activation, Backend, Dense, MlError, Tape, Tensor, Var};
use thiserror::Error;

/// Width of both hidden layers.
pub const HIDDEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("policy sizes must be positive, got input {in_size} and output {out_size}")]
    ZeroSize { in_size: usize, out_size: usize },
}

/// Three dense layers, `in → 64 → 64 → out`, each followed by `tanh`.
///
/// The policy only describes shapes. Parameter values are passed in, in the
/// order `[W0, W1, W2, b0, b1, b2]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Policy {
    layers: [Dense; 3],
}

impl Policy {
    pub fn new(in_size: usize, out_size: usize) -> Result<Self, PolicyError> {
        if in_size == 0 || out_size == 0 {
            return Err(PolicyError::ZeroSize { in_size, out_size });
        }
        Ok(Self {
            layers: [
                Dense::new(in_size, HIDDEN, Activation::Tanh),
                Dense::new(HIDDEN, HIDDEN, Activation::Tanh),
                Dense::new(HIDDEN, out_size, Activation::Tanh),
            ],
        })
    }

    #[must_use]
    pub fn in_size(&self) -> usize {
        self.layers[0].in_dim
    }

    #[must_use]
    pub fn out_size(&self) -> usize {
        self.layers[2].out_dim
    }

    #[must_use]
    pub fn layers(&self) -> &[Dense; 3] {
        &self.layers
    }

    /// Shapes of the parameter tensors, weights first.
    #[must_use]
    pub fn param_shapes(&self) -> Vec<Vec<usize>> {
        let weights = self.layers.iter().map(|l| l.weight_shape().to_vec());
        let biases = self.layers.iter().map(|l| l.bias_shape().to_vec());
        weights.chain(biases).collect()
    }

    /// Glorot-uniform weights and zero biases drawn from `backend`.
    pub fn init_params(&self, backend: &mut Backend) -> Vec<Tensor> {
        let (weights, biases): (Vec<_>, Vec<_>) =
            self.layers.iter().map(|l| l.init(backend.rng())).unzip();
        weights.into_iter().chain(biases).collect()
    }

    /// Maps an observation `x[in]` to an action `[out]` with every element in
    /// `(-1, 1)`.
    pub fn forward(&self, tape: &mut Tape, x: Var, params: &[Var]) -> ml::Result<Var> {
        let [w0, w1, w2, b0, b1, b2] = params else {
            return Err(MlError::ArityMismatch { expected: 6, got: params.len() });
        };
        let mut h = tape.expand_dims(x, 0)?;
        for (layer, (w, b)) in self.layers.iter().zip([(w0, b0), (w1, b1), (w2, b2)]) {
            h = layer.forward(tape, h, *w, *b)?;
        }
        tape.squeeze(h, 0)
    }

    /// [`forward`](Self::forward) with parameter values that are not yet on
    /// the tape.
    pub fn call(&self, tape: &mut Tape, x: Var, params: &[Tensor]) -> ml::Result<Var> {
        let vars: Vec<Var> = params.iter().map(|p| tape.leaf(p.clone())).collect();
        self.forward(tape, x, &vars)
    }
}
