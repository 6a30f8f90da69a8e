use crate::error::Result;
use crate::tape::{Tape, Var};
use crate::tensor::Tensor;

/// Activation applied after a dense transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    Identity,
    Tanh,
}

/// Shape of a fully connected layer. The parameters themselves live outside
/// the layer so the same forward pass can run on any set of values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dense {
    /// The number of input dimensions.
    pub in_dim: usize,
    /// The number of output dimensions.
    pub out_dim: usize,
    pub activation: Activation,
}

impl Dense {
    #[must_use]
    pub fn new(in_dim: usize, out_dim: usize, activation: Activation) -> Self {
        Self { in_dim, out_dim, activation }
    }

    #[must_use]
    pub fn weight_shape(&self) -> [usize; 2] {
        [self.out_dim, self.in_dim]
    }

    #[must_use]
    pub fn bias_shape(&self) -> [usize; 1] {
        [self.out_dim]
    }

    /// Bound of the Glorot-uniform weight distribution.
    #[must_use]
    pub fn glorot_limit(&self) -> f32 {
        (6.0 / (self.in_dim + self.out_dim) as f32).sqrt()
    }

    /// Glorot-uniform weights and zero biases.
    pub fn init(&self, rng: &mut fastrand::Rng) -> (Tensor, Tensor) {
        let limit = self.glorot_limit();
        let w = Tensor::random_uniform(-limit, limit, &self.weight_shape(), rng);
        let b = Tensor::zeros(&self.bias_shape());
        (w, b)
    }

    /// Applies the layer to a batch `x[B, in_dim]`.
    pub fn forward(&self, tape: &mut Tape, x: Var, w: Var, b: Var) -> Result<Var> {
        let y = tape.linear(x, w, b)?;
        match self.activation {
            Activation::Identity => Ok(y),
            Activation::Tanh => tape.tanh(y),
        }
    }
}
