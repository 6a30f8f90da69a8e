use crate::error::{MlError, Result};
use crate::tensor::Tensor;

/// `p - lr * g` for every parameter tensor.
pub fn gradient_descent_update(params: &[Tensor], grads: &[Tensor], lr: f32) -> Result<Vec<Tensor>> {
    if params.len() != grads.len() {
        return Err(MlError::ArityMismatch { expected: params.len(), got: grads.len() });
    }
    params
        .iter()
        .zip(grads)
        .map(|(p, g)| {
            if p.shape != g.shape {
                return Err(MlError::ShapeMismatch {
                    op: "gradient_descent_update",
                    lhs: p.shape.clone(),
                    rhs: g.shape.clone(),
                });
            }
            let data = p.data.iter().zip(&g.data).map(|(pv, gv)| pv - lr * gv).collect();
            Ok(Tensor { data, shape: p.shape.clone() })
        })
        .collect()
}

/// Plain gradient descent. Owns the parameters it updates.
pub struct GradientDescent {
    lr: f32,
    params: Vec<Tensor>,
}

impl GradientDescent {
    #[must_use]
    pub fn new(params: Vec<Tensor>, lr: f32) -> Self {
        Self { lr, params }
    }

    #[must_use]
    pub fn lr(&self) -> f32 {
        self.lr
    }

    #[must_use]
    pub fn params(&self) -> &[Tensor] {
        &self.params
    }

    #[must_use]
    pub fn into_params(self) -> Vec<Tensor> {
        self.params
    }

    /// Replaces the parameters with one descent step along `grads`.
    pub fn step(&mut self, grads: &[Tensor]) -> Result<()> {
        self.params = gradient_descent_update(&self.params, grads, self.lr)?;
        Ok(())
    }
}
