use crate::error::{MlError, Result};
use crate::graph::{self, EOp, Node};
use crate::tensor::Tensor;

/// Handle to a value held by a [`Tape`].
///
/// A `Var` is only meaningful for the tape that created it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Var(usize);

impl Var {
    #[must_use]
    pub fn id(self) -> usize {
        self.0
    }
}

/// A tape that records operations for automatic differentiation.
///
/// Every op is evaluated immediately. In recording mode the op is also
/// appended to the tape so [`Tape::gradients`] can walk it backwards; an eager
/// tape keeps only values and refuses to differentiate.
pub struct Tape {
    values: Vec<Tensor>,
    nodes: Vec<Node>,
    recording: bool,
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

impl Tape {
    /// Creates a new, empty recording tape.
    #[must_use]
    pub fn new() -> Self {
        Self { values: Vec::new(), nodes: Vec::new(), recording: true }
    }

    /// Creates a tape that evaluates without recording.
    #[must_use]
    pub fn eager() -> Self {
        Self { values: Vec::new(), nodes: Vec::new(), recording: false }
    }

    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Places an input value on the tape.
    pub fn leaf(&mut self, value: Tensor) -> Var {
        self.values.push(value);
        Var(self.values.len() - 1)
    }

    /// Places a fixed value on the tape. Identical to [`Tape::leaf`]; the name
    /// marks values the caller never differentiates against.
    pub fn constant(&mut self, value: Tensor) -> Var {
        self.leaf(value)
    }

    pub fn value(&self, v: Var) -> Result<&Tensor> {
        self.values.get(v.0).ok_or(MlError::UnknownVar(v.0))
    }

    pub fn shape(&self, v: Var) -> Result<&[usize]> {
        Ok(&self.value(v)?.shape)
    }

    /// The only element of a single-element value.
    pub fn item(&self, v: Var) -> Result<f32> {
        self.value(v)?.item()
    }

    fn apply(&mut self, op: EOp, inputs: &[Var]) -> Result<Var> {
        let args = inputs.iter().map(|&v| self.value(v)).collect::<Result<Vec<_>>>()?;
        let out = graph::eval(&op, &args)?;
        let out = self.leaf(out);
        if self.recording {
            self.nodes.push(Node { op, inputs: inputs.to_vec(), out });
        }
        Ok(out)
    }

    pub fn add(&mut self, a: Var, b: Var) -> Result<Var> {
        self.apply(EOp::Add, &[a, b])
    }

    pub fn sub(&mut self, a: Var, b: Var) -> Result<Var> {
        self.apply(EOp::Sub, &[a, b])
    }

    pub fn mul(&mut self, a: Var, b: Var) -> Result<Var> {
        self.apply(EOp::Mul, &[a, b])
    }

    pub fn div(&mut self, a: Var, b: Var) -> Result<Var> {
        self.apply(EOp::Div, &[a, b])
    }

    pub fn neg(&mut self, a: Var) -> Result<Var> {
        self.apply(EOp::Neg, &[a])
    }

    pub fn add_scalar(&mut self, a: Var, s: f32) -> Result<Var> {
        self.apply(EOp::AddScalar(s), &[a])
    }

    pub fn mul_scalar(&mut self, a: Var, s: f32) -> Result<Var> {
        self.apply(EOp::MulScalar(s), &[a])
    }

    pub fn pow(&mut self, a: Var, exponent: f32) -> Result<Var> {
        self.apply(EOp::Pow(exponent), &[a])
    }

    pub fn square(&mut self, a: Var) -> Result<Var> {
        self.mul(a, a)
    }

    pub fn exp(&mut self, a: Var) -> Result<Var> {
        self.apply(EOp::Exp, &[a])
    }

    pub fn sin(&mut self, a: Var) -> Result<Var> {
        self.apply(EOp::Sin, &[a])
    }

    pub fn cos(&mut self, a: Var) -> Result<Var> {
        self.apply(EOp::Cos, &[a])
    }

    pub fn tanh(&mut self, a: Var) -> Result<Var> {
        self.apply(EOp::Tanh, &[a])
    }

    pub fn sqrt(&mut self, a: Var) -> Result<Var> {
        self.apply(EOp::Sqrt, &[a])
    }

    /// Clamps every element to `[min, max]`. The gradient is passed through
    /// inside the interval and zeroed outside it.
    pub fn clamp(&mut self, a: Var, min: f32, max: f32) -> Result<Var> {
        if min > max || min.is_nan() || max.is_nan() {
            return Err(MlError::InvalidBounds { min, max });
        }
        self.apply(EOp::Clamp { min, max }, &[a])
    }

    /// Sums every element into a `[1]` value.
    pub fn sum(&mut self, a: Var) -> Result<Var> {
        self.apply(EOp::Sum, &[a])
    }

    /// Dense transform of a batch: `x[B, in] · w[out, in]ᵀ + b[out]`.
    pub fn linear(&mut self, x: Var, w: Var, b: Var) -> Result<Var> {
        self.apply(EOp::Linear, &[x, w, b])
    }

    pub fn reshape(&mut self, a: Var, shape: &[usize]) -> Result<Var> {
        self.apply(EOp::Reshape(shape.to_vec()), &[a])
    }

    /// Inserts a unit dimension at `axis`.
    pub fn expand_dims(&mut self, a: Var, axis: usize) -> Result<Var> {
        let mut shape = self.shape(a)?.to_vec();
        if axis > shape.len() {
            return Err(MlError::ShapeMismatch { op: "expand_dims", lhs: shape, rhs: vec![axis] });
        }
        shape.insert(axis, 1);
        self.reshape(a, &shape)
    }

    /// Removes the unit dimension at `axis`.
    pub fn squeeze(&mut self, a: Var, axis: usize) -> Result<Var> {
        let mut shape = self.shape(a)?.to_vec();
        if shape.get(axis) != Some(&1) {
            return Err(MlError::ShapeMismatch { op: "squeeze", lhs: shape, rhs: vec![axis] });
        }
        shape.remove(axis);
        self.reshape(a, &shape)
    }

    /// Joins 1-D values end to end.
    pub fn concat(&mut self, parts: &[Var]) -> Result<Var> {
        self.apply(EOp::Concat, parts)
    }

    /// Takes `len` consecutive elements of a 1-D value starting at `start`.
    pub fn slice(&mut self, a: Var, start: usize, len: usize) -> Result<Var> {
        self.apply(EOp::Slice { start, len }, &[a])
    }

    /// Element `i` of a 1-D value, as a `[1]` value.
    pub fn index(&mut self, a: Var, i: usize) -> Result<Var> {
        self.slice(a, i, 1)
    }

    /// Computes the gradients of `loss` with respect to each of `wrt`.
    ///
    /// The gradients are computed by traversing the recorded operations in
    /// reverse order. Variables the loss does not depend on receive zeros.
    pub fn gradients(&self, loss: Var, wrt: &[Var]) -> Result<Vec<Tensor>> {
        if !self.recording {
            return Err(MlError::GradientUnsupported("eager"));
        }
        let loss_value = self.value(loss)?;
        if loss_value.len() != 1 {
            return Err(MlError::NotScalar(loss_value.shape.clone()));
        }

        let mut grads: Vec<Option<Vec<f32>>> = vec![None; self.values.len()];
        grads[loss.0] = Some(vec![1.0]);

        for node in self.nodes.iter().rev() {
            let Some(out_grad) = grads[node.out.0].clone() else {
                continue;
            };
            let args: Vec<&Tensor> = node.inputs.iter().map(|v| &self.values[v.0]).collect();
            let input_grads = graph::vjp(&node.op, &args, &self.values[node.out.0], &out_grad);
            for (input, grad) in node.inputs.iter().zip(input_grads) {
                if let Some(acc) = &mut grads[input.0] {
                    for (a, g) in acc.iter_mut().zip(&grad) {
                        *a += g;
                    }
                } else {
                    grads[input.0] = Some(grad);
                }
            }
        }

        wrt.iter()
            .map(|&v| {
                let value = self.value(v)?;
                let data = grads[v.0].clone().unwrap_or_else(|| vec![0.0; value.len()]);
                Ok(Tensor { data, shape: value.shape.clone() })
            })
            .collect()
    }

    /// Re-evaluates every recorded node after overwriting the given leaves.
    pub(crate) fn replay(&mut self, leaves: &[Var], inputs: &[Tensor]) -> Result<()> {
        for (leaf, input) in leaves.iter().zip(inputs) {
            let slot = self.values.get_mut(leaf.0).ok_or(MlError::UnknownVar(leaf.0))?;
            *slot = input.clone();
        }
        for i in 0..self.nodes.len() {
            let node = &self.nodes[i];
            let args: Vec<&Tensor> = node.inputs.iter().map(|v| &self.values[v.0]).collect();
            let out = graph::eval(&node.op, &args)?;
            let out_id = node.out.0;
            self.values[out_id] = out;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eager_tape_refuses_gradients() {
        let mut tape = Tape::eager();
        let x = tape.leaf(Tensor::scalar(2.0));
        let y = tape.square(x).unwrap();
        assert_eq!(tape.item(y).unwrap(), 4.0);
        assert_eq!(tape.node_count(), 0);
        assert_eq!(tape.gradients(y, &[x]), Err(MlError::GradientUnsupported("eager")));
    }

    #[test]
    fn reused_value_accumulates_gradient() {
        let mut tape = Tape::new();
        let x = tape.leaf(Tensor::scalar(3.0));
        let y = tape.mul(x, x).unwrap();
        let z = tape.add(y, x).unwrap();
        let grads = tape.gradients(z, &[x]).unwrap();
        assert_eq!(grads[0].data, vec![7.0]);
    }

    #[test]
    fn unreached_variable_gets_zero_gradient() {
        let mut tape = Tape::new();
        let x = tape.leaf(Tensor::scalar(1.0));
        let unused = tape.leaf(Tensor::zeros(&[2, 2]));
        let y = tape.exp(x).unwrap();
        let grads = tape.gradients(y, &[unused]).unwrap();
        assert_eq!(grads[0], Tensor::zeros(&[2, 2]));
    }

    #[test]
    fn non_scalar_loss_is_rejected() {
        let mut tape = Tape::new();
        let x = tape.leaf(Tensor::zeros(&[3]));
        assert!(matches!(tape.gradients(x, &[x]), Err(MlError::NotScalar(_))));
    }

    #[test]
    fn squeeze_requires_unit_axis() {
        let mut tape = Tape::new();
        let x = tape.leaf(Tensor::zeros(&[2, 3]));
        assert!(tape.squeeze(x, 0).is_err());
        let y = tape.expand_dims(x, 0).unwrap();
        assert_eq!(tape.shape(y).unwrap(), &[1, 2, 3]);
        let z = tape.squeeze(y, 0).unwrap();
        assert_eq!(tape.shape(z).unwrap(), &[2, 3]);
    }
}
