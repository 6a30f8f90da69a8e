use std::ops::Range;

use crate::error::{MlError, Result};
use crate::tape::{Tape, Var};
use crate::tensor::Tensor;

/// A function traced once onto a recording tape and replayed on new inputs.
///
/// Replay re-runs the recorded nodes, so anything the traced closure decided
/// on the host (branches, loop counts, constants) is fixed at trace time.
pub struct CompiledFn {
    tape: Tape,
    inputs: Vec<Var>,
    output: Var,
}

impl CompiledFn {
    /// Records `f` applied to `example_inputs`. `f` may fail with any error
    /// an [`MlError`] converts into.
    pub fn trace<F, E>(example_inputs: &[Tensor], f: F) -> std::result::Result<Self, E>
    where
        F: FnOnce(&mut Tape, &[Var]) -> std::result::Result<Var, E>,
        E: From<MlError>,
    {
        let mut tape = Tape::new();
        let inputs: Vec<Var> = example_inputs.iter().map(|t| tape.leaf(t.clone())).collect();
        let output = f(&mut tape, &inputs)?;
        tracing::debug!(
            inputs = inputs.len(),
            nodes = tape.node_count(),
            "traced function"
        );
        Ok(Self { tape, inputs, output })
    }

    #[must_use]
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.tape.node_count()
    }

    fn load(&mut self, inputs: &[Tensor]) -> Result<()> {
        if inputs.len() != self.inputs.len() {
            return Err(MlError::ArityMismatch { expected: self.inputs.len(), got: inputs.len() });
        }
        for (index, (&var, input)) in self.inputs.iter().zip(inputs).enumerate() {
            let expected = self.tape.shape(var)?;
            if expected != input.shape.as_slice() {
                return Err(MlError::InputShape {
                    index,
                    expected: expected.to_vec(),
                    got: input.shape.clone(),
                });
            }
        }
        self.tape.replay(&self.inputs, inputs)
    }

    /// Evaluates the traced function on `inputs`.
    pub fn call(&mut self, inputs: &[Tensor]) -> Result<Tensor> {
        self.load(inputs)?;
        Ok(self.tape.value(self.output)?.clone())
    }

    /// Evaluates on `inputs` and differentiates with respect to the inputs in
    /// `wrt`.
    pub fn value_and_grad(&mut self, inputs: &[Tensor], wrt: Range<usize>) -> Result<(Tensor, Vec<Tensor>)> {
        self.load(inputs)?;
        self.value_and_grad_at_trace(wrt)
    }

    /// Value and gradients at whatever inputs the tape currently holds.
    pub(crate) fn value_and_grad_at_trace(&self, wrt: Range<usize>) -> Result<(Tensor, Vec<Tensor>)> {
        let wrt_vars = self.inputs.get(wrt.clone()).ok_or(MlError::ArityMismatch {
            expected: wrt.end,
            got: self.inputs.len(),
        })?;
        let grads = self.tape.gradients(self.output, wrt_vars)?;
        Ok((self.tape.value(self.output)?.clone(), grads))
    }
}
