//! The numeric capability handed to every component that needs randomness,
//! tapes or gradients.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::compile::CompiledFn;
use crate::error::{MlError, Result};
use crate::tape::{Tape, Var};
use crate::tensor::Tensor;

/// How values are computed and differentiated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Plain numeric evaluation. No gradients.
    Eager,
    /// Records a fresh tape on every evaluation.
    Tape,
    /// Traces once, then replays the recorded graph.
    Graph,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [BackendKind::Eager, BackendKind::Tape, BackendKind::Graph];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            BackendKind::Eager => "eager",
            BackendKind::Tape => "tape",
            BackendKind::Graph => "graph",
        }
    }

    #[must_use]
    pub const fn supports_grad(self) -> bool {
        !matches!(self, BackendKind::Eager)
    }

    /// Whether evaluation goes through an ahead-of-time traced graph.
    #[must_use]
    pub const fn compiles(self) -> bool {
        matches!(self, BackendKind::Graph)
    }

    /// Picks uniformly among the kinds not listed in `excluded`.
    pub fn choose_random(rng: &mut fastrand::Rng, excluded: &[BackendKind]) -> Result<Self> {
        let candidates: Vec<BackendKind> =
            Self::ALL.into_iter().filter(|k| !excluded.contains(k)).collect();
        if candidates.is_empty() {
            return Err(MlError::NoBackendAvailable);
        }
        Ok(candidates[rng.usize(..candidates.len())])
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = MlError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MlError::UnknownBackend(s.to_string()))
    }
}

/// A seeded numeric backend.
pub struct Backend {
    kind: BackendKind,
    rng: fastrand::Rng,
}

impl Backend {
    #[must_use]
    pub fn new(kind: BackendKind, seed: u64) -> Self {
        Self { kind, rng: fastrand::Rng::with_seed(seed) }
    }

    #[must_use]
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Re-seeds the random stream.
    pub fn seed(&mut self, seed: u64) {
        self.rng.seed(seed);
    }

    pub fn rng(&mut self) -> &mut fastrand::Rng {
        &mut self.rng
    }

    /// A new generator seeded from this backend's stream, for components that
    /// keep their own randomness (environments).
    pub fn fork_rng(&mut self) -> fastrand::Rng {
        fastrand::Rng::with_seed(self.rng.u64(..))
    }

    pub fn random_uniform(&mut self, low: f32, high: f32, shape: &[usize]) -> Tensor {
        Tensor::random_uniform(low, high, shape, &mut self.rng)
    }

    #[must_use]
    pub fn zeros(&self, shape: &[usize]) -> Tensor {
        Tensor::zeros(shape)
    }

    /// A tape matching the backend: recording when gradients are supported.
    #[must_use]
    pub fn tape(&self) -> Tape {
        if self.kind.supports_grad() { Tape::new() } else { Tape::eager() }
    }

    /// Traces `f` on `inputs` and returns its value together with the
    /// gradients of the inputs in `wrt`.
    pub fn value_and_grad<F, E>(
        &self,
        inputs: &[Tensor],
        wrt: Range<usize>,
        f: F,
    ) -> std::result::Result<(Tensor, Vec<Tensor>), E>
    where
        F: FnOnce(&mut Tape, &[Var]) -> std::result::Result<Var, E>,
        E: From<MlError>,
    {
        if !self.kind.supports_grad() {
            return Err(MlError::GradientUnsupported(self.kind.name()).into());
        }
        Ok(CompiledFn::trace(inputs, f)?.value_and_grad_at_trace(wrt)?)
    }

    /// Traces `f` once for repeated evaluation.
    pub fn compile<F, E>(&self, example_inputs: &[Tensor], f: F) -> std::result::Result<CompiledFn, E>
    where
        F: FnOnce(&mut Tape, &[Var]) -> std::result::Result<Var, E>,
        E: From<MlError>,
    {
        CompiledFn::trace(example_inputs, f)
    }
}

/// A scalar function prepared for repeated differentiation on one backend.
///
/// With [`BackendKind::Graph`] the first call traces and every later call
/// replays the trace, ignoring the closure it is given. With
/// [`BackendKind::Tape`] every call retraces.
#[derive(Default)]
pub struct Prepared {
    compiled: Option<CompiledFn>,
}

impl Prepared {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    pub fn value_and_grad<F, E>(
        &mut self,
        backend: &Backend,
        inputs: &[Tensor],
        wrt: Range<usize>,
        f: F,
    ) -> std::result::Result<(Tensor, Vec<Tensor>), E>
    where
        F: FnOnce(&mut Tape, &[Var]) -> std::result::Result<Var, E>,
        E: From<MlError>,
    {
        match backend.kind() {
            BackendKind::Eager => Err(MlError::GradientUnsupported(BackendKind::Eager.name()).into()),
            BackendKind::Tape => backend.value_and_grad(inputs, wrt, f),
            BackendKind::Graph => {
                if let Some(compiled) = self.compiled.as_mut() {
                    return Ok(compiled.value_and_grad(inputs, wrt)?);
                }
                let compiled = backend.compile(inputs, f)?;
                let result = compiled.value_and_grad_at_trace(wrt);
                self.compiled = Some(compiled);
                Ok(result?)
            }
        }
    }
}
