use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MlError {
    #[error("shape mismatch in {op}: {lhs:?} vs {rhs:?}")]
    ShapeMismatch { op: &'static str, lhs: Vec<usize>, rhs: Vec<usize> },
    #[error("shape {shape:?} does not hold {len} elements")]
    InvalidShape { shape: Vec<usize>, len: usize },
    #[error("expected a single-element tensor, got shape {0:?}")]
    NotScalar(Vec<usize>),
    #[error("invalid bounds [{min}, {max}]")]
    InvalidBounds { min: f32, max: f32 },
    #[error("variable {0} is not on this tape")]
    UnknownVar(usize),
    #[error("backend `{0}` does not support automatic differentiation")]
    GradientUnsupported(&'static str),
    #[error("expected {expected} inputs, got {got}")]
    ArityMismatch { expected: usize, got: usize },
    #[error("input {index} has shape {got:?}, traced with {expected:?}")]
    InputShape { index: usize, expected: Vec<usize>, got: Vec<usize> },
    #[error("unknown backend `{0}` (expected one of: eager, tape, graph)")]
    UnknownBackend(String),
    #[error("no backend left to choose from")]
    NoBackendAvailable,
}

pub type Result<T> = std::result::Result<T, MlError>;
