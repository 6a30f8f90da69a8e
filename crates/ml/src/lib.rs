#![deny(clippy::all)]
//! # ml
//!
//! Tensors, reverse-mode automatic differentiation and the small amount of
//! neural-network machinery the policy optimisation demo needs.
//!
//! -   [`Tensor`] is a host-side `f32` buffer with a shape.
//! -   [`Tape`] evaluates operations and, when recording, remembers them so
//!     [`Tape::gradients`] can run the backward pass.
//! -   [`CompiledFn`] traces a closure once and replays it on new inputs.
//! -   [`Backend`] bundles a [`BackendKind`] with a seeded random stream; it is
//!     passed explicitly to everything that needs either.
//! -   [`GradientDescent`] owns parameters and applies descent steps.

pub mod backend;
pub mod compile;
pub mod error;
pub mod graph;
pub mod nn;
pub mod optim;
pub mod tape;
pub mod tensor;

pub use backend::{Backend, BackendKind, Prepared};
pub use compile::CompiledFn;
pub use error::{MlError, Result};
pub use nn::{Activation, Dense};
pub use optim::{gradient_descent_update, GradientDescent};
pub use tape::{Tape, Var};
pub use tensor::Tensor;
