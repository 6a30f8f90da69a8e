#![deny(clippy::all)]
//! # diffgym
//!
//! Trains a small policy network by gradient descent, where the gradient of
//! a rollout's total reward is obtained by differentiating straight through
//! the environment dynamics.
//!
//! -   [`Policy`] is a three-layer `tanh` network over explicit parameters.
//! -   [`rollout_loss`] and [`train_step`] turn an environment snapshot and a
//!     set of parameters into a loss and a descent step.
//! -   [`run`] is the driver behind the `diffgym` binary.

pub mod app;
pub mod cli;
pub mod config;
pub mod policy;
pub mod train;

pub use app::{run, TrainReport};
pub use cli::Cli;
pub use config::{ConfigError, TrainConfig};
pub use policy::{Policy, PolicyError, HIDDEN};
pub use train::{rollout_loss, train_step, ScoreHistory};
