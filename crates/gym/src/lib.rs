#![deny(clippy::all)]
//! # gym
//!
//! Differentiable control environments. Every state update is expressed as
//! [`ml::Tape`] operations, so the reward of a whole rollout can be
//! differentiated with respect to the actions that produced it, and through
//! them with respect to a policy's parameters.

mod common;

pub mod cartpole;
pub mod error;
pub mod mountain_car;
pub mod pendulum;
pub mod reacher;
pub mod swimmer;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ml::{Backend, Tape, Tensor, Var};
use render::{Canvas, Viewport};
use serde::{Deserialize, Serialize};

pub use cartpole::{CartPole, CartPoleConfig};
pub use error::{GymError, Result};
pub use mountain_car::{MountainCar, MountainCarConfig};
pub use pendulum::{Pendulum, PendulumConfig};
pub use reacher::{Reacher, ReacherConfig};
pub use swimmer::{Swimmer, SwimmerConfig};

/// The result of one [`Env::step`].
#[derive(Debug, Clone)]
pub struct Transition {
    /// Observation after the step.
    pub obs: Var,
    /// Reward for the step, shape `[1]`.
    pub reward: Var,
    /// Whether the state left the region the task cares about.
    /// Informational only; stepping past it is allowed.
    pub done: bool,
    /// Named host-side diagnostics.
    pub info: BTreeMap<&'static str, f32>,
}

/// A copy of an environment's state taken off a tape.
///
/// The contents are only meaningful to the environment that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    tensors: Vec<Tensor>,
}

impl Snapshot {
    #[must_use]
    pub fn new(tensors: Vec<Tensor>) -> Self {
        Self { tensors }
    }

    #[must_use]
    pub fn tensors(&self) -> &[Tensor] {
        &self.tensors
    }

    #[must_use]
    pub fn into_tensors(self) -> Vec<Tensor> {
        self.tensors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Adds every tensor to `tape` as a leaf, in order.
    pub fn load(&self, tape: &mut Tape) -> Vec<Var> {
        self.tensors.iter().map(|t| tape.leaf(t.clone())).collect()
    }
}

/// Differentiable environment.
///
/// State lives on the tape passed to the most recent [`reset`](Env::reset) or
/// [`set_state`](Env::set_state). Every later call must use that same tape.
pub trait Env {
    fn name(&self) -> EnvName;

    fn observation_shape(&self) -> Vec<usize>;

    fn action_shape(&self) -> Vec<usize>;

    /// The world rectangle [`render`](Env::render) draws into.
    fn viewport(&self) -> Viewport;

    /// Draws a new initial state from the environment's own random stream
    /// and returns the first observation.
    fn reset(&mut self, tape: &mut Tape) -> Result<Var>;

    fn get_state(&self, tape: &Tape) -> Result<Snapshot>;

    /// Restores a state previously taken with [`get_state`](Env::get_state)
    /// and loaded onto `tape`. Returns the matching observation.
    fn set_state(&mut self, tape: &mut Tape, state: &[Var]) -> Result<Var>;

    /// Advances one time step. Actions are clamped to `[-1, 1]` per element
    /// before scaling.
    fn step(&mut self, tape: &mut Tape, action: Var) -> Result<Transition>;

    fn render(&self, tape: &Tape, canvas: &mut Canvas) -> Result<()>;
}

/// The available environments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnvName {
    CartPole,
    Pendulum,
    MountainCar,
    Reacher,
    Swimmer,
}

impl EnvName {
    pub const ALL: [EnvName; 5] =
        [EnvName::CartPole, EnvName::Pendulum, EnvName::MountainCar, EnvName::Reacher, EnvName::Swimmer];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EnvName::CartPole => "CartPole",
            EnvName::Pendulum => "Pendulum",
            EnvName::MountainCar => "MountainCar",
            EnvName::Reacher => "Reacher",
            EnvName::Swimmer => "Swimmer",
        }
    }
}

impl fmt::Display for EnvName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvName {
    type Err = GymError;

    /// Case-insensitive; `-` and `_` are ignored so `mountain_car` works too.
    fn from_str(s: &str) -> Result<Self> {
        let wanted: String = s.chars().filter(|c| !matches!(c, '-' | '_')).collect();
        Self::ALL
            .into_iter()
            .find(|n| n.as_str().eq_ignore_ascii_case(wanted.trim()))
            .ok_or_else(|| GymError::UnknownEnv(s.to_string()))
    }
}

/// Builds `name` with its default configuration. The environment gets its own
/// random stream forked from `backend`.
pub fn make(name: EnvName, backend: &mut Backend) -> Box<dyn Env> {
    let rng = backend.fork_rng();
    tracing::debug!("creating {name} environment");
    match name {
        EnvName::CartPole => Box::new(CartPole::new(CartPoleConfig::default(), rng)),
        EnvName::Pendulum => Box::new(Pendulum::new(PendulumConfig::default(), rng)),
        EnvName::MountainCar => Box::new(MountainCar::new(MountainCarConfig::default(), rng)),
        EnvName::Reacher => Box::new(Reacher::new(ReacherConfig::default(), rng)),
        EnvName::Swimmer => Box::new(Swimmer::new(SwimmerConfig::default(), rng)),
    }
}
