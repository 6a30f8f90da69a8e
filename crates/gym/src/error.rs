use ml::MlError;
use thiserror::Error;

use crate::EnvName;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GymError {
    #[error(transparent)]
    Ml(#[from] MlError),
    #[error("unknown environment `{0}`, expected one of CartPole, Pendulum, MountainCar, Reacher, Swimmer")]
    UnknownEnv(String),
    #[error("{env} expects {expected} state values, got {got}")]
    StateArity { env: EnvName, expected: usize, got: usize },
    #[error("{env} expects an action of shape {expected:?}, got {got:?}")]
    ActionShape { env: EnvName, expected: Vec<usize>, got: Vec<usize> },
    #[error("{0} has no state yet, call reset or set_state first")]
    NotReset(EnvName),
}

pub type Result<T> = std::result::Result<T, GymError>;
