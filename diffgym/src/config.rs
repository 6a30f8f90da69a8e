//! Training configuration: defaults, JSON files and validation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gym::EnvName;
use ml::{BackendKind, MlError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error(
        "the {0} backend cannot compute gradients; policy optimisation differentiates through the \
         environment and needs a backend with automatic differentiation (tape or graph)"
    )]
    NonDifferentiableBackend(BackendKind),
    #[error("{0} must be positive")]
    ZeroValue(&'static str),
    #[error("learning rate must be finite and non-negative, got {0}")]
    InvalidLearningRate(f32),
    #[error(transparent)]
    Ml(#[from] MlError),
}

/// Everything the training driver needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Environment to optimise the policy in
    pub env: EnvName,
    /// Numeric backend; picked at random among differentiable ones when unset
    pub backend: Option<BackendKind>,
    /// Environment steps per rollout
    pub steps: usize,
    /// Number of gradient steps
    pub iters: usize,
    /// Gradient descent learning rate
    pub lr: f32,
    /// Seed for parameter initialisation, environment resets and backend choice
    pub seed: u64,
    /// Iterations per logged mean score
    pub log_freq: usize,
    /// Iterations between rendered episodes
    pub vis_freq: usize,
    /// Whether to render episodes to PNG frames
    pub visuals: bool,
    /// Root directory for rendered frames
    pub frames_dir: PathBuf,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            env: EnvName::CartPole,
            backend: None,
            steps: 100,
            iters: 10000,
            lr: 0.001,
            seed: 0,
            log_freq: 100,
            vis_freq: 1000,
            visuals: true,
            frames_dir: PathBuf::from("frames"),
        }
    }
}

impl TrainConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("steps", self.steps), ("log_freq", self.log_freq), ("vis_freq", self.vis_freq)] {
            if value == 0 {
                return Err(ConfigError::ZeroValue(name));
            }
        }
        if !self.lr.is_finite() || self.lr < 0.0 {
            return Err(ConfigError::InvalidLearningRate(self.lr));
        }
        if let Some(kind) = self.backend {
            ensure_differentiable(kind)?;
        }
        Ok(())
    }

    /// Validates the configuration and settles the backend. An unset backend
    /// is drawn from the differentiable ones using `seed`.
    pub fn resolve_backend(&self) -> Result<BackendKind, ConfigError> {
        self.validate()?;
        let kind = match self.backend {
            Some(kind) => kind,
            None => {
                let mut rng = fastrand::Rng::with_seed(self.seed);
                BackendKind::choose_random(&mut rng, &[BackendKind::Eager])?
            }
        };
        ensure_differentiable(kind)?;
        Ok(kind)
    }
}

fn ensure_differentiable(kind: BackendKind) -> Result<(), ConfigError> {
    if kind.supports_grad() {
        Ok(())
    } else {
        Err(ConfigError::NonDifferentiableBackend(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = TrainConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.resolve_backend().unwrap().supports_grad());
    }

    #[test]
    fn eager_is_rejected() {
        let config = TrainConfig { backend: Some(BackendKind::Eager), ..TrainConfig::default() };
        assert_eq!(
            config.resolve_backend(),
            Err(ConfigError::NonDifferentiableBackend(BackendKind::Eager))
        );
        assert!(config.validate().unwrap_err().to_string().contains("automatic differentiation"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = TrainConfig::from_json(r#"{ "env": "Pendulum", "backend": "graph", "lr": 0.01 }"#).unwrap();
        assert_eq!(config.env, EnvName::Pendulum);
        assert_eq!(config.backend, Some(BackendKind::Graph));
        assert_eq!(config.steps, 100);
        assert!(config.visuals);
    }

    #[test]
    fn zero_frequencies_are_rejected() {
        let config = TrainConfig { vis_freq: 0, ..TrainConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroValue("vis_freq")));
        let config = TrainConfig { lr: f32::NAN, ..TrainConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLearningRate(_))));
    }
}
