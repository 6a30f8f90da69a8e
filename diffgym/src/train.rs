//! Differentiable rollouts and the gradient step built on them.

use gym::{Env, Snapshot};
use ml::{GradientDescent, Prepared, Tape, Tensor, Var};

use crate::config::ConfigError;
use crate::policy::Policy;

/// Negative cumulative reward of `steps` policy-driven steps starting from
/// `initial_state`.
///
/// Termination flags are ignored; the rollout always runs for `steps` steps.
pub fn rollout_loss<P>(
    env: &mut dyn Env,
    tape: &mut Tape,
    initial_state: &[Var],
    mut policy_fn: P,
    steps: usize,
) -> gym::Result<Var>
where
    P: FnMut(&mut Tape, Var) -> ml::Result<Var>,
{
    let mut obs = env.set_state(tape, initial_state)?;
    let mut score = tape.constant(Tensor::zeros(&[1]));
    for _ in 0..steps {
        let action = policy_fn(tape, obs)?;
        let transition = env.step(tape, action)?;
        score = tape.add(score, transition.reward)?;
        obs = transition.obs;
    }
    Ok(tape.neg(score)?)
}

/// Differentiates the rollout loss from `initial_state` with respect to the
/// optimizer's parameters and applies one descent step.
///
/// Returns the rollout score (the negated loss) as a `[1]` tensor.
pub fn train_step(
    loss: &mut Prepared,
    backend: &ml::Backend,
    env: &mut dyn Env,
    policy: &Policy,
    optimizer: &mut GradientDescent,
    initial_state: &Snapshot,
    steps: usize,
) -> gym::Result<Tensor> {
    let state_len = initial_state.len();
    let mut inputs = initial_state.tensors().to_vec();
    inputs.extend_from_slice(optimizer.params());
    let wrt = state_len..inputs.len();

    let (value, grads) = loss.value_and_grad(backend, &inputs, wrt, |tape, vars| {
        let (state, params) = vars.split_at(state_len);
        rollout_loss(env, tape, state, |tape, obs| policy.forward(tape, obs, params), steps)
    })?;
    optimizer.step(&grads)?;
    Ok(Tensor::scalar(-value.item()?))
}

/// Collects scores and reports their mean every `log_freq` entries.
#[derive(Debug, Clone)]
pub struct ScoreHistory {
    log_freq: usize,
    scores: Vec<f32>,
}

impl ScoreHistory {
    pub fn new(log_freq: usize) -> Result<Self, ConfigError> {
        if log_freq == 0 {
            return Err(ConfigError::ZeroValue("log_freq"));
        }
        Ok(Self { log_freq, scores: Vec::with_capacity(log_freq) })
    }

    /// Records `score`. When the buffer is full, returns its mean and clears
    /// it.
    pub fn push(&mut self, score: f32) -> Option<f32> {
        self.scores.push(score);
        if self.scores.len() < self.log_freq {
            return None;
        }
        let mean = self.scores.iter().sum::<f32>() / self.scores.len() as f32;
        self.scores.clear();
        Some(mean)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_reports_mean_when_full() {
        let mut history = ScoreHistory::new(3).unwrap();
        assert_eq!(history.push(1.0), None);
        assert_eq!(history.push(2.0), None);
        assert_eq!(history.push(3.0), Some(2.0));
        assert!(history.is_empty());
        assert_eq!(history.push(5.0), None);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn history_needs_a_positive_frequency() {
        assert!(ScoreHistory::new(0).is_err());
    }
}
