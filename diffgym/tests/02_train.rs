use std::collections::BTreeMap;

use diffgym::{rollout_loss, train_step, Policy};
use gym::{Env, EnvName, Snapshot, Transition};
use ml::{Backend, BackendKind, GradientDescent, Prepared, Tape, Tensor, Var};
use render::{Canvas, Viewport};

/// Pays a constant reward regardless of the action.
struct ConstantReward {
    state: Vec<Var>,
}

/// Observation is fixed; reward is `-(a - 0.5)²` per action element.
struct HitTarget {
    state: Vec<Var>,
}

const TARGET: f32 = 0.5;

impl ConstantReward {
    fn new() -> Self {
        Self { state: Vec::new() }
    }

    fn snapshot() -> Snapshot {
        Snapshot::new(vec![Tensor::zeros(&[2])])
    }
}

impl HitTarget {
    fn new() -> Self {
        Self { state: Vec::new() }
    }

    fn snapshot() -> Snapshot {
        Snapshot::new(vec![Tensor::from_vec(vec![2], vec![1.0, -0.5])])
    }
}

fn common_get_state(state: &[Var], tape: &Tape) -> gym::Result<Snapshot> {
    let tensors = state.iter().map(|v| tape.value(*v).cloned()).collect::<ml::Result<Vec<_>>>()?;
    Ok(Snapshot::new(tensors))
}

impl Env for ConstantReward {
    fn name(&self) -> EnvName {
        EnvName::CartPole
    }
    fn observation_shape(&self) -> Vec<usize> {
        vec![2]
    }
    fn action_shape(&self) -> Vec<usize> {
        vec![1]
    }
    fn viewport(&self) -> Viewport {
        Viewport::centered(1.0, 1.0)
    }
    fn reset(&mut self, tape: &mut Tape) -> gym::Result<Var> {
        let state = Self::snapshot().load(tape);
        self.set_state(tape, &state)
    }
    fn get_state(&self, tape: &Tape) -> gym::Result<Snapshot> {
        common_get_state(&self.state, tape)
    }
    fn set_state(&mut self, _tape: &mut Tape, state: &[Var]) -> gym::Result<Var> {
        self.state = state.to_vec();
        Ok(state[0])
    }
    fn step(&mut self, tape: &mut Tape, _action: Var) -> gym::Result<Transition> {
        let reward = tape.constant(Tensor::scalar(1.0));
        Ok(Transition { obs: self.state[0], reward, done: false, info: BTreeMap::new() })
    }
    fn render(&self, _tape: &Tape, _canvas: &mut Canvas) -> gym::Result<()> {
        Ok(())
    }
}

impl Env for HitTarget {
    fn name(&self) -> EnvName {
        EnvName::Pendulum
    }
    fn observation_shape(&self) -> Vec<usize> {
        vec![2]
    }
    fn action_shape(&self) -> Vec<usize> {
        vec![1]
    }
    fn viewport(&self) -> Viewport {
        Viewport::centered(1.0, 1.0)
    }
    fn reset(&mut self, tape: &mut Tape) -> gym::Result<Var> {
        let state = Self::snapshot().load(tape);
        self.set_state(tape, &state)
    }
    fn get_state(&self, tape: &Tape) -> gym::Result<Snapshot> {
        common_get_state(&self.state, tape)
    }
    fn set_state(&mut self, _tape: &mut Tape, state: &[Var]) -> gym::Result<Var> {
        self.state = state.to_vec();
        Ok(state[0])
    }
    fn step(&mut self, tape: &mut Tape, action: Var) -> gym::Result<Transition> {
        let miss = tape.add_scalar(action, -TARGET)?;
        let miss = tape.square(miss)?;
        let miss = tape.sum(miss)?;
        let reward = tape.neg(miss)?;
        Ok(Transition { obs: self.state[0], reward, done: false, info: BTreeMap::new() })
    }
    fn render(&self, _tape: &Tape, _canvas: &mut Canvas) -> gym::Result<()> {
        Ok(())
    }
}

#[test]
fn constant_reward_rollout_loss() {
    let mut env = ConstantReward::new();
    let mut tape = Tape::new();
    let state = ConstantReward::snapshot().load(&mut tape);
    let loss = rollout_loss(&mut env, &mut tape, &state, |tape, _| Ok(tape.constant(Tensor::zeros(&[1]))), 5).unwrap();
    assert_eq!(tape.item(loss).unwrap(), -5.0);
}

#[test]
fn zero_step_rollout_costs_nothing() {
    let mut env = HitTarget::new();
    let mut tape = Tape::new();
    let state = HitTarget::snapshot().load(&mut tape);
    let loss = rollout_loss(&mut env, &mut tape, &state, |_, obs| Ok(obs), 0).unwrap();
    assert_eq!(tape.value(loss).unwrap(), &Tensor::scalar(-0.0));
}

fn train_scores(kind: BackendKind, lr: f32, iters: usize) -> (Vec<f32>, Vec<Tensor>, Vec<Tensor>) {
    let mut backend = Backend::new(kind, 0);
    let mut env = HitTarget::new();
    let policy = Policy::new(2, 1).unwrap();
    let initial = policy.init_params(&mut backend);
    let mut optimizer = GradientDescent::new(initial.clone(), lr);
    let mut loss = Prepared::new();

    let mut scores = Vec::new();
    for _ in 0..iters {
        let mut tape = Tape::eager();
        env.reset(&mut tape).unwrap();
        let snapshot = env.get_state(&tape).unwrap();
        let score = train_step(&mut loss, &backend, &mut env, &policy, &mut optimizer, &snapshot, 5).unwrap();
        assert_eq!(score.shape, vec![1]);
        scores.push(score.data[0]);
    }
    assert_eq!(loss.is_compiled(), kind.compiles());
    (scores, initial, optimizer.into_params())
}

#[test]
fn loss_decreases_on_a_convex_task() {
    for kind in [BackendKind::Tape, BackendKind::Graph] {
        let (scores, _, _) = train_scores(kind, 0.001, 100);
        let first = scores[0];
        let last = *scores.last().unwrap();
        // Score is the negated loss.
        assert!(last > first, "{kind}: score went from {first} to {last}");
        assert!(last > -0.05, "{kind}: final score {last}");
    }
}

#[test]
fn tape_and_graph_backends_agree() {
    let (tape_scores, _, tape_params) = train_scores(BackendKind::Tape, 0.001, 10);
    let (graph_scores, _, graph_params) = train_scores(BackendKind::Graph, 0.001, 10);
    assert_eq!(tape_scores, graph_scores);
    assert_eq!(tape_params, graph_params);
}

#[test]
fn zero_learning_rate_leaves_parameters_untouched() {
    let (scores, initial, after) = train_scores(BackendKind::Graph, 0.0, 3);
    assert_eq!(initial, after);
    assert_eq!(scores[0], scores[2]);
}
