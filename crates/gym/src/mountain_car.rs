use std::collections::BTreeMap;

use ml::{Tape, Var};
use render::{colors, Canvas, Viewport};

use crate::common::{self, clamped_action, scalar};
use crate::{Env, EnvName, Result, Snapshot, Transition};

#[derive(Clone, Debug)]
pub struct MountainCarConfig {
    /// Left end of the track
    pub min_position: f32,
    /// Right end of the track
    pub max_position: f32,
    pub max_speed: f32,
    /// Position of the flag on the right hill
    pub goal_position: f32,
    /// Velocity change per step for an action of magnitude 1
    pub power: f32,
    /// Width of the reward bump around the goal
    pub reward_width: f32,
}

impl Default for MountainCarConfig {
    fn default() -> Self {
        Self {
            min_position: -1.2,
            max_position: 0.6,
            max_speed: 0.07,
            goal_position: 0.45,
            power: 0.0015,
            reward_width: 0.1,
        }
    }
}

/// An under-powered car in a valley that has to rock back and forth to reach
/// the flag.
///
/// State and observation: `[x, ẋ]`.
pub struct MountainCar {
    config: MountainCarConfig,
    rng: fastrand::Rng,
    state: Vec<Var>,
}

impl MountainCar {
    #[must_use]
    pub fn new(config: MountainCarConfig, rng: fastrand::Rng) -> Self {
        Self { config, rng, state: Vec::new() }
    }

    fn observe(tape: &mut Tape, [x, x_dot]: [Var; 2]) -> Result<Var> {
        Ok(tape.concat(&[x, x_dot])?)
    }

    fn height(x: f32) -> f32 {
        0.45 * (3.0 * x).sin() + 0.55
    }
}

impl Env for MountainCar {
    fn name(&self) -> EnvName {
        EnvName::MountainCar
    }

    fn observation_shape(&self) -> Vec<usize> {
        vec![2]
    }

    fn action_shape(&self) -> Vec<usize> {
        vec![1]
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(self.config.min_position, self.config.max_position, 0.0, 1.2)
    }

    fn reset(&mut self, tape: &mut Tape) -> Result<Var> {
        let x = common::uniform(&mut self.rng, -0.6, -0.4);
        let state = [scalar(tape, x), scalar(tape, 0.0)];
        self.state = state.to_vec();
        Self::observe(tape, state)
    }

    fn get_state(&self, tape: &Tape) -> Result<Snapshot> {
        common::state_array::<2>(self.name(), &self.state)?;
        common::snapshot(tape, &self.state)
    }

    fn set_state(&mut self, tape: &mut Tape, state: &[Var]) -> Result<Var> {
        let state = common::incoming_state::<2>(self.name(), state)?;
        self.state = state.to_vec();
        Self::observe(tape, state)
    }

    fn step(&mut self, tape: &mut Tape, action: Var) -> Result<Transition> {
        let [x, x_dot] = common::state_array::<2>(self.name(), &self.state)?;
        let c = &self.config;

        // ẋ' = ẋ + a·power - 0.0025 cos 3x
        let a = clamped_action(tape, EnvName::MountainCar, action, 1)?;
        let push = tape.mul_scalar(a, c.power)?;
        let x3 = tape.mul_scalar(x, 3.0)?;
        let slope = tape.cos(x3)?;
        let slope = tape.mul_scalar(slope, -0.0025)?;
        let x_dot = tape.add(x_dot, push)?;
        let x_dot = tape.add(x_dot, slope)?;
        let x_dot = tape.clamp(x_dot, -c.max_speed, c.max_speed)?;
        let x = tape.add(x, x_dot)?;
        let x = tape.clamp(x, c.min_position, c.max_position)?;

        // exp(-(x - goal)² / σ)
        let offset = tape.add_scalar(x, -c.goal_position)?;
        let offset = tape.square(offset)?;
        let reward = tape.mul_scalar(offset, -1.0 / c.reward_width)?;
        let reward = tape.exp(reward)?;

        let [x_host] = common::host(tape, [x])?;
        let done = x_host >= c.goal_position;
        let state = [x, x_dot];
        self.state = state.to_vec();
        let obs = Self::observe(tape, state)?;
        Ok(Transition { obs, reward, done, info: BTreeMap::from([("x", x_host)]) })
    }

    fn render(&self, tape: &Tape, canvas: &mut Canvas) -> Result<()> {
        let [x, _] = common::state_array::<2>(self.name(), &self.state)?;
        let [x] = common::host(tape, [x])?;
        let c = &self.config;

        canvas.clear(colors::BACKGROUND);
        let samples = 100;
        let track: Vec<(f32, f32)> = (0..=samples)
            .map(|i| {
                let px = c.min_position + (c.max_position - c.min_position) * i as f32 / samples as f32;
                (px, Self::height(px))
            })
            .collect();
        canvas.polyline(&track, 0.01, colors::GROUND);
        let flag = Self::height(c.goal_position);
        canvas.line((c.goal_position, flag), (c.goal_position, flag + 0.1), 0.01, colors::GOAL);
        canvas.circle((x, Self::height(x) + 0.04), 0.04, colors::BODY);
        Ok(())
    }
}
