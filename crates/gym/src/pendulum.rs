use std::collections::BTreeMap;
use std::f32::consts::PI;

use ml::{Tape, Var};
use render::{colors, Canvas, Viewport};

use crate::common::{self, clamped_action, integrate, scalar};
use crate::{Env, EnvName, Result, Snapshot, Transition};

#[derive(Clone, Debug)]
pub struct PendulumConfig {
    pub gravity: f32,
    /// Rod mass in kg
    pub mass: f32,
    /// Rod length in meters
    pub length: f32,
    /// Torque applied for an action of magnitude 1
    pub max_torque: f32,
    /// Angular speed limit in rad/s
    pub max_speed: f32,
    pub dt: f32,
}

impl Default for PendulumConfig {
    fn default() -> Self {
        Self { gravity: 10.0, mass: 1.0, length: 1.0, max_torque: 2.0, max_speed: 8.0, dt: 0.05 }
    }
}

/// Torque-limited pendulum swing-up. `θ = 0` is upright.
///
/// State: `[θ, θ̇]`. Observation: `[cos θ, sin θ, θ̇]`.
pub struct Pendulum {
    config: PendulumConfig,
    rng: fastrand::Rng,
    state: Vec<Var>,
}

impl Pendulum {
    #[must_use]
    pub fn new(config: PendulumConfig, rng: fastrand::Rng) -> Self {
        Self { config, rng, state: Vec::new() }
    }

    fn observe(tape: &mut Tape, [theta, theta_dot]: [Var; 2]) -> Result<Var> {
        let cos = tape.cos(theta)?;
        let sin = tape.sin(theta)?;
        Ok(tape.concat(&[cos, sin, theta_dot])?)
    }
}

impl Env for Pendulum {
    fn name(&self) -> EnvName {
        EnvName::Pendulum
    }

    fn observation_shape(&self) -> Vec<usize> {
        vec![3]
    }

    fn action_shape(&self) -> Vec<usize> {
        vec![1]
    }

    fn viewport(&self) -> Viewport {
        let half = 1.25 * self.config.length;
        Viewport::centered(half, half)
    }

    fn reset(&mut self, tape: &mut Tape) -> Result<Var> {
        let theta = common::uniform(&mut self.rng, -PI, PI);
        let theta_dot = common::uniform(&mut self.rng, -1.0, 1.0);
        let state = [scalar(tape, theta), scalar(tape, theta_dot)];
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
        let [theta, theta_dot] = common::state_array::<2>(self.name(), &self.state)?;
        let c = &self.config;

        let a = clamped_action(tape, EnvName::Pendulum, action, 1)?;
        // θ̈ = 3g/(2l) sin θ + 3/(m l²) u
        let sin = tape.sin(theta)?;
        let fall = tape.mul_scalar(sin, 3.0 * c.gravity / (2.0 * c.length))?;
        let drive = tape.mul_scalar(a, 3.0 * c.max_torque / (c.mass * c.length * c.length))?;
        let theta_acc = tape.add(fall, drive)?;

        let theta_dot = integrate(tape, theta_dot, theta_acc, c.dt)?;
        let theta_dot = tape.clamp(theta_dot, -c.max_speed, c.max_speed)?;
        let theta = integrate(tape, theta, theta_dot, c.dt)?;

        let cos = tape.cos(theta)?;
        let reward = tape.add_scalar(cos, 1.0)?;
        let reward = tape.mul_scalar(reward, 0.5)?;

        let [theta_host] = common::host(tape, [theta])?;
        let state = [theta, theta_dot];
        self.state = state.to_vec();
        let obs = Self::observe(tape, state)?;
        Ok(Transition { obs, reward, done: false, info: BTreeMap::from([("theta", theta_host)]) })
    }

    fn render(&self, tape: &Tape, canvas: &mut Canvas) -> Result<()> {
        let [theta, _] = common::state_array::<2>(self.name(), &self.state)?;
        let [theta] = common::host(tape, [theta])?;
        let l = self.config.length;

        canvas.clear(colors::BACKGROUND);
        canvas.line((0.0, 0.0), (l * theta.sin(), l * theta.cos()), 0.1 * l, colors::LINK);
        canvas.circle((0.0, 0.0), 0.05 * l, colors::JOINT);
        Ok(())
    }
}
