use std::collections::BTreeMap;

use ml::{Tape, Var};
use render::{colors, Canvas, Viewport};

use crate::common::{self, clamped_action, integrate, proximity, scalar};
use crate::{Env, EnvName, Result, Snapshot, Transition};

#[derive(Clone, Debug)]
pub struct SwimmerConfig {
    /// Acceleration for a thrust of magnitude 1
    pub thrust_gain: f32,
    /// Linear drag coefficient
    pub drag: f32,
    /// Half-width of the square the body and goal start in
    pub spawn_extent: f32,
    /// Distance from the origin beyond which `done` is reported
    pub arena_radius: f32,
    pub dt: f32,
}

impl Default for SwimmerConfig {
    fn default() -> Self {
        Self { thrust_gain: 2.0, drag: 0.5, spawn_extent: 1.0, arena_radius: 2.5, dt: 0.05 }
    }
}

/// A point body in a viscous fluid steering towards a goal with 2-D thrust.
///
/// State: `[px, py, vx, vy, gx, gy]`. The observation is the state.
pub struct Swimmer {
    config: SwimmerConfig,
    rng: fastrand::Rng,
    state: Vec<Var>,
}

impl Swimmer {
    #[must_use]
    pub fn new(config: SwimmerConfig, rng: fastrand::Rng) -> Self {
        Self { config, rng, state: Vec::new() }
    }

    fn observe(tape: &mut Tape, state: [Var; 6]) -> Result<Var> {
        Ok(tape.concat(&state)?)
    }
}

impl Env for Swimmer {
    fn name(&self) -> EnvName {
        EnvName::Swimmer
    }

    fn observation_shape(&self) -> Vec<usize> {
        vec![6]
    }

    fn action_shape(&self) -> Vec<usize> {
        vec![2]
    }

    fn viewport(&self) -> Viewport {
        Viewport::centered(self.config.arena_radius, self.config.arena_radius)
    }

    fn reset(&mut self, tape: &mut Tape) -> Result<Var> {
        let e = self.config.spawn_extent;
        let mut draw = || common::uniform(&mut self.rng, -e, e);
        let (px, py, gx, gy) = (draw(), draw(), draw(), draw());
        let state = [px, py, 0.0, 0.0, gx, gy].map(|v| scalar(tape, v));
        self.state = state.to_vec();
        Self::observe(tape, state)
    }

    fn get_state(&self, tape: &Tape) -> Result<Snapshot> {
        common::state_array::<6>(self.name(), &self.state)?;
        common::snapshot(tape, &self.state)
    }

    fn set_state(&mut self, tape: &mut Tape, state: &[Var]) -> Result<Var> {
        let state = common::incoming_state::<6>(self.name(), state)?;
        self.state = state.to_vec();
        Self::observe(tape, state)
    }

    fn step(&mut self, tape: &mut Tape, action: Var) -> Result<Transition> {
        let [px, py, vx, vy, gx, gy] = common::state_array::<6>(self.name(), &self.state)?;
        let c = &self.config;

        let a = clamped_action(tape, EnvName::Swimmer, action, 2)?;
        let mut axes = [(px, vx), (py, vy)];
        for (i, (p, v)) in axes.iter_mut().enumerate() {
            // v̇ = gain·a - drag·v
            let thrust = tape.index(a, i)?;
            let thrust = tape.mul_scalar(thrust, c.thrust_gain)?;
            let drag = tape.mul_scalar(*v, -c.drag)?;
            let acc = tape.add(thrust, drag)?;
            *v = integrate(tape, *v, acc, c.dt)?;
            *p = integrate(tape, *p, *v, c.dt)?;
        }
        let [(px, vx), (py, vy)] = axes;

        let reward = proximity(tape, &[px, py], &[gx, gy], 1.0)?;

        let [px_host, py_host, gx_host, gy_host] = common::host(tape, [px, py, gx, gy])?;
        let done = px_host.hypot(py_host) > c.arena_radius;
        let distance = (px_host - gx_host).hypot(py_host - gy_host);
        let state = [px, py, vx, vy, gx, gy];
        self.state = state.to_vec();
        let obs = Self::observe(tape, state)?;
        Ok(Transition { obs, reward, done, info: BTreeMap::from([("distance", distance)]) })
    }

    fn render(&self, tape: &Tape, canvas: &mut Canvas) -> Result<()> {
        let [px, py, vx, vy, gx, gy] = common::state_array::<6>(self.name(), &self.state)?;
        let [px, py, vx, vy, gx, gy] = common::host(tape, [px, py, vx, vy, gx, gy])?;

        canvas.clear(colors::BACKGROUND);
        canvas.circle((gx, gy), 0.1, colors::GOAL);
        canvas.line((px, py), (px + 0.5 * vx, py + 0.5 * vy), 0.03, colors::LINK);
        canvas.circle((px, py), 0.08, colors::BODY);
        Ok(())
    }
}
