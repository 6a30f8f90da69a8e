use std::collections::BTreeMap;
use std::f32::consts::PI;

use ml::{Tape, Var};
use render::{colors, Canvas, Viewport};

use crate::common::{self, clamped_action, integrate, proximity, scalar};
use crate::{Env, EnvName, Result, Snapshot, Transition};

#[derive(Clone, Debug)]
pub struct ReacherConfig {
    /// Length of the upper link in meters
    pub upper_length: f32,
    /// Length of the lower link in meters
    pub lower_length: f32,
    /// Angular acceleration for an action of magnitude 1
    pub torque_gain: f32,
    /// Viscous damping on the joints
    pub damping: f32,
    /// Sharpness of the reward around the goal
    pub reward_sharpness: f32,
    pub dt: f32,
}

impl Default for ReacherConfig {
    fn default() -> Self {
        Self {
            upper_length: 0.5,
            lower_length: 0.5,
            torque_gain: 10.0,
            damping: 1.0,
            reward_sharpness: 5.0,
            dt: 0.05,
        }
    }
}

/// A planar two-link arm that has to bring its fingertip to a goal.
///
/// State: `[q₁, q₂, q̇₁, q̇₂, gx, gy]`.
/// Observation: `[cos q₁, cos q₂, sin q₁, sin q₂, q̇₁, q̇₂, gx, gy]`.
pub struct Reacher {
    config: ReacherConfig,
    rng: fastrand::Rng,
    state: Vec<Var>,
}

impl Reacher {
    #[must_use]
    pub fn new(config: ReacherConfig, rng: fastrand::Rng) -> Self {
        Self { config, rng, state: Vec::new() }
    }

    fn observe(tape: &mut Tape, [q1, q2, q1_dot, q2_dot, gx, gy]: [Var; 6]) -> Result<Var> {
        let c1 = tape.cos(q1)?;
        let c2 = tape.cos(q2)?;
        let s1 = tape.sin(q1)?;
        let s2 = tape.sin(q2)?;
        Ok(tape.concat(&[c1, c2, s1, s2, q1_dot, q2_dot, gx, gy])?)
    }

    /// Fingertip position as tape values.
    fn fingertip(&self, tape: &mut Tape, q1: Var, q2: Var) -> Result<[Var; 2]> {
        let (l1, l2) = (self.config.upper_length, self.config.lower_length);
        let q12 = tape.add(q1, q2)?;
        let c1 = tape.cos(q1)?;
        let c12 = tape.cos(q12)?;
        let s1 = tape.sin(q1)?;
        let s12 = tape.sin(q12)?;

        let upper = tape.mul_scalar(c1, l1)?;
        let lower = tape.mul_scalar(c12, l2)?;
        let x = tape.add(upper, lower)?;
        let upper = tape.mul_scalar(s1, l1)?;
        let lower = tape.mul_scalar(s12, l2)?;
        let y = tape.add(upper, lower)?;
        Ok([x, y])
    }
}

impl Env for Reacher {
    fn name(&self) -> EnvName {
        EnvName::Reacher
    }

    fn observation_shape(&self) -> Vec<usize> {
        vec![8]
    }

    fn action_shape(&self) -> Vec<usize> {
        vec![2]
    }

    fn viewport(&self) -> Viewport {
        let reach = 1.2 * (self.config.upper_length + self.config.lower_length);
        Viewport::centered(reach, reach)
    }

    fn reset(&mut self, tape: &mut Tape) -> Result<Var> {
        let reach = self.config.upper_length + self.config.lower_length;
        let q1 = common::uniform(&mut self.rng, -PI, PI);
        let q2 = common::uniform(&mut self.rng, -PI, PI);
        // Goal uniform over the reachable disc.
        let (gx, gy) = loop {
            let gx = common::uniform(&mut self.rng, -reach, reach);
            let gy = common::uniform(&mut self.rng, -reach, reach);
            if gx * gx + gy * gy <= reach * reach {
                break (gx, gy);
            }
        };
        let state = [q1, q2, 0.0, 0.0, gx, gy].map(|v| scalar(tape, v));
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
        let [q1, q2, q1_dot, q2_dot, gx, gy] = common::state_array::<6>(self.name(), &self.state)?;
        let (gain, damping, dt) = (self.config.torque_gain, self.config.damping, self.config.dt);

        let a = clamped_action(tape, EnvName::Reacher, action, 2)?;
        let mut joints = [(q1, q1_dot), (q2, q2_dot)];
        for (i, (q, q_dot)) in joints.iter_mut().enumerate() {
            // q̈ = gain·a - damping·q̇
            let torque = tape.index(a, i)?;
            let torque = tape.mul_scalar(torque, gain)?;
            let drag = tape.mul_scalar(*q_dot, -damping)?;
            let acc = tape.add(torque, drag)?;
            *q_dot = integrate(tape, *q_dot, acc, dt)?;
            *q = integrate(tape, *q, *q_dot, dt)?;
        }
        let [(q1, q1_dot), (q2, q2_dot)] = joints;

        let tip = self.fingertip(tape, q1, q2)?;
        let reward = proximity(tape, &tip, &[gx, gy], self.config.reward_sharpness)?;

        let [tx, ty, gx_host, gy_host] = common::host(tape, [tip[0], tip[1], gx, gy])?;
        let distance = ((tx - gx_host).powi(2) + (ty - gy_host).powi(2)).sqrt();
        let state = [q1, q2, q1_dot, q2_dot, gx, gy];
        self.state = state.to_vec();
        let obs = Self::observe(tape, state)?;
        Ok(Transition { obs, reward, done: false, info: BTreeMap::from([("distance", distance)]) })
    }

    fn render(&self, tape: &Tape, canvas: &mut Canvas) -> Result<()> {
        let [q1, q2, _, _, gx, gy] = common::state_array::<6>(self.name(), &self.state)?;
        let [q1, q2, gx, gy] = common::host(tape, [q1, q2, gx, gy])?;
        let (l1, l2) = (self.config.upper_length, self.config.lower_length);
        let elbow = (l1 * q1.cos(), l1 * q1.sin());
        let tip = (elbow.0 + l2 * (q1 + q2).cos(), elbow.1 + l2 * (q1 + q2).sin());

        canvas.clear(colors::BACKGROUND);
        canvas.circle((gx, gy), 0.05, colors::GOAL);
        canvas.polyline(&[(0.0, 0.0), elbow, tip], 0.05, colors::LINK);
        canvas.circle((0.0, 0.0), 0.04, colors::JOINT);
        canvas.circle(elbow, 0.03, colors::JOINT);
        Ok(())
    }
}
