use std::collections::BTreeMap;
use std::f32::consts::PI;

use ml::{Tape, Var};
use render::{colors, Canvas, Viewport};

use crate::common::{self, clamped_action, integrate, scalar};
use crate::{Env, EnvName, Result, Snapshot, Transition};

/// Configuration for the cart-pole swing-up task.
#[derive(Clone, Debug)]
pub struct CartPoleConfig {
    /// Gravitational acceleration in m/s²
    pub gravity: f32,
    /// Cart mass in kg
    pub cart_mass: f32,
    /// Pole mass in kg
    pub pole_mass: f32,
    /// Half the pole length in meters
    pub pole_half_length: f32,
    /// Force applied for an action of magnitude 1
    pub force_magnitude: f32,
    /// Integration time step in seconds
    pub dt: f32,
    /// Cart positions are drawn from `[-init_position, init_position]`
    pub init_position: f32,
    /// Pole angles are drawn from `[-init_angle, init_angle]`; 0 is upright
    pub init_angle: f32,
    /// Both velocities are drawn from `[-init_velocity, init_velocity]`
    pub init_velocity: f32,
    /// Position threshold for failure detection (meters)
    pub position_limit: f32,
}

impl Default for CartPoleConfig {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            cart_mass: 1.0,
            pole_mass: 0.1,
            pole_half_length: 0.5,
            force_magnitude: 10.0,
            dt: 0.02,
            init_position: 1.0,
            init_angle: PI,
            init_velocity: 0.5,
            position_limit: 3.0,
        }
    }
}

/// A cart on a rail with a freely swinging pole. The agent pushes the cart
/// and is rewarded for keeping it near the centre with the pole upright.
///
/// State: `[x, ẋ, θ, θ̇]`. Observation: `[x, ẋ, cos θ, sin θ, θ̇]`.
pub struct CartPole {
    config: CartPoleConfig,
    rng: fastrand::Rng,
    state: Vec<Var>,
}

impl CartPole {
    #[must_use]
    pub fn new(config: CartPoleConfig, rng: fastrand::Rng) -> Self {
        Self { config, rng, state: Vec::new() }
    }

    fn observe(tape: &mut Tape, [x, x_dot, theta, theta_dot]: [Var; 4]) -> Result<Var> {
        let cos = tape.cos(theta)?;
        let sin = tape.sin(theta)?;
        Ok(tape.concat(&[x, x_dot, cos, sin, theta_dot])?)
    }
}

impl Env for CartPole {
    fn name(&self) -> EnvName {
        EnvName::CartPole
    }

    fn observation_shape(&self) -> Vec<usize> {
        vec![5]
    }

    fn action_shape(&self) -> Vec<usize> {
        vec![1]
    }

    fn viewport(&self) -> Viewport {
        Viewport::centered(self.config.position_limit, 1.5)
    }

    fn reset(&mut self, tape: &mut Tape) -> Result<Var> {
        let c = &self.config;
        let values = [
            common::uniform(&mut self.rng, -c.init_position, c.init_position),
            common::uniform(&mut self.rng, -c.init_velocity, c.init_velocity),
            common::uniform(&mut self.rng, -c.init_angle, c.init_angle),
            common::uniform(&mut self.rng, -c.init_velocity, c.init_velocity),
        ];
        let state = values.map(|v| scalar(tape, v));
        self.state = state.to_vec();
        Self::observe(tape, state)
    }

    fn get_state(&self, tape: &Tape) -> Result<Snapshot> {
        common::state_array::<4>(self.name(), &self.state)?;
        common::snapshot(tape, &self.state)
    }

    fn set_state(&mut self, tape: &mut Tape, state: &[Var]) -> Result<Var> {
        let state = common::incoming_state::<4>(self.name(), state)?;
        self.state = state.to_vec();
        Self::observe(tape, state)
    }

    fn step(&mut self, tape: &mut Tape, action: Var) -> Result<Transition> {
        let [x, x_dot, theta, theta_dot] = common::state_array::<4>(self.name(), &self.state)?;
        let c = &self.config;
        let total_mass = c.cart_mass + c.pole_mass;
        let pole_moment = c.pole_mass * c.pole_half_length;

        let a = clamped_action(tape, EnvName::CartPole, action, 1)?;
        let force = tape.mul_scalar(a, c.force_magnitude)?;
        let sin = tape.sin(theta)?;
        let cos = tape.cos(theta)?;

        // temp = (F + m l θ̇² sin θ) / M
        let spin = tape.square(theta_dot)?;
        let spin = tape.mul(spin, sin)?;
        let spin = tape.mul_scalar(spin, pole_moment)?;
        let temp = tape.add(force, spin)?;
        let temp = tape.mul_scalar(temp, 1.0 / total_mass)?;

        // θ̈ = (g sin θ - cos θ temp) / (l (4/3 - m cos² θ / M))
        let g_sin = tape.mul_scalar(sin, c.gravity)?;
        let cos_temp = tape.mul(cos, temp)?;
        let num = tape.sub(g_sin, cos_temp)?;
        let cos2 = tape.square(cos)?;
        let den = tape.mul_scalar(cos2, -pole_moment / total_mass)?;
        let den = tape.add_scalar(den, c.pole_half_length * 4.0 / 3.0)?;
        let theta_acc = tape.div(num, den)?;

        // ẍ = temp - m l θ̈ cos θ / M
        let recoil = tape.mul(theta_acc, cos)?;
        let recoil = tape.mul_scalar(recoil, -pole_moment / total_mass)?;
        let x_acc = tape.add(temp, recoil)?;

        let x = integrate(tape, x, x_dot, c.dt)?;
        let x_dot = integrate(tape, x_dot, x_acc, c.dt)?;
        let theta = integrate(tape, theta, theta_dot, c.dt)?;
        let theta_dot = integrate(tape, theta_dot, theta_acc, c.dt)?;

        // exp(-x²) · (1 + cos θ) / 2
        let x2 = tape.square(x)?;
        let neg_x2 = tape.neg(x2)?;
        let centred = tape.exp(neg_x2)?;
        let cos_new = tape.cos(theta)?;
        let upright = tape.add_scalar(cos_new, 1.0)?;
        let upright = tape.mul_scalar(upright, 0.5)?;
        let reward = tape.mul(centred, upright)?;

        let [x_host, theta_host] = common::host(tape, [x, theta])?;
        let state = [x, x_dot, theta, theta_dot];
        self.state = state.to_vec();
        let obs = Self::observe(tape, state)?;
        Ok(Transition {
            obs,
            reward,
            done: x_host.abs() > self.config.position_limit,
            info: BTreeMap::from([("x", x_host), ("theta", theta_host)]),
        })
    }

    fn render(&self, tape: &Tape, canvas: &mut Canvas) -> Result<()> {
        let [x, _, theta, _] = common::state_array::<4>(self.name(), &self.state)?;
        let [x, theta] = common::host(tape, [x, theta])?;
        let length = 2.0 * self.config.pole_half_length;
        let limit = self.config.position_limit;

        canvas.clear(colors::BACKGROUND);
        canvas.line((-limit, -0.125), (limit, -0.125), 0.02, colors::GROUND);
        canvas.rect((x - 0.25, -0.125), (x + 0.25, 0.125), colors::BODY);
        let tip = (x + length * theta.sin(), length * theta.cos());
        canvas.line((x, 0.0), tip, 0.06, colors::LINK);
        canvas.circle((x, 0.0), 0.04, colors::JOINT);
        Ok(())
    }
}
