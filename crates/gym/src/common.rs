//! Tape helpers shared by the environments.

use ml::{Tape, Tensor, Var};

use crate::{EnvName, GymError, Result, Snapshot};

/// Copies `state` into a fixed-size array, checking its length.
pub(crate) fn state_array<const N: usize>(env: EnvName, state: &[Var]) -> Result<[Var; N]> {
    if state.is_empty() {
        return Err(GymError::NotReset(env));
    }
    <[Var; N]>::try_from(state).map_err(|_| GymError::StateArity { env, expected: N, got: state.len() })
}

/// Checks a set_state argument, which unlike the stored state may not be empty.
pub(crate) fn incoming_state<const N: usize>(env: EnvName, state: &[Var]) -> Result<[Var; N]> {
    <[Var; N]>::try_from(state).map_err(|_| GymError::StateArity { env, expected: N, got: state.len() })
}

pub(crate) fn snapshot(tape: &Tape, state: &[Var]) -> Result<Snapshot> {
    let tensors = state.iter().map(|v| tape.value(*v).cloned()).collect::<ml::Result<Vec<_>>>()?;
    Ok(Snapshot::new(tensors))
}

/// Host values of `[1]`-shaped state entries.
pub(crate) fn host<const N: usize>(tape: &Tape, vars: [Var; N]) -> Result<[f32; N]> {
    let mut out = [0.0; N];
    for (o, v) in out.iter_mut().zip(vars) {
        *o = tape.item(v)?;
    }
    Ok(out)
}

pub(crate) fn scalar(tape: &mut Tape, value: f32) -> Var {
    tape.constant(Tensor::scalar(value))
}

/// Checks the action shape and clamps it to `[-1, 1]`.
pub(crate) fn clamped_action(tape: &mut Tape, env: EnvName, action: Var, dim: usize) -> Result<Var> {
    let shape = tape.shape(action)?;
    if shape != [dim] {
        return Err(GymError::ActionShape { env, expected: vec![dim], got: shape.to_vec() });
    }
    Ok(tape.clamp(action, -1.0, 1.0)?)
}

/// `x + dt * dx`.
pub(crate) fn integrate(tape: &mut Tape, x: Var, dx: Var, dt: f32) -> Result<Var> {
    let delta = tape.mul_scalar(dx, dt)?;
    Ok(tape.add(x, delta)?)
}

/// `exp(-k * ‖a - b‖²)` over paired coordinates.
pub(crate) fn proximity(tape: &mut Tape, a: &[Var], b: &[Var], k: f32) -> Result<Var> {
    let mut total = scalar(tape, 0.0);
    for (ai, bi) in a.iter().zip(b) {
        let d = tape.sub(*ai, *bi)?;
        let d2 = tape.square(d)?;
        total = tape.add(total, d2)?;
    }
    let scaled = tape.mul_scalar(total, -k)?;
    Ok(tape.exp(scaled)?)
}

pub(crate) fn uniform(rng: &mut fastrand::Rng, low: f32, high: f32) -> f32 {
    low + (high - low) * rng.f32()
}
